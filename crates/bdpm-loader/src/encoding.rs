//! Source encoding detection.
//!
//! The agency has published the same files as UTF-8 and as Windows-1252
//! over time. Everything downstream of this module assumes UTF-8.

use std::fmt;

use encoding_rs::WINDOWS_1252;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding detected for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Valid UTF-8, with or without BOM.
    Utf8,
    /// Legacy Western-European single-byte encoding (superset of ISO-8859-1).
    Windows1252,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Windows1252 => f.write_str("windows-1252"),
        }
    }
}

/// Detects the encoding of raw file content.
///
/// Any byte sequence that is valid UTF-8 is treated as UTF-8. Accented
/// Windows-1252 text is practically never valid UTF-8, so no further
/// heuristics are needed.
pub fn detect_encoding(bytes: &[u8]) -> SourceEncoding {
    if std::str::from_utf8(bytes).is_ok() {
        SourceEncoding::Utf8
    } else {
        SourceEncoding::Windows1252
    }
}

/// Transcodes raw file content to UTF-8.
///
/// A leading UTF-8 BOM is removed.
pub fn decode_to_utf8(bytes: Vec<u8>) -> (String, SourceEncoding) {
    match String::from_utf8(bytes) {
        Ok(mut text) => {
            if text.as_bytes().starts_with(UTF8_BOM) {
                text.replace_range(..UTF8_BOM.len(), "");
            }
            (text, SourceEncoding::Utf8)
        }
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
            (decoded.into_owned(), SourceEncoding::Windows1252)
        }
    }
}
