//! Parser-specific types for BDPM file processing.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading and parsing BDPM files.
#[derive(Error, Debug)]
pub enum BdpmError {
    /// I/O error reading a BDPM file.
    #[error("IO error reading BDPM file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid integer in a numeric column.
    #[error("Invalid integer value: {value}")]
    InvalidInteger {
        /// The invalid value that was encountered.
        value: String,
    },

    /// Unknown code in a coded column.
    #[error("Invalid {field} code: {value}")]
    InvalidCode {
        /// The column holding the code.
        field: &'static str,
        /// The invalid value.
        value: String,
    },

    /// A line with fewer columns than the schema requires.
    #[error("Expected at least {expected} columns, found {found}")]
    ColumnCount {
        /// Minimum column count.
        expected: usize,
        /// Found column count.
        found: usize,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Directory not found.
    #[error("Directory not found: {path}")]
    DirectoryNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Required file missing from a source directory.
    #[error("Required BDPM file not found: {file_type} in {directory}")]
    RequiredFileMissing {
        /// The files that were missing.
        file_type: String,
        /// The directory that was searched.
        directory: String,
    },

    /// Parsing was aborted because a sibling parser failed.
    #[error("Parsing of {file} cancelled")]
    Cancelled {
        /// The file whose parse was abandoned.
        file: SourceFile,
    },

    /// Generic parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BdpmError {
    /// Returns true if the error only invalidates the current line.
    ///
    /// Line errors are skipped and counted by the parser; any other error
    /// aborts the whole file.
    pub fn is_line_error(&self) -> bool {
        match self {
            Self::InvalidInteger { .. } | Self::InvalidCode { .. } | Self::ColumnCount { .. } => {
                true
            }
            Self::Csv(e) => matches!(e.kind(), csv::ErrorKind::Utf8 { .. }),
            _ => false,
        }
    }
}

/// Result type for BDPM operations.
pub type BdpmResult<T> = Result<T, BdpmError>;

/// The five files of a BDPM distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize)]
pub enum SourceFile {
    /// `CIS_bdpm.txt`, one row per medication.
    Medications,
    /// `CIS_CIP_bdpm.txt`, one row per presentation.
    Presentations,
    /// `CIS_COMPO_bdpm.txt`, one row per composition line.
    Compositions,
    /// `CIS_GENER_bdpm.txt`, one row per generic group member.
    Generics,
    /// `CIS_CPD_bdpm.txt`, one row per prescription condition.
    Conditions,
}

impl SourceFile {
    /// All five files, in canonical order.
    pub const ALL: [SourceFile; 5] = [
        Self::Medications,
        Self::Presentations,
        Self::Compositions,
        Self::Generics,
        Self::Conditions,
    ];

    /// Canonical file name as published.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Medications => "CIS_bdpm.txt",
            Self::Presentations => "CIS_CIP_bdpm.txt",
            Self::Compositions => "CIS_COMPO_bdpm.txt",
            Self::Generics => "CIS_GENER_bdpm.txt",
            Self::Conditions => "CIS_CPD_bdpm.txt",
        }
    }

    /// Finds the file whose canonical name matches, ignoring ASCII case.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.file_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Local paths of the five BDPM files for one update cycle.
#[derive(Debug, Clone, Default)]
pub struct SourceFiles {
    /// Path to `CIS_bdpm.txt`.
    pub medications: Option<PathBuf>,
    /// Path to `CIS_CIP_bdpm.txt`.
    pub presentations: Option<PathBuf>,
    /// Path to `CIS_COMPO_bdpm.txt`.
    pub compositions: Option<PathBuf>,
    /// Path to `CIS_GENER_bdpm.txt`.
    pub generics: Option<PathBuf>,
    /// Path to `CIS_CPD_bdpm.txt`.
    pub conditions: Option<PathBuf>,
    /// Set when every file is known to be UTF-8 without a BOM, as the
    /// fetcher stages them. The loader then streams each file instead of
    /// reading it whole to detect its encoding.
    pub staged_utf8: bool,
}

impl SourceFiles {
    /// Creates a new empty SourceFiles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file set with every file under `dir` at its canonical name.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let mut files = Self::new();
        for file in SourceFile::ALL {
            files.set(file, dir.join(file.file_name()));
        }
        files
    }

    /// Returns the path registered for a file.
    pub fn get(&self, file: SourceFile) -> Option<&Path> {
        match file {
            SourceFile::Medications => self.medications.as_deref(),
            SourceFile::Presentations => self.presentations.as_deref(),
            SourceFile::Compositions => self.compositions.as_deref(),
            SourceFile::Generics => self.generics.as_deref(),
            SourceFile::Conditions => self.conditions.as_deref(),
        }
    }

    /// Registers the path of a file.
    pub fn set(&mut self, file: SourceFile, path: PathBuf) {
        let slot = match file {
            SourceFile::Medications => &mut self.medications,
            SourceFile::Presentations => &mut self.presentations,
            SourceFile::Compositions => &mut self.compositions,
            SourceFile::Generics => &mut self.generics,
            SourceFile::Conditions => &mut self.conditions,
        };
        *slot = Some(path);
    }

    /// Returns true if all five files are present.
    pub fn is_complete(&self) -> bool {
        self.missing_files().is_empty()
    }

    /// Returns the files that have no path yet.
    pub fn missing_files(&self) -> Vec<SourceFile> {
        SourceFile::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }
}

/// Statistics from parsing one BDPM file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct ParseStats {
    /// Non-empty lines read from the file.
    pub total_lines: usize,
    /// Records successfully parsed.
    pub parsed_records: usize,
    /// Malformed lines skipped.
    pub skipped_lines: usize,
    /// Time taken to parse in milliseconds.
    pub parse_time_ms: u64,
}

impl ParseStats {
    /// Returns the percentage of lines that were skipped.
    pub fn skip_rate(&self) -> f64 {
        if self.total_lines == 0 {
            0.0
        } else {
            (self.skipped_lines as f64 / self.total_lines as f64) * 100.0
        }
    }
}

/// Records parsed from one file, with their statistics.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    /// Valid records in source order.
    pub records: Vec<T>,
    /// Parse statistics.
    pub stats: ParseStats,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            stats: ParseStats::default(),
        }
    }
}
