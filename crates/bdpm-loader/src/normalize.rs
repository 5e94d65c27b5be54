//! Search key normalization.
//!
//! Search keys are computed once per snapshot, at assembly time. Queries are
//! normalized with the same function so that matching is a plain substring
//! test.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalizes text for search.
///
/// Lower-cases, strips accents, expands the `œ`/`æ` ligatures and collapses
/// runs of whitespace into a single space with no leading or trailing space.
/// The function is deterministic and idempotent.
///
/// # Examples
///
/// ```
/// use bdpm_loader::normalize;
///
/// assert_eq!(normalize("  PARACÉTAMOL   500 mg "), "paracetamol 500 mg");
/// ```
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    // Lower-case after decomposition: compatibility forms can expand to
    // upper-case letters.
    for c in input.nfkd().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match c {
            'œ' => out.push_str("oe"),
            'æ' => out.push_str("ae"),
            _ => out.push(c),
        }
    }

    out
}
