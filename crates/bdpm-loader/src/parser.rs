//! Generic BDPM file parser.
//!
//! Provides a streaming parser for the tab-separated BDPM files. The files
//! have no header row and no quoting: a `"` is ordinary text.

use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::types::{BdpmError, BdpmResult, ParseStats, Parsed, SourceFile};

/// Size of the read buffer. Must exceed the longest line of any file.
pub const READ_BUFFER_CAPACITY: usize = 1 << 20;

/// How many lines are parsed between two checks of the cancellation flag.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Trait for types that can be parsed from one BDPM line.
///
/// Implement this trait for each file schema.
pub trait BdpmRecord: Sized {
    /// The file this record type is read from.
    const SOURCE: SourceFile;

    /// Minimum number of columns of a well-formed line.
    const MIN_COLUMNS: usize;

    /// Parse a record from a CSV StringRecord.
    ///
    /// The column count has already been checked against `MIN_COLUMNS`.
    fn from_record(record: &StringRecord) -> BdpmResult<Self>;
}

/// A streaming parser for BDPM files.
///
/// Reads record-by-record; use [`parse_all`](Self::parse_all) to collect
/// valid records while skipping and counting malformed lines.
pub struct BdpmParser<R: Read, T: BdpmRecord> {
    reader: Reader<R>,
    lines_read: usize,
    _marker: PhantomData<T>,
}

impl<T: BdpmRecord> BdpmParser<File, T> {
    /// Creates a new parser from a file path.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> BdpmResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BdpmError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read, T: BdpmRecord> BdpmParser<R, T> {
    /// Creates a new parser from a reader of UTF-8 text.
    pub fn from_reader(reader: R) -> Self {
        let csv_reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::None)
            .buffer_capacity(READ_BUFFER_CAPACITY)
            .from_reader(reader);

        Self {
            reader: csv_reader,
            lines_read: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of non-empty lines read so far.
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Parses all lines into a Vec, skipping malformed ones.
    pub fn parse_all(self) -> BdpmResult<Parsed<T>> {
        self.parse_all_with_cancel(&AtomicBool::new(false))
    }

    /// Parses all lines, aborting with [`BdpmError::Cancelled`] once `cancel` is raised.
    ///
    /// Malformed lines are counted in [`ParseStats::skipped_lines`] and never
    /// fail the file. Any other error is returned immediately.
    pub fn parse_all_with_cancel(mut self, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
        let start = Instant::now();
        let mut records = Vec::new();
        let mut skipped = 0;
        let mut seen = 0usize;

        while let Some(result) = self.next() {
            seen += 1;
            if seen % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(BdpmError::Cancelled { file: T::SOURCE });
            }

            match result {
                Ok(record) => records.push(record),
                Err(e) if e.is_line_error() => {
                    skipped += 1;
                    tracing::debug!(file = %T::SOURCE, line = self.lines_read, error = %e, "skipping malformed line");
                }
                Err(e) => return Err(e),
            }
        }

        let stats = ParseStats {
            total_lines: self.lines_read,
            parsed_records: records.len(),
            skipped_lines: skipped,
            parse_time_ms: start.elapsed().as_millis() as u64,
        };

        Ok(Parsed { records, stats })
    }
}

impl<R: Read, T: BdpmRecord> Iterator for BdpmParser<R, T> {
    type Item = BdpmResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    // Skip empty records
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    self.lines_read += 1;

                    if record.len() < T::MIN_COLUMNS {
                        return Some(Err(BdpmError::ColumnCount {
                            expected: T::MIN_COLUMNS,
                            found: record.len(),
                        }));
                    }

                    return Some(T::from_record(&record));
                }
                Ok(false) => return None, // End of file
                Err(e) => {
                    self.lines_read += 1;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Helper functions for parsing BDPM field values.
pub mod parse {
    use csv::StringRecord;

    use super::{BdpmError, BdpmResult};

    /// Returns a trimmed field, or "" when the column is absent.
    pub fn text(record: &StringRecord, index: usize) -> &str {
        record.get(index).map(str::trim).unwrap_or("")
    }

    /// Returns a trimmed field as an owned String.
    pub fn owned(record: &StringRecord, index: usize) -> String {
        text(record, index).to_string()
    }

    /// Parses a base-10 integer value.
    ///
    /// Only ASCII digits are accepted: no sign, no grouping, no whitespace
    /// inside the number.
    pub fn integer<T: std::str::FromStr>(value: &str) -> BdpmResult<T> {
        let value = value.trim();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BdpmError::InvalidInteger {
                value: value.to_string(),
            });
        }
        value.parse::<T>().map_err(|_| BdpmError::InvalidInteger {
            value: value.to_string(),
        })
    }

    /// Parses a key column: a base-10 integer greater than zero.
    pub fn positive<T>(value: &str) -> BdpmResult<T>
    where
        T: std::str::FromStr + Default + PartialEq,
    {
        let parsed: T = integer(value)?;
        if parsed == T::default() {
            return Err(BdpmError::InvalidInteger {
                value: value.trim().to_string(),
            });
        }
        Ok(parsed)
    }

    /// Parses a `oui`/`non` flag. Anything but `oui` is false.
    pub fn flag(value: &str) -> bool {
        value.trim().eq_ignore_ascii_case("oui")
    }

    /// Splits a `;`-separated list, dropping empty items.
    pub fn list(value: &str) -> Vec<String> {
        value
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parses a price in French notation ("1,16", "1 234,56", "1,234,56").
    ///
    /// The last comma is the decimal separator; earlier commas, dots and
    /// spaces are grouping. Returns `None` for empty or unparseable values.
    pub fn price(value: &str) -> Option<f64> {
        let compact: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '€')
            .collect();
        if compact.is_empty() {
            return None;
        }

        let normalized = match compact.rfind(',') {
            Some(pos) => {
                let (int_part, frac_part) = compact.split_at(pos);
                let int_part: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
                format!("{}.{}", int_part, &frac_part[1..])
            }
            None => compact,
        };

        normalized.parse::<f64>().ok().filter(|p| p.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        key: u32,
        value: String,
    }

    impl BdpmRecord for Pair {
        const SOURCE: SourceFile = SourceFile::Conditions;
        const MIN_COLUMNS: usize = 2;

        fn from_record(record: &StringRecord) -> BdpmResult<Self> {
            Ok(Pair {
                key: parse::integer(parse::text(record, 0))?,
                value: parse::owned(record, 1),
            })
        }
    }

    fn parse_str(input: &str) -> Parsed<Pair> {
        BdpmParser::<_, Pair>::from_reader(input.as_bytes())
            .parse_all()
            .unwrap()
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse::integer::<u32>("60234100").unwrap(), 60234100);
        assert_eq!(parse::integer::<u32>(" 42 ").unwrap(), 42);
        assert!(parse::integer::<u32>("").is_err());
        assert!(parse::integer::<u32>("-1").is_err());
        assert!(parse::integer::<u32>("+1").is_err());
        assert!(parse::integer::<u32>("12a").is_err());
        assert!(parse::integer::<u8>("300").is_err());
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse::positive::<u32>("60234100").unwrap(), 60234100);
        assert_eq!(parse::positive::<u64>("3400934998331").unwrap(), 3400934998331);
        assert!(parse::positive::<u32>("0").is_err());
        assert!(parse::positive::<u32>("000").is_err());
        assert!(parse::positive::<u32>("").is_err());
        assert_eq!(parse::integer::<u32>("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse::flag("oui"));
        assert!(parse::flag("Oui "));
        assert!(!parse::flag("non"));
        assert!(!parse::flag("Non"));
        assert!(!parse::flag(""));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse::list("orale"), vec!["orale"]);
        assert_eq!(
            parse::list("cutanée; orale;;sublinguale"),
            vec!["cutanée", "orale", "sublinguale"]
        );
        assert!(parse::list("").is_empty());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse::price("1,16"), Some(1.16));
        assert_eq!(parse::price("24,34"), Some(24.34));
        assert_eq!(parse::price("1 234,56"), Some(1234.56));
        assert_eq!(parse::price("1,234,56"), Some(1234.56));
        assert_eq!(parse::price("12.5"), Some(12.5));
        assert_eq!(parse::price(""), None);
        assert_eq!(parse::price("n/a"), None);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let parsed = parse_str("1\tone\nx\tbad key\n2\ttwo\nonly-one-column\n3\tthree\n");
        let keys: Vec<u32> = parsed.records.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(parsed.stats.parsed_records, 3);
        assert_eq!(parsed.stats.skipped_lines, 2);
        assert_eq!(parsed.stats.total_lines, 5);
    }

    #[test]
    fn test_quotes_are_text() {
        let parsed = parse_str("1\tsolution \"buvable\" en flacon\n");
        assert_eq!(parsed.records[0].value, "solution \"buvable\" en flacon");
    }

    #[test]
    fn test_empty_lines_ignored() {
        let parsed = parse_str("1\tone\n\n   \n2\ttwo\r\n");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.stats.skipped_lines, 0);
        assert_eq!(parsed.records[1].value, "two");
    }

    #[test]
    fn test_long_line_not_truncated() {
        let long = "é".repeat(300_000);
        let input = format!("1\t{}\n2\tshort\n", long);
        let parsed = parse_str(&input);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].value.chars().count(), 300_000);
    }

    #[test]
    fn test_cancelled() {
        let input: String = (0..10_000).map(|i| format!("{}\tv\n", i)).collect();
        let cancel = AtomicBool::new(true);
        let result = BdpmParser::<_, Pair>::from_reader(input.as_bytes()).parse_all_with_cancel(&cancel);
        assert!(matches!(
            result,
            Err(BdpmError::Cancelled {
                file: SourceFile::Conditions
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = BdpmParser::<_, Pair>::from_path("/nonexistent/CIS_CPD_bdpm.txt");
        assert!(matches!(result, Err(BdpmError::FileNotFound { .. })));
    }
}
