//! BDPM file discovery and loading utilities.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use bdpm_types::{Composition, Condition, GenericRecord, MedicationRecord, Presentation};

use crate::assembler::ParsedFiles;
use crate::encoding::{decode_to_utf8, SourceEncoding};
use crate::parser::{BdpmParser, BdpmRecord};
use crate::types::{BdpmError, BdpmResult, Parsed, SourceFile, SourceFiles};

/// Discovers the five BDPM files in a directory.
///
/// File names are matched case-insensitively against the canonical names
/// (`CIS_bdpm.txt`, `CIS_CIP_bdpm.txt`, ...). Other files are ignored.
pub fn discover_source_files<P: AsRef<Path>>(path: P) -> BdpmResult<SourceFiles> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Err(BdpmError::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }

    let mut files = SourceFiles::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let filename = entry.file_name();
        if let Some(file) = SourceFile::from_file_name(&filename.to_string_lossy()) {
            files.set(file, entry.path());
        }
    }

    if !files.is_complete() {
        return Err(missing_error(&files, path));
    }

    Ok(files)
}

fn missing_error(files: &SourceFiles, directory: &Path) -> BdpmError {
    let missing: Vec<&str> = files
        .missing_files()
        .into_iter()
        .map(SourceFile::file_name)
        .collect();
    BdpmError::RequiredFileMissing {
        file_type: missing.join(", "),
        directory: directory.display().to_string(),
    }
}

/// Reads, transcodes and parses one file.
///
/// Raises `cancel` when the file fails for a reason other than cancellation,
/// so that sibling parsers stop early.
pub fn load_file<T: BdpmRecord>(path: &Path, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    raise_on_failure::<T>(read_and_parse::<T>(path, cancel), cancel)
}

/// Parses one file already known to be UTF-8 without a BOM, streaming it
/// through the parser instead of reading it whole.
///
/// Raises `cancel` on failure like [`load_file`].
pub fn stream_file<T: BdpmRecord>(path: &Path, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    raise_on_failure::<T>(stream_and_parse::<T>(path, cancel), cancel)
}

fn load_source<T: BdpmRecord>(path: &Path, staged_utf8: bool, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    if staged_utf8 {
        stream_file(path, cancel)
    } else {
        load_file(path, cancel)
    }
}

fn raise_on_failure<T: BdpmRecord>(result: BdpmResult<Parsed<T>>, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    if let Err(e) = &result {
        if !matches!(e, BdpmError::Cancelled { .. }) {
            cancel.store(true, Ordering::Release);
            tracing::error!(file = %T::SOURCE, error = %e, "failed to parse source file");
        }
    }
    result
}

fn read_and_parse<T: BdpmRecord>(path: &Path, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    if !path.exists() {
        return Err(BdpmError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    if cancel.load(Ordering::Acquire) {
        return Err(BdpmError::Cancelled { file: T::SOURCE });
    }

    let bytes = fs::read(path)?;
    let size = bytes.len();
    let (text, encoding) = decode_to_utf8(bytes);
    if encoding == SourceEncoding::Windows1252 {
        tracing::warn!(file = %T::SOURCE, "source file is not UTF-8, transcoded from {}", encoding);
    }

    let parsed = BdpmParser::<_, T>::from_reader(text.as_bytes()).parse_all_with_cancel(cancel)?;
    log_parsed(&parsed, size);
    Ok(parsed)
}

fn stream_and_parse<T: BdpmRecord>(path: &Path, cancel: &AtomicBool) -> BdpmResult<Parsed<T>> {
    let parser = BdpmParser::<_, T>::from_path(path)?;
    if cancel.load(Ordering::Acquire) {
        return Err(BdpmError::Cancelled { file: T::SOURCE });
    }

    let size = fs::metadata(path)?.len() as usize;
    let parsed = parser.parse_all_with_cancel(cancel)?;
    log_parsed(&parsed, size);
    Ok(parsed)
}

fn log_parsed<T: BdpmRecord>(parsed: &Parsed<T>, size: usize) {
    tracing::info!(
        file = %T::SOURCE,
        size = %format_bytes(size),
        records = parsed.stats.parsed_records,
        skipped = parsed.stats.skipped_lines,
        elapsed_ms = parsed.stats.parse_time_ms,
        "parsed source file"
    );
    if parsed.stats.skipped_lines > 0 {
        tracing::warn!(
            file = %T::SOURCE,
            skipped = parsed.stats.skipped_lines,
            "malformed lines skipped"
        );
    }
}

struct RequiredPaths<'a> {
    medications: &'a Path,
    presentations: &'a Path,
    compositions: &'a Path,
    generics: &'a Path,
    conditions: &'a Path,
    staged_utf8: bool,
}

fn required_paths(files: &SourceFiles) -> BdpmResult<RequiredPaths<'_>> {
    match (
        files.medications.as_deref(),
        files.presentations.as_deref(),
        files.compositions.as_deref(),
        files.generics.as_deref(),
        files.conditions.as_deref(),
    ) {
        (Some(medications), Some(presentations), Some(compositions), Some(generics), Some(conditions)) => {
            Ok(RequiredPaths {
                medications,
                presentations,
                compositions,
                generics,
                conditions,
                staged_utf8: files.staged_utf8,
            })
        }
        _ => Err(missing_error(files, Path::new("<configured sources>"))),
    }
}

/// Parses the five files on the rayon pool.
///
/// The first fatal error raises a shared flag that makes the other parsers
/// abandon their work. That error is returned rather than the
/// [`BdpmError::Cancelled`] errors it caused.
#[cfg(feature = "parallel")]
pub fn parse_all_parallel(files: &SourceFiles) -> BdpmResult<ParsedFiles> {
    let paths = required_paths(files)?;
    let cancel = AtomicBool::new(false);

    let ((medications, presentations), (compositions, (generics, conditions))) = rayon::join(
        || {
            rayon::join(
                || load_source::<MedicationRecord>(paths.medications, paths.staged_utf8, &cancel),
                || load_source::<Presentation>(paths.presentations, paths.staged_utf8, &cancel),
            )
        },
        || {
            rayon::join(
                || load_source::<Composition>(paths.compositions, paths.staged_utf8, &cancel),
                || {
                    rayon::join(
                        || load_source::<GenericRecord>(paths.generics, paths.staged_utf8, &cancel),
                        || load_source::<Condition>(paths.conditions, paths.staged_utf8, &cancel),
                    )
                },
            )
        },
    );

    match (medications, presentations, compositions, generics, conditions) {
        (Ok(medications), Ok(presentations), Ok(compositions), Ok(generics), Ok(conditions)) => {
            Ok(ParsedFiles {
                medications,
                presentations,
                compositions,
                generics,
                conditions,
            })
        }
        (m, p, c, g, d) => Err(first_fatal([m.err(), p.err(), c.err(), g.err(), d.err()])),
    }
}

#[cfg(feature = "parallel")]
fn first_fatal(errors: [Option<BdpmError>; 5]) -> BdpmError {
    errors
        .into_iter()
        .flatten()
        .reduce(|kept, e| {
            let is_cancelled = |e: &BdpmError| matches!(e, BdpmError::Cancelled { .. });
            if is_cancelled(&kept) && !is_cancelled(&e) {
                e
            } else {
                kept
            }
        })
        .unwrap_or_else(|| BdpmError::Parse("parallel parse failed".to_string()))
}

/// Parses the five files one after another on the calling thread.
pub fn parse_all_sequential(files: &SourceFiles) -> BdpmResult<ParsedFiles> {
    let paths = required_paths(files)?;
    let cancel = AtomicBool::new(false);

    Ok(ParsedFiles {
        medications: load_source(paths.medications, paths.staged_utf8, &cancel)?,
        presentations: load_source(paths.presentations, paths.staged_utf8, &cancel)?,
        compositions: load_source(paths.compositions, paths.staged_utf8, &cancel)?,
        generics: load_source(paths.generics, paths.staged_utf8, &cancel)?,
        conditions: load_source(paths.conditions, paths.staged_utf8, &cancel)?,
    })
}

/// Parses the five files, in parallel when the `parallel` feature is enabled.
pub fn parse_all_files(files: &SourceFiles) -> BdpmResult<ParsedFiles> {
    #[cfg(feature = "parallel")]
    {
        parse_all_parallel(files)
    }
    #[cfg(not(feature = "parallel"))]
    {
        parse_all_sequential(files)
    }
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const MEDICATIONS: &str = "60234100\tDOLIPRANE 500 mg, comprimé\tcomprimé\torale\tAutorisation active\tProcédure nationale\tCommercialisée\t09/07/1986\t\t\tOPELLA HEALTHCARE FRANCE\tNon\n";
    const PRESENTATIONS: &str = "60234100\t3400935\tplaquette(s) PVC de 16 comprimé(s)\tPrésentation active\tDéclaration de commercialisation\t16/03/2011\t3400934998331\toui\t65%\t1,16\n";
    const COMPOSITIONS: &str = "60234100\tcomprimé\t2202\tPARACÉTAMOL\t500 mg\tun comprimé\tSA\n";
    const GENERICS: &str = "1\tPARACÉTAMOL 500 mg - DOLIPRANE 500 mg, comprimé\t60234100\t0\n";
    const CONDITIONS: &str = "60234100\tliste II\n";

    fn write_dataset(dir: &Path) {
        fs::write(dir.join("CIS_bdpm.txt"), MEDICATIONS).unwrap();
        fs::write(dir.join("CIS_CIP_bdpm.txt"), PRESENTATIONS).unwrap();
        fs::write(dir.join("CIS_COMPO_bdpm.txt"), COMPOSITIONS).unwrap();
        fs::write(dir.join("CIS_GENER_bdpm.txt"), GENERICS).unwrap();
        fs::write(dir.join("CIS_CPD_bdpm.txt"), CONDITIONS).unwrap();
    }

    #[test]
    fn test_discover_source_files() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert!(files.is_complete());
        assert_eq!(
            files.get(SourceFile::Generics),
            Some(dir.path().join("CIS_GENER_bdpm.txt").as_path())
        );
    }

    #[test]
    fn test_discover_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        fs::rename(
            dir.path().join("CIS_CPD_bdpm.txt"),
            dir.path().join("cis_cpd_BDPM.TXT"),
        )
        .unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        assert!(files.is_complete());
    }

    #[test]
    fn test_discover_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        fs::remove_file(dir.path().join("CIS_COMPO_bdpm.txt")).unwrap();

        match discover_source_files(dir.path()) {
            Err(BdpmError::RequiredFileMissing { file_type, .. }) => {
                assert_eq!(file_type, "CIS_COMPO_bdpm.txt");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_discover_missing_directory() {
        let result = discover_source_files("/nonexistent/bdpm");
        assert!(matches!(result, Err(BdpmError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_parse_all_files() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let files = discover_source_files(dir.path()).unwrap();

        let parsed = parse_all_files(&files).unwrap();
        assert_eq!(parsed.medications.records.len(), 1);
        assert_eq!(parsed.presentations.records.len(), 1);
        assert_eq!(parsed.compositions.records.len(), 1);
        assert_eq!(parsed.generics.records.len(), 1);
        assert_eq!(parsed.conditions.records.len(), 1);
        assert_eq!(parsed.presentations.records[0].price, Some(1.16));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let files = discover_source_files(dir.path()).unwrap();

        let a = parse_all_sequential(&files).unwrap();
        let b = parse_all_files(&files).unwrap();
        assert_eq!(a.medications.records, b.medications.records);
        assert_eq!(a.generics.records, b.generics.records);
    }

    #[test]
    fn test_staged_files_stream_to_same_records() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let mut files = discover_source_files(dir.path()).unwrap();

        let loaded = parse_all_sequential(&files).unwrap();
        files.staged_utf8 = true;
        let streamed = parse_all_files(&files).unwrap();
        let streamed_sequential = parse_all_sequential(&files).unwrap();

        assert_eq!(loaded.medications.records, streamed.medications.records);
        assert_eq!(loaded.presentations.records, streamed.presentations.records);
        assert_eq!(loaded.compositions.records, streamed.compositions.records);
        assert_eq!(loaded.generics.records, streamed.generics.records);
        assert_eq!(loaded.conditions.records, streamed.conditions.records);
        assert_eq!(streamed.medications.records, streamed_sequential.medications.records);
        assert_eq!(streamed.medications.records[0].name, "DOLIPRANE 500 mg, comprimé");
    }

    #[test]
    fn test_stream_file_errors() {
        let cancel = AtomicBool::new(false);
        let result = stream_file::<Condition>(Path::new("/nonexistent/CIS_CPD_bdpm.txt"), &cancel);
        assert!(matches!(result, Err(BdpmError::FileNotFound { .. })));
        assert!(cancel.load(Ordering::Acquire));

        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let result = stream_file::<Condition>(&dir.path().join("CIS_CPD_bdpm.txt"), &cancel);
        assert!(matches!(result, Err(BdpmError::Cancelled { .. })));
    }

    #[test]
    fn test_windows_1252_file_is_transcoded() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(MEDICATIONS);
        fs::write(dir.path().join("CIS_bdpm.txt"), encoded.as_ref()).unwrap();

        let files = discover_source_files(dir.path()).unwrap();
        let parsed = parse_all_files(&files).unwrap();
        assert_eq!(parsed.medications.records[0].name, "DOLIPRANE 500 mg, comprimé");
        assert_eq!(parsed.medications.records[0].marketing_status, "Commercialisée");
    }

    #[test]
    fn test_fatal_error_wins_over_cancellation() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let mut files = discover_source_files(dir.path()).unwrap();
        files.set(SourceFile::Conditions, PathBuf::from("/nonexistent/CIS_CPD_bdpm.txt"));

        let result = parse_all_files(&files);
        assert!(matches!(result, Err(BdpmError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_file_raises_cancel_flag() {
        let cancel = AtomicBool::new(false);
        let result = load_file::<Condition>(Path::new("/nonexistent/file.txt"), &cancel);
        assert!(result.is_err());
        assert!(cancel.load(Ordering::Acquire));
    }

    #[test]
    fn test_load_file_honours_raised_flag() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let cancel = AtomicBool::new(true);

        let result = load_file::<Condition>(&dir.path().join("CIS_CPD_bdpm.txt"), &cancel);
        assert!(matches!(
            result,
            Err(BdpmError::Cancelled {
                file: SourceFile::Conditions
            })
        ));
    }

    #[test]
    fn test_unset_path_is_reported() {
        let files = SourceFiles::new();
        assert!(matches!(
            parse_all_files(&files),
            Err(BdpmError::RequiredFileMissing { .. })
        ));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }
}
