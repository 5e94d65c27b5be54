//! # bdpm-loader
//!
//! Parser and snapshot builder for the French public medication database
//! (BDPM) distribution files.
//!
//! Loading happens in three stages:
//!
//! 1. [`parse_all_files`] reads the five tab-separated files, transcoding
//!    legacy Windows-1252 content to UTF-8 and skipping malformed lines.
//!    With the `parallel` feature (default), the files are parsed
//!    concurrently on the rayon pool.
//! 2. [`build_snapshot`] joins the rows on the CIS code into medications and
//!    generic groups, and indexes presentations by both packaging codes.
//! 3. The resulting [`Snapshot`] is immutable and can be shared across
//!    threads behind an `Arc`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bdpm_loader::{build_snapshot, discover_source_files, parse_all_files};
//!
//! let files = discover_source_files("/var/lib/bdpm")?;
//! let snapshot = build_snapshot(parse_all_files(&files)?);
//!
//! for medication in snapshot.search_medications("paracetamol", 10) {
//!     println!("{} {}", medication.cis, medication.name);
//! }
//! # Ok::<(), bdpm_loader::BdpmError>(())
//! ```

#![warn(missing_docs)]

pub mod assembler;
pub mod audit;
pub mod composition;
pub mod condition;
pub mod encoding;
pub mod generic;
pub mod loader;
pub mod medication;
pub mod normalize;
pub mod parser;
pub mod presentation;
pub mod snapshot;
pub mod types;

pub use assembler::{assemble, build_snapshot, ParsedFiles};
pub use audit::{audit, CollisionSample, DataQualityReport, KeySample, SourceStats};
pub use encoding::{decode_to_utf8, detect_encoding, SourceEncoding};
#[cfg(feature = "parallel")]
pub use loader::parse_all_parallel;
pub use loader::{
    discover_source_files, format_bytes, load_file, parse_all_files, parse_all_sequential, stream_file,
};
pub use normalize::normalize;
pub use parser::{BdpmParser, BdpmRecord};
pub use snapshot::{CipForm, PresentationCollision, Snapshot};
pub use types::{BdpmError, BdpmResult, ParseStats, Parsed, SourceFile, SourceFiles};

// Re-export bdpm-types for convenience
pub use bdpm_types;
