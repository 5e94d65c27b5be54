//! Data quality auditing.
//!
//! The audit never rejects a snapshot. It records what is missing so the
//! findings can be inspected alongside the data they describe.

use std::collections::HashSet;

use bdpm_types::Cis;

use crate::snapshot::{PresentationCollision, Snapshot};
use crate::types::{ParseStats, SourceFile};

/// Maximum number of keys kept as a sample for each finding.
pub const SAMPLE_SIZE: usize = 10;

/// A count of affected keys with a bounded sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct KeySample {
    /// Number of affected keys.
    pub count: usize,
    /// First affected keys, at most [`SAMPLE_SIZE`].
    pub sample: Vec<Cis>,
}

impl KeySample {
    fn record(&mut self, cis: Cis) {
        self.count += 1;
        if self.sample.len() < SAMPLE_SIZE {
            self.sample.push(cis);
        }
    }

    /// Returns true if no key is affected.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Packaging code collisions with a bounded sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CollisionSample {
    /// Number of collisions.
    pub count: usize,
    /// First collisions, at most [`SAMPLE_SIZE`].
    pub sample: Vec<PresentationCollision>,
}

/// Parse statistics of one source file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceStats {
    /// The source file.
    pub file: SourceFile,
    /// Its parse statistics.
    pub stats: ParseStats,
}

/// Findings of the data quality audit for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DataQualityReport {
    /// Medications with no prescription condition.
    pub without_conditions: KeySample,
    /// Medications that belong to no generic group.
    pub without_generics: KeySample,
    /// Medications with no presentation.
    pub without_presentations: KeySample,
    /// Medications with no composition line.
    pub without_compositions: KeySample,
    /// Distinct CIS codes referenced by generic groups with no medication.
    pub orphan_generic_cis: KeySample,
    /// Number of groups holding at least one orphan reference.
    pub groups_with_orphans: usize,
    /// Packaging codes claimed by two different medications.
    pub presentation_collisions: CollisionSample,
    /// Parse statistics of the five source files.
    pub source_stats: Vec<SourceStats>,
}

impl DataQualityReport {
    /// Total malformed lines skipped across all source files.
    pub fn skipped_lines(&self) -> usize {
        self.source_stats.iter().map(|s| s.stats.skipped_lines).sum()
    }

    /// Returns true if the audit found referential problems.
    ///
    /// Missing conditions and missing generic memberships are normal for a
    /// large share of medications and are not counted here.
    pub fn has_integrity_findings(&self) -> bool {
        !self.orphan_generic_cis.is_empty() || self.presentation_collisions.count > 0
    }
}

/// Audits a completed snapshot.
pub fn audit(snapshot: &Snapshot, source_stats: Vec<SourceStats>) -> DataQualityReport {
    let mut report = DataQualityReport {
        source_stats,
        ..Default::default()
    };

    for medication in snapshot.medications() {
        if medication.conditions.is_empty() {
            report.without_conditions.record(medication.cis);
        }
        if medication.generics.is_empty() {
            report.without_generics.record(medication.cis);
        }
        if medication.presentations.is_empty() {
            report.without_presentations.record(medication.cis);
        }
        if medication.compositions.is_empty() {
            report.without_compositions.record(medication.cis);
        }
    }

    let mut seen_orphans = HashSet::new();
    for group in snapshot.groups() {
        if group.has_orphans() {
            report.groups_with_orphans += 1;
        }
        for &cis in &group.orphan_cis {
            if seen_orphans.insert(cis) {
                report.orphan_generic_cis.record(cis);
            }
        }
    }

    let collisions = snapshot.collisions();
    report.presentation_collisions = CollisionSample {
        count: collisions.len(),
        sample: collisions.iter().take(SAMPLE_SIZE).cloned().collect(),
    };

    report
}
