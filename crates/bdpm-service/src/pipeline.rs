//! One update cycle: fetch, parse, assemble, audit, publish.

use std::sync::Arc;
use std::time::Instant;

use bdpm_loader::{build_snapshot, parse_all_files, BdpmResult, DataQualityReport, Snapshot};
use serde::Serialize;

use crate::container::DataContainer;
use crate::error::UpdateError;
use crate::fetcher::SourceFetcher;

/// Counts describing a published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    /// Generation assigned at publish.
    pub generation: u64,
    /// Number of medications.
    pub medications: usize,
    /// Number of generic groups.
    pub groups: usize,
    /// Number of indexed presentations.
    pub presentations: usize,
    /// Malformed lines skipped across the five files.
    pub skipped_lines: usize,
    /// Wall time of the whole cycle.
    pub elapsed_ms: u64,
}

/// Result of a cycle that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A new snapshot was published.
    Published(CycleSummary),
    /// Another cycle held the container; nothing was done.
    AlreadyRunning,
}

/// Drives update cycles against a [`DataContainer`].
pub struct UpdatePipeline {
    container: Arc<DataContainer>,
    fetcher: Arc<dyn SourceFetcher>,
}

impl UpdatePipeline {
    /// Creates a pipeline publishing into `container`.
    pub fn new(container: Arc<DataContainer>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { container, fetcher }
    }

    /// The container this pipeline publishes into.
    pub fn container(&self) -> &Arc<DataContainer> {
        &self.container
    }

    /// Runs one update cycle.
    ///
    /// Returns [`CycleOutcome::AlreadyRunning`] without doing anything if
    /// another cycle holds the container. On error nothing is published and
    /// the previous snapshot stays live. The updating flag is cleared on
    /// every path, including panics in the parse task.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, UpdateError> {
        let Some(_guard) = self.container.try_begin_update() else {
            return Ok(CycleOutcome::AlreadyRunning);
        };

        let start = Instant::now();
        tracing::info!("update cycle started");

        let files = self.fetcher.fetch_all().await?;
        tracing::debug!("all source files staged, parsing");

        let snapshot = tokio::task::spawn_blocking(move || -> BdpmResult<Snapshot> {
            let parsed = parse_all_files(&files)?;
            Ok(build_snapshot(parsed))
        })
        .await??;

        log_findings(snapshot.report());

        let medications = snapshot.medication_count();
        let groups = snapshot.group_count();
        let presentations = snapshot.presentation_count();
        let skipped_lines = snapshot.report().skipped_lines();

        let generation = self.container.publish(snapshot);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            generation,
            medications,
            groups,
            presentations,
            skipped_lines,
            elapsed_ms,
            "snapshot published"
        );

        Ok(CycleOutcome::Published(CycleSummary {
            generation,
            medications,
            groups,
            presentations,
            skipped_lines,
            elapsed_ms,
        }))
    }
}

fn log_findings(report: &DataQualityReport) {
    if report.orphan_generic_cis.count > 0 {
        tracing::warn!(
            count = report.orphan_generic_cis.count,
            groups = report.groups_with_orphans,
            sample = ?report.orphan_generic_cis.sample,
            "generic groups reference unknown CIS codes"
        );
    }
    if report.presentation_collisions.count > 0 {
        tracing::warn!(
            count = report.presentation_collisions.count,
            "presentation codes shared by different medications, first kept"
        );
    }
    tracing::debug!(
        without_conditions = report.without_conditions.count,
        without_generics = report.without_generics.count,
        without_presentations = report.without_presentations.count,
        without_compositions = report.without_compositions.count,
        "data quality audit"
    );
}
