//! Atomic data container.
//!
//! Holds the published [`Snapshot`] behind an [`ArcSwap`]. Readers load the
//! current `Arc<Snapshot>` without taking any lock and keep a consistent
//! view for as long as they hold it. The update pipeline publishes a new
//! generation with a single pointer swap.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use bdpm_loader::{DataQualityReport, Snapshot};
use bdpm_types::{Cip13, Cip7, Cis, GenericGroup, GroupId, Medication, Presentation};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Read access to the current dataset.
///
/// Every method works on one snapshot loaded at call time. Callers that need
/// several reads to agree should call [`DataStore::snapshot`] once and query
/// the returned value.
pub trait DataStore: Send + Sync {
    /// Returns the currently published snapshot.
    fn snapshot(&self) -> Arc<Snapshot>;

    /// Returns true while an update cycle is in progress.
    fn is_updating(&self) -> bool;

    /// All medications, in source order.
    fn get_all_medications(&self) -> Arc<[Medication]> {
        self.snapshot().medications_shared()
    }

    /// All generic groups, in order of first appearance.
    fn get_all_groups(&self) -> Arc<[GenericGroup]> {
        self.snapshot().groups_shared()
    }

    /// Looks up a medication by CIS code.
    fn lookup_medication(&self, cis: Cis) -> Option<Medication> {
        self.snapshot().medication(cis).cloned()
    }

    /// Looks up a generic group by id.
    fn lookup_group(&self, id: GroupId) -> Option<GenericGroup> {
        self.snapshot().group(id).cloned()
    }

    /// Looks up a presentation by 7-digit CIP code.
    fn lookup_presentation_by_cip7(&self, cip7: Cip7) -> Option<Presentation> {
        self.snapshot().presentation_by_cip7(cip7).cloned()
    }

    /// Looks up a presentation by 13-digit CIP code.
    fn lookup_presentation_by_cip13(&self, cip13: Cip13) -> Option<Presentation> {
        self.snapshot().presentation_by_cip13(cip13).cloned()
    }

    /// When the current snapshot was published, `None` before the first publish.
    fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.snapshot().updated_at()
    }

    /// Audit findings of the current snapshot.
    fn data_quality_report(&self) -> DataQualityReport {
        self.snapshot().report().clone()
    }
}

/// Summary of the container state, for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    /// Generation of the published snapshot, 0 before the first publish.
    pub generation: u64,
    /// Number of medications.
    pub medications: usize,
    /// Number of generic groups.
    pub groups: usize,
    /// Number of indexed presentations.
    pub presentations: usize,
    /// Publish time of the current snapshot.
    pub last_updated: Option<DateTime<Utc>>,
    /// Whether an update cycle is running.
    pub updating: bool,
}

/// Holds the published snapshot and the updating flag.
pub struct DataContainer {
    current: ArcSwap<Snapshot>,
    updating: AtomicBool,
    generation: AtomicU64,
}

impl Default for DataContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl DataContainer {
    /// Creates a container serving an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
            updating: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Marks the container as updating.
    ///
    /// Returns false without blocking if an update is already in progress.
    pub fn begin_update(&self) -> bool {
        self.updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clears the updating flag.
    pub fn end_update(&self) {
        self.updating.store(false, Ordering::Release);
    }

    /// Like [`begin_update`](Self::begin_update), but returns a guard that
    /// calls [`end_update`](Self::end_update) when dropped.
    pub fn try_begin_update(&self) -> Option<UpdateGuard<'_>> {
        self.begin_update().then(|| UpdateGuard { container: self })
    }

    /// Publishes a snapshot, replacing the current one in a single swap.
    ///
    /// Stamps the snapshot with the next generation number and the current
    /// time, and returns the generation.
    pub fn publish(&self, mut snapshot: Snapshot) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        snapshot.mark_published(generation, Utc::now());
        self.current.store(Arc::new(snapshot));
        generation
    }

    /// Returns the currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Returns true while an update cycle is in progress.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Returns a summary taken from a single snapshot load.
    pub fn stats(&self) -> StoreStats {
        let snapshot = self.current.load();
        StoreStats {
            generation: snapshot.generation(),
            medications: snapshot.medication_count(),
            groups: snapshot.group_count(),
            presentations: snapshot.presentation_count(),
            last_updated: snapshot.updated_at(),
            updating: self.is_updating(),
        }
    }
}

impl DataStore for DataContainer {
    fn snapshot(&self) -> Arc<Snapshot> {
        DataContainer::snapshot(self)
    }

    fn is_updating(&self) -> bool {
        DataContainer::is_updating(self)
    }
}

/// Clears the updating flag of a [`DataContainer`] when dropped.
///
/// Runs on success, on error and on unwinding alike.
#[must_use = "dropping the guard ends the update immediately"]
pub struct UpdateGuard<'a> {
    container: &'a DataContainer,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.container.end_update();
    }
}
