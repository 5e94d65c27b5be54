//! Immutable, fully cross-referenced generation of the dataset.
//!
//! A [`Snapshot`] owns two ordered sequences (medications and generic
//! groups). Every lookup map is derived from those sequences in
//! [`Snapshot::build`] and stores positions into them, so a map can never
//! refer to data of another generation and both packaging-code maps resolve
//! to the very same [`Presentation`] instance.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bdpm_types::{Cip13, Cip7, Cis, GenericGroup, GroupId, Medication, Presentation};
use chrono::{DateTime, Utc};

use crate::audit::DataQualityReport;
use crate::normalize::normalize;

/// Which packaging code form a collision was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum CipForm {
    /// 7-digit CIP.
    Cip7,
    /// 13-digit CIP.
    Cip13,
}

/// A packaging code claimed by presentations of two different medications.
///
/// The first-seen presentation keeps the code.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PresentationCollision {
    /// Code form.
    pub form: CipForm,
    /// The colliding code.
    pub code: u64,
    /// Medication whose presentation kept the code.
    pub kept_cis: Cis,
    /// Medication whose presentation lost the code.
    pub dropped_cis: Cis,
}

/// Position of a presentation inside the medication sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PresentationRef {
    medication: usize,
    presentation: usize,
}

/// One published generation of the dataset.
///
/// Snapshots are built by the assembler, then never modified once shared.
/// Readers hold them through an `Arc` for the duration of a request.
#[derive(Clone)]
pub struct Snapshot {
    medications: Arc<[Medication]>,
    groups: Arc<[GenericGroup]>,
    medication_index: HashMap<Cis, usize>,
    group_index: HashMap<GroupId, usize>,
    cip7_index: HashMap<Cip7, PresentationRef>,
    cip13_index: HashMap<Cip13, PresentationRef>,
    collisions: Vec<PresentationCollision>,
    report: DataQualityReport,
    generation: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::build(Vec::new(), Vec::new())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("generation", &self.generation)
            .field("updated_at", &self.updated_at)
            .field("medications", &self.medications.len())
            .field("groups", &self.groups.len())
            .field("cip7_index", &self.cip7_index.len())
            .field("cip13_index", &self.cip13_index.len())
            .field("collisions", &self.collisions.len())
            .finish()
    }
}

impl Snapshot {
    /// Creates an empty, never-published snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot and derives every index from the two sequences.
    ///
    /// Medications must have unique CIS codes; on duplicates the first one
    /// is indexed. Packaging code collisions between different medications
    /// keep the first-seen presentation and are recorded.
    pub fn build(medications: Vec<Medication>, groups: Vec<GenericGroup>) -> Self {
        let mut medication_index = HashMap::with_capacity(medications.len());
        let mut cip7_index = HashMap::new();
        let mut cip13_index = HashMap::new();
        let mut collisions = Vec::new();

        for (mi, medication) in medications.iter().enumerate() {
            medication_index.entry(medication.cis).or_insert(mi);

            for (pi, presentation) in medication.presentations.iter().enumerate() {
                let pref = PresentationRef {
                    medication: mi,
                    presentation: pi,
                };

                if let Some(kept) = index_presentation(&mut cip7_index, presentation.cip7, pref) {
                    let kept_cis = medications[kept.medication].cis;
                    if kept_cis != medication.cis {
                        collisions.push(PresentationCollision {
                            form: CipForm::Cip7,
                            code: u64::from(presentation.cip7),
                            kept_cis,
                            dropped_cis: medication.cis,
                        });
                    }
                }

                if let Some(kept) = index_presentation(&mut cip13_index, presentation.cip13, pref) {
                    let kept_cis = medications[kept.medication].cis;
                    if kept_cis != medication.cis {
                        collisions.push(PresentationCollision {
                            form: CipForm::Cip13,
                            code: presentation.cip13,
                            kept_cis,
                            dropped_cis: medication.cis,
                        });
                    }
                }
            }
        }

        let mut group_index = HashMap::with_capacity(groups.len());
        for (gi, group) in groups.iter().enumerate() {
            group_index.entry(group.id).or_insert(gi);
        }

        Self {
            medications: medications.into(),
            groups: groups.into(),
            medication_index,
            group_index,
            cip7_index,
            cip13_index,
            collisions,
            report: DataQualityReport::default(),
            generation: 0,
            updated_at: None,
        }
    }

    /// Attaches a data quality report.
    pub fn with_report(mut self, report: DataQualityReport) -> Self {
        self.report = report;
        self
    }

    /// Stamps the generation number and publish time.
    ///
    /// Called by the publishing container right before the snapshot becomes
    /// visible to readers.
    pub fn mark_published(&mut self, generation: u64, at: DateTime<Utc>) {
        self.generation = generation;
        self.updated_at = Some(at);
    }

    // Sequences

    /// All medications in source order.
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// Shared handle to the medication sequence.
    pub fn medications_shared(&self) -> Arc<[Medication]> {
        Arc::clone(&self.medications)
    }

    /// All generic groups in order of first appearance.
    pub fn groups(&self) -> &[GenericGroup] {
        &self.groups
    }

    /// Shared handle to the generic group sequence.
    pub fn groups_shared(&self) -> Arc<[GenericGroup]> {
        Arc::clone(&self.groups)
    }

    // Lookups

    /// Gets a medication by its CIS code.
    pub fn medication(&self, cis: Cis) -> Option<&Medication> {
        self.medication_index.get(&cis).map(|&i| &self.medications[i])
    }

    /// Gets a generic group by its identifier.
    pub fn group(&self, id: GroupId) -> Option<&GenericGroup> {
        self.group_index.get(&id).map(|&i| &self.groups[i])
    }

    /// Gets a presentation by its 7-digit CIP.
    pub fn presentation_by_cip7(&self, cip7: Cip7) -> Option<&Presentation> {
        self.cip7_index.get(&cip7).map(|r| self.resolve(*r))
    }

    /// Gets a presentation by its 13-digit CIP.
    pub fn presentation_by_cip13(&self, cip13: Cip13) -> Option<&Presentation> {
        self.cip13_index.get(&cip13).map(|r| self.resolve(*r))
    }

    /// Gets the medication owning a presentation, by either code form.
    ///
    /// Codes of up to 7 digits are looked up as CIP7, longer ones as CIP13.
    pub fn medication_for_cip(&self, code: u64) -> Option<&Medication> {
        let pref = (if code <= 9_999_999 {
            self.cip7_index.get(&(code as Cip7))
        } else {
            self.cip13_index.get(&code)
        })?;
        Some(&self.medications[pref.medication])
    }

    fn resolve(&self, pref: PresentationRef) -> &Presentation {
        &self.medications[pref.medication].presentations[pref.presentation]
    }

    // Search

    /// Finds medications whose normalized name contains the normalized query.
    ///
    /// Results are returned in snapshot order. An empty query matches nothing.
    pub fn search_medications(&self, query: &str, limit: usize) -> Vec<&Medication> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Vec::new();
        }
        self.medications
            .iter()
            .filter(|m| m.normalized_name.contains(&needle))
            .take(limit)
            .collect()
    }

    /// Finds generic groups whose normalized label contains the normalized query.
    pub fn search_groups(&self, query: &str, limit: usize) -> Vec<&GenericGroup> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Vec::new();
        }
        self.groups
            .iter()
            .filter(|g| g.normalized_label.contains(&needle))
            .take(limit)
            .collect()
    }

    // Metadata

    /// Packaging code collisions found while indexing.
    pub fn collisions(&self) -> &[PresentationCollision] {
        &self.collisions
    }

    /// The data quality report of this generation.
    pub fn report(&self) -> &DataQualityReport {
        &self.report
    }

    /// Publish generation; 0 for a snapshot that was never published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Publish time; `None` for a snapshot that was never published.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Returns the number of medications.
    pub fn medication_count(&self) -> usize {
        self.medications.len()
    }

    /// Returns the number of generic groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the number of presentations attached to medications.
    pub fn presentation_count(&self) -> usize {
        self.medications.iter().map(|m| m.presentations.len()).sum()
    }

    /// Returns true if the snapshot holds no medication.
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }
}

/// Inserts a code if absent; returns the existing entry otherwise.
fn index_presentation<K: std::hash::Hash + Eq>(
    index: &mut HashMap<K, PresentationRef>,
    code: K,
    pref: PresentationRef,
) -> Option<PresentationRef> {
    match index.entry(code) {
        Entry::Vacant(slot) => {
            slot.insert(pref);
            None
        }
        Entry::Occupied(existing) => Some(*existing.get()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdpm_types::MedicationRecord;

    fn medication(cis: Cis, name: &str) -> Medication {
        let record = MedicationRecord {
            cis,
            name: name.to_string(),
            form: "comprimé".to_string(),
            routes: vec!["orale".to_string()],
            authorization_status: "Autorisation active".to_string(),
            procedure_type: "Procédure nationale".to_string(),
            marketing_status: "Commercialisée".to_string(),
            authorization_date: "01/01/2000".to_string(),
            holder: "LABORATOIRE".to_string(),
            enhanced_surveillance: false,
        };
        Medication::from_record(record, normalize(name))
    }

    fn presentation(cis: Cis, cip7: Cip7, cip13: Cip13) -> Presentation {
        Presentation {
            cis,
            cip7,
            cip13,
            label: "boîte de 8".to_string(),
            administrative_status: "Présentation active".to_string(),
            marketing_status: "Déclaration de commercialisation".to_string(),
            declaration_date: "01/01/2000".to_string(),
            agreement: true,
            reimbursement_rate: "65%".to_string(),
            price: Some(2.5),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.generation(), 0);
        assert!(snapshot.updated_at().is_none());
        assert!(snapshot.medication(1).is_none());
    }

    #[test]
    fn test_dual_index_same_instance() {
        let mut med = medication(60234100, "DOLIPRANE 500 mg");
        med.presentations.push(presentation(60234100, 3400935, 3400934998331));
        med.presentations.push(presentation(60234100, 3400936, 3400934998332));

        let snapshot = Snapshot::build(vec![med], Vec::new());
        for (cip7, cip13) in [(3400935, 3400934998331), (3400936, 3400934998332)] {
            let by7 = snapshot.presentation_by_cip7(cip7).unwrap();
            let by13 = snapshot.presentation_by_cip13(cip13).unwrap();
            assert!(std::ptr::eq(by7, by13));
            assert_eq!(by7.cip13, cip13);
        }
        assert_eq!(snapshot.presentation_count(), 2);
        assert_eq!(
            snapshot.medication_for_cip(3400936).map(|m| m.cis),
            Some(60234100)
        );
        assert_eq!(
            snapshot.medication_for_cip(3400934998331).map(|m| m.cis),
            Some(60234100)
        );
        assert!(snapshot.medication_for_cip(1234567).is_none());
    }

    #[test]
    fn test_collision_keeps_first() {
        let mut first = medication(1, "FIRST");
        first.presentations.push(presentation(1, 1111111, 3400000000001));
        let mut second = medication(2, "SECOND");
        second.presentations.push(presentation(2, 1111111, 3400000000002));

        let snapshot = Snapshot::build(vec![first, second], Vec::new());
        assert_eq!(snapshot.presentation_by_cip7(1111111).unwrap().cis, 1);
        assert_eq!(snapshot.presentation_by_cip13(3400000000002).unwrap().cis, 2);
        assert_eq!(
            snapshot.collisions(),
            &[PresentationCollision {
                form: CipForm::Cip7,
                code: 1111111,
                kept_cis: 1,
                dropped_cis: 2,
            }]
        );
    }

    #[test]
    fn test_same_medication_duplicate_is_not_collision() {
        let mut med = medication(1, "DUP");
        med.presentations.push(presentation(1, 1111111, 3400000000001));
        med.presentations.push(presentation(1, 1111111, 3400000000001));

        let snapshot = Snapshot::build(vec![med], Vec::new());
        assert!(snapshot.collisions().is_empty());
    }

    #[test]
    fn test_search_uses_normalized_names() {
        let meds = vec![
            medication(1, "PARACÉTAMOL BIOGARAN 500 mg"),
            medication(2, "IBUPROFÈNE MYLAN 400 mg"),
            medication(3, "Paracétamol  ARROW 1 g"),
        ];
        let group = GenericGroup::new(7, "PARACÉTAMOL 500 mg".to_string(), normalize("PARACÉTAMOL 500 mg"));
        let snapshot = Snapshot::build(meds, vec![group]);

        let found: Vec<Cis> = snapshot
            .search_medications("paracetamol", 10)
            .iter()
            .map(|m| m.cis)
            .collect();
        assert_eq!(found, vec![1, 3]);
        assert_eq!(snapshot.search_medications("PARACETAMOL", 1).len(), 1);
        assert!(snapshot.search_medications("   ", 10).is_empty());
        assert_eq!(snapshot.search_groups("Paracetamol 500", 10)[0].id, 7);
        assert_eq!(snapshot.group(7).unwrap().label, "PARACÉTAMOL 500 mg");
    }

    #[test]
    fn test_mark_published() {
        let mut snapshot = Snapshot::build(vec![medication(1, "A")], Vec::new());
        let now = Utc::now();
        snapshot.mark_published(3, now);
        assert_eq!(snapshot.generation(), 3);
        assert_eq!(snapshot.updated_at(), Some(now));
    }
}
