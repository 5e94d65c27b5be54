//! Cross-reference assembler.
//!
//! Joins the five parsed sequences on the CIS code and produces a
//! [`Snapshot`]. Medications define the universe of valid keys:
//!
//! - compositions, presentations and conditions referencing an unknown CIS
//!   are dropped without being tracked;
//! - generic group members referencing an unknown CIS are kept in the
//!   group's orphan list.

use std::collections::HashMap;

use bdpm_types::{
    Cis, Composition, CompositionSummary, Condition, GenericGroup, GenericMember,
    GenericMembership, GenericRecord, GroupId, Medication, MedicationRecord, Presentation,
};

use crate::audit::{audit, SourceStats};
use crate::normalize::normalize;
use crate::snapshot::Snapshot;
use crate::types::{Parsed, SourceFile};

/// The parsed content of the five source files.
#[derive(Debug, Clone, Default)]
pub struct ParsedFiles {
    /// Rows of `CIS_bdpm.txt`.
    pub medications: Parsed<MedicationRecord>,
    /// Rows of `CIS_CIP_bdpm.txt`.
    pub presentations: Parsed<Presentation>,
    /// Rows of `CIS_COMPO_bdpm.txt`.
    pub compositions: Parsed<Composition>,
    /// Rows of `CIS_GENER_bdpm.txt`.
    pub generics: Parsed<GenericRecord>,
    /// Rows of `CIS_CPD_bdpm.txt`.
    pub conditions: Parsed<Condition>,
}

impl ParsedFiles {
    /// Parse statistics of every file, in canonical order.
    pub fn source_stats(&self) -> Vec<SourceStats> {
        SourceFile::ALL
            .into_iter()
            .map(|file| {
                let stats = match file {
                    SourceFile::Medications => &self.medications.stats,
                    SourceFile::Presentations => &self.presentations.stats,
                    SourceFile::Compositions => &self.compositions.stats,
                    SourceFile::Generics => &self.generics.stats,
                    SourceFile::Conditions => &self.conditions.stats,
                };
                SourceStats {
                    file,
                    stats: stats.clone(),
                }
            })
            .collect()
    }
}

/// Assembles and audits a snapshot.
///
/// The returned snapshot carries its data quality report and is ready to be
/// published.
pub fn build_snapshot(parsed: ParsedFiles) -> Snapshot {
    let source_stats = parsed.source_stats();
    let snapshot = assemble(parsed);
    let report = audit(&snapshot, source_stats);
    snapshot.with_report(report)
}

/// Joins the parsed files into a snapshot, without auditing it.
pub fn assemble(parsed: ParsedFiles) -> Snapshot {
    let ParsedFiles {
        medications,
        presentations,
        compositions,
        generics,
        conditions,
    } = parsed;

    let mut index: HashMap<Cis, usize> = HashMap::with_capacity(medications.records.len());
    let mut meds: Vec<Medication> = Vec::with_capacity(medications.records.len());

    for record in medications.records {
        if index.contains_key(&record.cis) {
            tracing::debug!(cis = record.cis, "duplicate medication row ignored");
            continue;
        }
        index.insert(record.cis, meds.len());
        let normalized = normalize(&record.name);
        meds.push(Medication::from_record(record, normalized));
    }

    for composition in compositions.records {
        if let Some(&i) = index.get(&composition.cis) {
            meds[i].compositions.push(composition);
        }
    }

    for presentation in presentations.records {
        if let Some(&i) = index.get(&presentation.cis) {
            meds[i].presentations.push(presentation);
        }
    }

    for condition in conditions.records {
        if let Some(&i) = index.get(&condition.cis) {
            meds[i].conditions.push(condition.text);
        }
    }

    let groups = assemble_groups(generics.records, &index, &mut meds);

    Snapshot::build(meds, groups)
}

/// Builds generic groups in order of first appearance.
///
/// Compositions must already be attached to `meds`.
fn assemble_groups(
    records: Vec<GenericRecord>,
    index: &HashMap<Cis, usize>,
    meds: &mut [Medication],
) -> Vec<GenericGroup> {
    let mut groups: Vec<GenericGroup> = Vec::new();
    let mut group_index: HashMap<GroupId, usize> = HashMap::new();

    for record in records {
        let gi = *group_index.entry(record.group_id).or_insert_with(|| {
            let normalized = normalize(&record.label);
            groups.push(GenericGroup::new(record.group_id, record.label.clone(), normalized));
            groups.len() - 1
        });
        let group = &mut groups[gi];

        match index.get(&record.cis) {
            Some(&mi) => {
                let medication = &mut meds[mi];
                group.members.push(member_summary(medication, &record));
                medication.generics.push(GenericMembership {
                    group_id: record.group_id,
                    label: record.label,
                    kind: record.kind,
                });
            }
            None => {
                if !group.orphan_cis.contains(&record.cis) {
                    group.orphan_cis.push(record.cis);
                }
            }
        }
    }

    groups
}

fn member_summary(medication: &Medication, record: &GenericRecord) -> GenericMember {
    GenericMember {
        cis: medication.cis,
        name: medication.name.clone(),
        form: medication.form.clone(),
        kind: record.kind,
        compositions: medication
            .compositions
            .iter()
            .map(|c| CompositionSummary {
                element: c.element.clone(),
                substance_code: c.substance_code,
                substance: c.substance.clone(),
                dosage: c.dosage.clone(),
            })
            .collect(),
    }
}
