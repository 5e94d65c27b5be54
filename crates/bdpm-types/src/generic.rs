//! Generic group types.

use crate::{Cis, GenericType, GroupId};

/// One row of `CIS_GENER_bdpm.txt`.
///
/// # Columns
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | 1 | Integer | Generic group identifier |
/// | 2 | Text | Group label |
/// | 3 | Integer | CIS code of the member |
/// | 4 | Integer | Generic type code (see [`GenericType`]) |
/// | 5 | Integer | Sort number within the group (optional) |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericRecord {
    /// Generic group identifier.
    pub group_id: GroupId,
    /// Group label.
    pub label: String,
    /// CIS code of the member medication.
    pub cis: Cis,
    /// Role of the member in the group.
    pub kind: GenericType,
}

/// Condensed composition line embedded in a group member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompositionSummary {
    /// Pharmaceutical element label.
    pub element: String,
    /// Substance code.
    pub substance_code: u32,
    /// Substance name.
    pub substance: String,
    /// Dosage string.
    pub dosage: String,
}

/// Summary of a medication as a member of a generic group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericMember {
    /// CIS code of the member.
    pub cis: Cis,
    /// Member display name.
    pub name: String,
    /// Member pharmaceutical form.
    pub form: String,
    /// Role in the group.
    pub kind: GenericType,
    /// Composition of the member.
    pub compositions: Vec<CompositionSummary>,
}

/// A generic group with its resolved members.
///
/// Members whose CIS code has no medication in the same snapshot are kept in
/// `orphan_cis` by key only.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Group label.
    pub label: String,
    /// Case-folded, accent-stripped, whitespace-collapsed label for search.
    pub normalized_label: String,
    /// Resolved members in source order.
    pub members: Vec<GenericMember>,
    /// CIS codes referenced by the group with no matching medication.
    pub orphan_cis: Vec<Cis>,
}

impl GenericGroup {
    /// Creates an empty group.
    pub fn new(id: GroupId, label: String, normalized_label: String) -> Self {
        Self {
            id,
            label,
            normalized_label,
            members: Vec::new(),
            orphan_cis: Vec::new(),
        }
    }

    /// Returns the princeps members of the group.
    pub fn princeps(&self) -> impl Iterator<Item = &GenericMember> {
        self.members.iter().filter(|m| m.kind.is_princeps())
    }

    /// Returns true if the group references at least one unknown CIS code.
    pub fn has_orphans(&self) -> bool {
        !self.orphan_cis.is_empty()
    }
}
