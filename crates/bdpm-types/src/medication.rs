//! Medication (specialty) types.
//!
//! [`MedicationRecord`] is one raw row of `CIS_bdpm.txt`. [`Medication`] is
//! the assembled entity that embeds its compositions, presentations, generic
//! group memberships and conditions.

use crate::{Cis, Composition, GenericType, GroupId, Presentation};

/// One row of `CIS_bdpm.txt`.
///
/// # Columns
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | 1 | Integer | CIS code |
/// | 2 | Text | Name |
/// | 3 | Text | Pharmaceutical form |
/// | 4 | List | Administration routes, `;`-separated |
/// | 5 | Text | Authorization (AMM) status |
/// | 6 | Text | Authorization procedure type |
/// | 7 | Text | Marketing status |
/// | 8 | Date | Authorization date (dd/mm/yyyy) |
/// | 9 | Text | BDM status (alert/warning), unused |
/// | 10 | Text | European authorization number, unused |
/// | 11 | Text | Holder(s) |
/// | 12 | Text | Enhanced surveillance (`Oui`/`Non`) |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MedicationRecord {
    /// CIS code.
    pub cis: Cis,
    /// Display name.
    pub name: String,
    /// Pharmaceutical form.
    pub form: String,
    /// Administration routes in published order.
    pub routes: Vec<String>,
    /// Authorization status.
    pub authorization_status: String,
    /// Authorization procedure type.
    pub procedure_type: String,
    /// Marketing status.
    pub marketing_status: String,
    /// Authorization date, as published.
    pub authorization_date: String,
    /// Holder name(s).
    pub holder: String,
    /// Whether the medication is under enhanced surveillance.
    pub enhanced_surveillance: bool,
}

/// Membership of a medication in a generic group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericMembership {
    /// The generic group.
    pub group_id: GroupId,
    /// Group label.
    pub label: String,
    /// Role of the medication in the group.
    pub kind: GenericType,
}

/// A fully assembled medication.
///
/// Built once per update cycle and never mutated after publication.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Medication {
    /// CIS code.
    pub cis: Cis,
    /// Display name.
    pub name: String,
    /// Case-folded, accent-stripped, whitespace-collapsed name for search.
    pub normalized_name: String,
    /// Pharmaceutical form.
    pub form: String,
    /// Administration routes in published order.
    pub routes: Vec<String>,
    /// Authorization status.
    pub authorization_status: String,
    /// Authorization procedure type.
    pub procedure_type: String,
    /// Marketing status.
    pub marketing_status: String,
    /// Authorization date, as published.
    pub authorization_date: String,
    /// Holder name(s).
    pub holder: String,
    /// Whether the medication is under enhanced surveillance.
    pub enhanced_surveillance: bool,
    /// Composition lines in source order.
    pub compositions: Vec<Composition>,
    /// Presentations in source order.
    pub presentations: Vec<Presentation>,
    /// Generic group memberships in source order.
    pub generics: Vec<GenericMembership>,
    /// Prescription conditions in source order.
    pub conditions: Vec<String>,
}

impl Medication {
    /// Creates a medication from a parsed row with no attachments yet.
    pub fn from_record(record: MedicationRecord, normalized_name: String) -> Self {
        Self {
            cis: record.cis,
            name: record.name,
            normalized_name,
            form: record.form,
            routes: record.routes,
            authorization_status: record.authorization_status,
            procedure_type: record.procedure_type,
            marketing_status: record.marketing_status,
            authorization_date: record.authorization_date,
            holder: record.holder,
            enhanced_surveillance: record.enhanced_surveillance,
            compositions: Vec::new(),
            presentations: Vec::new(),
            generics: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Returns true if the medication is currently marketed.
    pub fn is_marketed(&self) -> bool {
        self.marketing_status == "Commercialisée"
    }

    /// Returns true if the medication is the princeps of at least one group.
    pub fn is_princeps(&self) -> bool {
        self.generics.iter().any(|g| g.kind.is_princeps())
    }
}
