//! Prescription and dispensing condition type.

use crate::Cis;

/// One line from `CIS_CPD_bdpm.txt`.
///
/// Only the text is kept once attached to a medication.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    /// CIS code of the medication the condition applies to.
    pub cis: Cis,
    /// Condition text ("liste I", "prescription hospitalière"...).
    pub text: String,
}
