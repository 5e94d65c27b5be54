//! BDPM identifier types.
//!
//! The dataset uses plain base-10 integers for every key. These aliases
//! keep signatures readable without introducing conversion noise.

/// A CIS code (Code Identifiant de Spécialité), the primary key of a medication.
///
/// CIS codes are 8-digit integers assigned by the national agency.
///
/// # Examples
///
/// ```
/// use bdpm_types::Cis;
///
/// let doliprane: Cis = 60234100;
/// ```
pub type Cis = u32;

/// A 7-digit CIP code identifying a commercial presentation (packaging).
pub type Cip7 = u32;

/// A 13-digit CIP code, the EAN-compatible form of the same packaging code.
pub type Cip13 = u64;

/// Identifier of a generic group.
pub type GroupId = u32;
