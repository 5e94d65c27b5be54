//! # bdpm-types
//!
//! Type definitions for the French public medication database (BDPM).
//!
//! This crate provides Rust types for the rows of the five BDPM distribution
//! files and for the assembled, cross-referenced entities built from them.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use bdpm_types::{GenericType, Medication, MedicationRecord};
//!
//! let record = MedicationRecord {
//!     cis: 60234100,
//!     name: "DOLIPRANE 500 mg, comprimé".to_string(),
//!     form: "comprimé".to_string(),
//!     routes: vec!["orale".to_string()],
//!     authorization_status: "Autorisation active".to_string(),
//!     procedure_type: "Procédure nationale".to_string(),
//!     marketing_status: "Commercialisée".to_string(),
//!     authorization_date: "09/07/1986".to_string(),
//!     holder: "OPELLA HEALTHCARE FRANCE".to_string(),
//!     enhanced_surveillance: false,
//! };
//!
//! let medication = Medication::from_record(record, "doliprane 500 mg, comprime".to_string());
//! assert!(medication.is_marketed());
//! assert_eq!(GenericType::from_code(1), Some(GenericType::Generic));
//! ```

#![warn(missing_docs)]

mod composition;
mod condition;
mod enums;
mod generic;
mod ids;
mod medication;
mod presentation;

// Re-export all public types at crate root
pub use composition::Composition;
pub use condition::Condition;
pub use enums::{ComponentNature, GenericType};
pub use generic::{CompositionSummary, GenericGroup, GenericMember, GenericRecord};
pub use ids::{Cip13, Cip7, Cis, GroupId};
pub use medication::{GenericMembership, Medication, MedicationRecord};
pub use presentation::Presentation;
