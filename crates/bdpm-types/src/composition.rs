//! Medication composition type.

use crate::{Cis, ComponentNature};

/// One substance line from `CIS_COMPO_bdpm.txt`.
///
/// A medication usually has several composition lines: one per substance and
/// per pharmaceutical element (tablet, coating, solvent...).
///
/// # Columns
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | 1 | Integer | CIS code of the medication |
/// | 2 | Text | Pharmaceutical element ("comprimé", "solution"...) |
/// | 3 | Integer | Substance code |
/// | 4 | Text | Substance name |
/// | 5 | Text | Dosage ("500 mg") |
/// | 6 | Text | Reference of the dosage ("un comprimé") |
/// | 7 | Text | Component nature (`SA` or `FT`) |
/// | 8 | Integer | Link number between SA and FT lines (optional) |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Composition {
    /// CIS code of the owning medication.
    pub cis: Cis,
    /// Pharmaceutical element label.
    pub element: String,
    /// Substance code.
    pub substance_code: u32,
    /// Substance name.
    pub substance: String,
    /// Dosage string, kept verbatim.
    pub dosage: String,
    /// Reference dosage string, kept verbatim.
    pub reference_dosage: String,
    /// Component nature code as published.
    pub nature: String,
}

impl Composition {
    /// Returns the parsed component nature, if the code is known.
    pub fn component_nature(&self) -> Option<ComponentNature> {
        ComponentNature::from_code(&self.nature)
    }

    /// Returns true if this line describes an active substance.
    pub fn is_active_substance(&self) -> bool {
        self.component_nature() == Some(ComponentNature::ActiveSubstance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_nature() {
        let compo = Composition {
            cis: 60234100,
            element: "comprimé".to_string(),
            substance_code: 2202,
            substance: "PARACÉTAMOL".to_string(),
            dosage: "500 mg".to_string(),
            reference_dosage: "un comprimé".to_string(),
            nature: "SA".to_string(),
        };
        assert!(compo.is_active_substance());

        let fraction = Composition {
            nature: "FT".to_string(),
            ..compo
        };
        assert!(!fraction.is_active_substance());
    }
}
