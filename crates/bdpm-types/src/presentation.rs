//! Commercial presentation type.

use crate::{Cip13, Cip7, Cis};

/// One packaging line from `CIS_CIP_bdpm.txt`.
///
/// Every presentation carries the same packaging code in two forms, a
/// 7-digit CIP and a 13-digit CIP. Callers may query with either one.
///
/// # Columns
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | 1 | Integer | CIS code of the medication |
/// | 2 | Integer | CIP7 code |
/// | 3 | Text | Presentation label |
/// | 4 | Text | Administrative status |
/// | 5 | Text | Marketing status |
/// | 6 | Date | Marketing declaration date (dd/mm/yyyy) |
/// | 7 | Integer | CIP13 code |
/// | 8 | Text | Agreement to local authorities (`oui`/`non`) |
/// | 9 | Text | Reimbursement rate(s) ("65%") |
/// | 10 | Decimal | Price in euros, French format ("1,23"), may be empty |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Presentation {
    /// CIS code of the owning medication.
    pub cis: Cis,
    /// 7-digit packaging code.
    pub cip7: Cip7,
    /// 13-digit packaging code.
    pub cip13: Cip13,
    /// Presentation label.
    pub label: String,
    /// Administrative status.
    pub administrative_status: String,
    /// Marketing status.
    pub marketing_status: String,
    /// Marketing declaration date, as published.
    pub declaration_date: String,
    /// Whether the presentation is approved for use by local authorities.
    pub agreement: bool,
    /// Reimbursement rate, as published.
    pub reimbursement_rate: String,
    /// Price in euros, when published.
    pub price: Option<f64>,
}

impl Presentation {
    /// Returns true if the presentation is declared as marketed.
    pub fn is_marketed(&self) -> bool {
        self.marketing_status.starts_with("Déclaration de commercialisation")
    }

    /// Returns true if a reimbursement rate is published.
    pub fn is_reimbursed(&self) -> bool {
        !self.reimbursement_rate.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Presentation {
        Presentation {
            cis: 60234100,
            cip7: 3400935,
            cip13: 3400934998331,
            label: "plaquette(s) PVC aluminium de 8 comprimé(s)".to_string(),
            administrative_status: "Présentation active".to_string(),
            marketing_status: "Déclaration de commercialisation".to_string(),
            declaration_date: "16/03/2011".to_string(),
            agreement: true,
            reimbursement_rate: "65%".to_string(),
            price: Some(1.16),
        }
    }

    #[test]
    fn test_marketing_helpers() {
        let pres = sample();
        assert!(pres.is_marketed());
        assert!(pres.is_reimbursed());

        let stopped = Presentation {
            marketing_status: "Arrêt de commercialisation".to_string(),
            reimbursement_rate: String::new(),
            ..sample()
        };
        assert!(!stopped.is_marketed());
        assert!(!stopped.is_reimbursed());
    }
}
