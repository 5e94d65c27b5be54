//! BDPM presentation file parser.
//!
//! Parses `CIS_CIP_bdpm.txt`.

use bdpm_types::Presentation;
use csv::StringRecord;

use crate::parser::{parse, BdpmRecord};
use crate::types::{BdpmResult, SourceFile};

impl BdpmRecord for Presentation {
    const SOURCE: SourceFile = SourceFile::Presentations;
    const MIN_COLUMNS: usize = 10;

    fn from_record(record: &StringRecord) -> BdpmResult<Self> {
        Ok(Presentation {
            cis: parse::positive(parse::text(record, 0))?,
            cip7: parse::positive(parse::text(record, 1))?,
            label: parse::owned(record, 2),
            administrative_status: parse::owned(record, 3),
            marketing_status: parse::owned(record, 4),
            declaration_date: parse::owned(record, 5),
            cip13: parse::positive(parse::text(record, 6))?,
            agreement: parse::flag(parse::text(record, 7)),
            reimbursement_rate: parse::owned(record, 8),
            price: parse::price(parse::text(record, 9)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BdpmError;

    fn make_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    const PLAQUETTE: &[&str] = &[
        "60234100",
        "3400935",
        "plaquette(s) PVC aluminium de 8 comprimé(s)",
        "Présentation active",
        "Déclaration de commercialisation",
        "16/03/2011",
        "3400934998331",
        "oui",
        "65%",
        "1,16",
        "1,16",
        "",
        "",
    ];

    #[test]
    fn test_parse_presentation_record() {
        let pres = Presentation::from_record(&make_record(PLAQUETTE)).unwrap();
        assert_eq!(pres.cis, 60234100);
        assert_eq!(pres.cip7, 3400935);
        assert_eq!(pres.cip13, 3400934998331);
        assert!(pres.agreement);
        assert_eq!(pres.reimbursement_rate, "65%");
        assert_eq!(pres.price, Some(1.16));
        assert!(pres.is_marketed());
    }

    #[test]
    fn test_missing_price() {
        let mut fields = PLAQUETTE.to_vec();
        fields[7] = "non";
        fields[8] = "";
        fields[9] = "";
        let pres = Presentation::from_record(&make_record(&fields)).unwrap();
        assert!(!pres.agreement);
        assert_eq!(pres.price, None);
    }

    #[test]
    fn test_invalid_secondary_identifiers() {
        let mut fields = PLAQUETTE.to_vec();
        fields[1] = "34OO935";
        assert!(matches!(
            Presentation::from_record(&make_record(&fields)),
            Err(BdpmError::InvalidInteger { .. })
        ));

        let mut fields = PLAQUETTE.to_vec();
        fields[6] = "";
        assert!(matches!(
            Presentation::from_record(&make_record(&fields)),
            Err(BdpmError::InvalidInteger { .. })
        ));
    }
}
