//! BDPM generic group file parser.
//!
//! Parses `CIS_GENER_bdpm.txt`.

use bdpm_types::{GenericRecord, GenericType};
use csv::StringRecord;

use crate::parser::{parse, BdpmRecord};
use crate::types::{BdpmError, BdpmResult, SourceFile};

impl BdpmRecord for GenericRecord {
    const SOURCE: SourceFile = SourceFile::Generics;
    const MIN_COLUMNS: usize = 4;

    fn from_record(record: &StringRecord) -> BdpmResult<Self> {
        let code_text = parse::text(record, 3);
        let code: u8 = parse::integer(code_text)?;
        let kind = GenericType::from_code(code).ok_or_else(|| BdpmError::InvalidCode {
            field: "generic type",
            value: code_text.to_string(),
        })?;

        Ok(GenericRecord {
            group_id: parse::positive(parse::text(record, 0))?,
            label: parse::owned(record, 1),
            cis: parse::positive(parse::text(record, 2))?,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    #[test]
    fn test_parse_generic_record() {
        let record = make_record(&[
            "1",
            "PARACETAMOL 500 mg - DOLIPRANE 500 mg, comprimé",
            "60234100",
            "0",
            "1",
        ]);
        let generic = GenericRecord::from_record(&record).unwrap();
        assert_eq!(generic.group_id, 1);
        assert_eq!(generic.cis, 60234100);
        assert_eq!(generic.kind, GenericType::Princeps);
    }

    #[test]
    fn test_unknown_generic_type() {
        let record = make_record(&["1", "label", "60234100", "3", "1"]);
        let err = GenericRecord::from_record(&record).unwrap_err();
        assert!(err.is_line_error());
        assert!(matches!(err, BdpmError::InvalidCode { .. }));
    }
}
