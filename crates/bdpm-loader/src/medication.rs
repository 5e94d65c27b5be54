//! BDPM medication file parser.
//!
//! Parses `CIS_bdpm.txt`.

use bdpm_types::MedicationRecord;
use csv::StringRecord;

use crate::parser::{parse, BdpmRecord};
use crate::types::{BdpmResult, SourceFile};

impl BdpmRecord for MedicationRecord {
    const SOURCE: SourceFile = SourceFile::Medications;
    const MIN_COLUMNS: usize = 12;

    fn from_record(record: &StringRecord) -> BdpmResult<Self> {
        Ok(MedicationRecord {
            cis: parse::positive(parse::text(record, 0))?,
            name: parse::owned(record, 1),
            form: parse::owned(record, 2),
            routes: parse::list(parse::text(record, 3)),
            authorization_status: parse::owned(record, 4),
            procedure_type: parse::owned(record, 5),
            marketing_status: parse::owned(record, 6),
            authorization_date: parse::owned(record, 7),
            holder: parse::owned(record, 10),
            enhanced_surveillance: parse::flag(parse::text(record, 11)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BdpmParser;
    use crate::types::BdpmError;

    fn make_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    const DOLIPRANE: &[&str] = &[
        "60234100",
        "DOLIPRANE 500 mg, comprimé",
        "comprimé",
        "orale",
        "Autorisation active",
        "Procédure nationale",
        "Commercialisée",
        "09/07/1986",
        "",
        "",
        " OPELLA HEALTHCARE FRANCE",
        "Non",
    ];

    #[test]
    fn test_parse_medication_record() {
        let med = MedicationRecord::from_record(&make_record(DOLIPRANE)).unwrap();
        assert_eq!(med.cis, 60234100);
        assert_eq!(med.name, "DOLIPRANE 500 mg, comprimé");
        assert_eq!(med.form, "comprimé");
        assert_eq!(med.routes, vec!["orale"]);
        assert_eq!(med.marketing_status, "Commercialisée");
        assert_eq!(med.authorization_date, "09/07/1986");
        assert_eq!(med.holder, "OPELLA HEALTHCARE FRANCE");
        assert!(!med.enhanced_surveillance);
    }

    #[test]
    fn test_multiple_routes_and_surveillance() {
        let mut fields: Vec<&str> = DOLIPRANE.to_vec();
        fields[3] = "cutanée;orale";
        fields[11] = "Oui";
        let med = MedicationRecord::from_record(&make_record(&fields)).unwrap();
        assert_eq!(med.routes, vec!["cutanée", "orale"]);
        assert!(med.enhanced_surveillance);
    }

    #[test]
    fn test_invalid_cis() {
        let mut fields: Vec<&str> = DOLIPRANE.to_vec();
        fields[0] = "6023A100";
        let err = MedicationRecord::from_record(&make_record(&fields)).unwrap_err();
        assert!(matches!(err, BdpmError::InvalidInteger { .. }));
    }

    #[test]
    fn test_zero_cis_line_is_skipped() {
        let mut zero: Vec<&str> = DOLIPRANE.to_vec();
        zero[0] = "0";
        let input = format!("{}\n{}\n", zero.join("\t"), DOLIPRANE.join("\t"));

        let parsed = BdpmParser::<_, MedicationRecord>::from_reader(input.as_bytes())
            .parse_all()
            .unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].cis, 60234100);
        assert_eq!(parsed.stats.skipped_lines, 1);
    }

    #[test]
    fn test_hundred_valid_lines_one_bad_key() {
        let mut input = String::new();
        for i in 0..100 {
            let mut fields: Vec<&str> = DOLIPRANE.to_vec();
            let cis = (60000000 + i).to_string();
            fields[0] = &cis;
            input.push_str(&fields.join("\t"));
            input.push('\n');
            if i == 50 {
                let mut bad: Vec<&str> = DOLIPRANE.to_vec();
                bad[0] = "NOT-A-CIS";
                input.push_str(&bad.join("\t"));
                input.push('\n');
            }
        }

        let parsed = BdpmParser::<_, MedicationRecord>::from_reader(input.as_bytes())
            .parse_all()
            .unwrap();
        assert_eq!(parsed.records.len(), 100);
        assert_eq!(parsed.stats.skipped_lines, 1);
        assert_eq!(parsed.records[0].cis, 60000000);
        assert_eq!(parsed.records[99].cis, 60000099);
    }
}
