//! BDPM composition file parser.
//!
//! Parses `CIS_COMPO_bdpm.txt`.

use bdpm_types::Composition;
use csv::StringRecord;

use crate::parser::{parse, BdpmRecord};
use crate::types::{BdpmResult, SourceFile};

impl BdpmRecord for Composition {
    const SOURCE: SourceFile = SourceFile::Compositions;
    const MIN_COLUMNS: usize = 7;

    fn from_record(record: &StringRecord) -> BdpmResult<Self> {
        Ok(Composition {
            cis: parse::positive(parse::text(record, 0))?,
            element: parse::owned(record, 1),
            substance_code: parse::integer(parse::text(record, 2))?,
            substance: parse::owned(record, 3),
            dosage: parse::owned(record, 4),
            reference_dosage: parse::owned(record, 5),
            nature: parse::owned(record, 6),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BdpmParser;

    #[test]
    fn test_parse_composition_lines() {
        let input = "60234100\tcomprimé\t02202\tPARACÉTAMOL\t500 mg\tun comprimé\tSA\t1\t\n\
                     60234100\tcomprimé\t\tPARACÉTAMOL\t500 mg\tun comprimé\tSA\t1\t\n";
        let parsed = BdpmParser::<_, Composition>::from_reader(input.as_bytes())
            .parse_all()
            .unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.skipped_lines, 1);

        let compo = &parsed.records[0];
        assert_eq!(compo.cis, 60234100);
        assert_eq!(compo.element, "comprimé");
        assert_eq!(compo.substance_code, 2202);
        assert_eq!(compo.substance, "PARACÉTAMOL");
        assert_eq!(compo.dosage, "500 mg");
        assert_eq!(compo.reference_dosage, "un comprimé");
        assert!(compo.is_active_substance());
    }
}
