//! BDPM prescription condition file parser.
//!
//! Parses `CIS_CPD_bdpm.txt`.

use bdpm_types::Condition;
use csv::StringRecord;

use crate::parser::{parse, BdpmRecord};
use crate::types::{BdpmResult, SourceFile};

impl BdpmRecord for Condition {
    const SOURCE: SourceFile = SourceFile::Conditions;
    const MIN_COLUMNS: usize = 2;

    fn from_record(record: &StringRecord) -> BdpmResult<Self> {
        Ok(Condition {
            cis: parse::positive(parse::text(record, 0))?,
            text: parse::owned(record, 1),
        })
    }
}
