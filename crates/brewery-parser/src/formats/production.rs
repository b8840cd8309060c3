use csv::Reader;

use crate::errors::ParserError;
use crate::model::{RawProductionRow, SourceFile, SourceKind};

use super::{
    optional_text, parse_optional_count, parse_optional_date, required_text, HeaderIndex,
};

const KIND: SourceKind = SourceKind::Production;

pub(super) const COLUMNS: [&str; 5] = [
    "date",
    "product",
    "units_produced",
    "spoiled_units",
    "cost_per_unit",
];

pub(super) fn parse_records(
    mut reader: Reader<&[u8]>,
    headers: &HeaderIndex,
) -> Result<SourceFile, ParserError> {
    let [date, product, units_produced, spoiled_units, cost_per_unit] =
        headers.require(KIND, COLUMNS)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row_index = idx + 1;

        // spoiled > produced is left for the transform to report.
        rows.push(RawProductionRow {
            date: parse_optional_date(KIND, &record, date, row_index, "date")?,
            product: required_text(KIND, &record, product, row_index, "product")?,
            units_produced: parse_optional_count(
                KIND,
                &record,
                units_produced,
                row_index,
                "units_produced",
            )?,
            spoiled_units: parse_optional_count(
                KIND,
                &record,
                spoiled_units,
                row_index,
                "spoiled_units",
            )?,
            cost_per_unit: optional_text(&record, cost_per_unit),
        });
    }

    if rows.is_empty() {
        return Err(ParserError::EmptyData { kind: KIND });
    }

    Ok(SourceFile::Production(rows))
}
