use csv::Reader;

use crate::errors::ParserError;
use crate::model::{RawSalesRow, SourceFile, SourceKind};

use super::{
    optional_text, parse_optional_count, parse_optional_date, required_text, HeaderIndex,
};

const KIND: SourceKind = SourceKind::Sales;

pub(super) const COLUMNS: [&str; 5] = ["date", "product", "region", "units_sold", "price_per_unit"];

pub(super) fn parse_records(
    mut reader: Reader<&[u8]>,
    headers: &HeaderIndex,
) -> Result<SourceFile, ParserError> {
    let [date, product, region, units_sold, price_per_unit] = headers.require(KIND, COLUMNS)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row_index = idx + 1;

        rows.push(RawSalesRow {
            date: parse_optional_date(KIND, &record, date, row_index, "date")?,
            product: required_text(KIND, &record, product, row_index, "product")?,
            region: required_text(KIND, &record, region, row_index, "region")?,
            units_sold: parse_optional_count(KIND, &record, units_sold, row_index, "units_sold")?,
            price_per_unit: optional_text(&record, price_per_unit),
        });
    }

    if rows.is_empty() {
        return Err(ParserError::EmptyData { kind: KIND });
    }

    Ok(SourceFile::Sales(rows))
}
