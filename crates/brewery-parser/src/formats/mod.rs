mod common;
mod production;
mod sales;

use crate::errors::ParserError;
use crate::model::{SourceFile, SourceKind};

pub(crate) use common::{
    open_reader, optional_text, parse_optional_count, parse_optional_date, required_text,
    HeaderIndex,
};

/// Columns a header row must carry for each layout.
pub fn required_columns(kind: SourceKind) -> &'static [&'static str] {
    match kind {
        SourceKind::Sales => &sales::COLUMNS,
        SourceKind::Production => &production::COLUMNS,
    }
}

/// Layout of a flat file, judged from its header row alone.
pub fn detect_kind(content: &str) -> Result<SourceKind, ParserError> {
    let mut reader = open_reader(content);
    let headers = HeaderIndex::from_record(reader.headers()?);
    kind_for(&headers)
}

/// Picks the layout whose columns are all present. Sales wins when a header
/// carries both.
fn kind_for(headers: &HeaderIndex) -> Result<SourceKind, ParserError> {
    let sales_missing = headers.missing(required_columns(SourceKind::Sales));
    if sales_missing.is_empty() {
        return Ok(SourceKind::Sales);
    }
    let production_missing = headers.missing(required_columns(SourceKind::Production));
    if production_missing.is_empty() {
        return Ok(SourceKind::Production);
    }
    Err(ParserError::UnrecognizedLayout {
        sales_missing,
        production_missing,
    })
}

/// Detects the file layout from its header row and parses it.
pub fn parse_source_file(content: &str) -> Result<SourceFile, ParserError> {
    let mut reader = open_reader(content);
    let headers = HeaderIndex::from_record(reader.headers()?);
    let kind = kind_for(&headers)?;
    parse_records(kind, reader, &headers)
}

/// Parses `content` as the given layout, failing on any missing column.
pub fn parse_as(kind: SourceKind, content: &str) -> Result<SourceFile, ParserError> {
    let mut reader = open_reader(content);
    let headers = HeaderIndex::from_record(reader.headers()?);
    parse_records(kind, reader, &headers)
}

fn parse_records(
    kind: SourceKind,
    reader: csv::Reader<&[u8]>,
    headers: &HeaderIndex,
) -> Result<SourceFile, ParserError> {
    match kind {
        SourceKind::Sales => sales::parse_records(reader, headers),
        SourceKind::Production => production::parse_records(reader, headers),
    }
}
