use std::collections::HashMap;

use chrono::NaiveDate;
use csv::{Reader, ReaderBuilder, StringRecord, Trim};

use crate::errors::ParserError;
use crate::model::SourceKind;

pub(crate) fn open_reader(content: &str) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes())
}

/// Column positions keyed by lower-cased header name.
#[derive(Debug, Clone)]
pub(crate) struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_record(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase(), idx))
            .collect();
        Self { positions }
    }

    pub fn missing(&self, columns: &[&'static str]) -> Vec<&'static str> {
        columns
            .iter()
            .copied()
            .filter(|column| !self.positions.contains_key(*column))
            .collect()
    }

    /// Returns the positions of `columns` in order, or every absent column.
    pub(crate) fn require<const N: usize>(
        &self,
        kind: SourceKind,
        columns: [&'static str; N],
    ) -> Result<[usize; N], ParserError> {
        let mut positions = [0usize; N];
        let mut missing = Vec::new();
        for (slot, column) in positions.iter_mut().zip(columns) {
            match self.positions.get(column) {
                Some(position) => *slot = *position,
                None => missing.push(column),
            }
        }
        if !missing.is_empty() {
            return Err(ParserError::MissingColumns { kind, missing });
        }
        Ok(positions)
    }
}

fn cell(record: &StringRecord, position: usize) -> &str {
    record.get(position).unwrap_or("").trim()
}

fn is_blank(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

pub(crate) fn required_text(
    kind: SourceKind,
    record: &StringRecord,
    position: usize,
    row_index: usize,
    column: &'static str,
) -> Result<String, ParserError> {
    let value = cell(record, position);
    if is_blank(value) {
        return Err(ParserError::DataRow {
            kind,
            row_index,
            column,
            message: "value is required".to_string(),
        });
    }
    Ok(value.to_string())
}

pub(crate) fn optional_text(record: &StringRecord, position: usize) -> Option<String> {
    let value = cell(record, position);
    if is_blank(value) {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn parse_optional_date(
    kind: SourceKind,
    record: &StringRecord,
    position: usize,
    row_index: usize,
    column: &'static str,
) -> Result<Option<NaiveDate>, ParserError> {
    static FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    let value = cell(record, position);
    if is_blank(value) {
        return Ok(None);
    }
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(Some(date));
        }
    }
    Err(ParserError::DataRow {
        kind,
        row_index,
        column,
        message: format!("invalid date '{value}'"),
    })
}

pub(crate) fn parse_optional_count(
    kind: SourceKind,
    record: &StringRecord,
    position: usize,
    row_index: usize,
    column: &'static str,
) -> Result<Option<i64>, ParserError> {
    let value = cell(record, position);
    if is_blank(value) {
        return Ok(None);
    }
    let parsed = value
        .parse::<i64>()
        .map_err(|err| ParserError::DataRow {
            kind,
            row_index,
            column,
            message: format!("failed to parse '{value}' as integer: {err}"),
        })?;
    if parsed < 0 {
        return Err(ParserError::DataRow {
            kind,
            row_index,
            column,
            message: format!("count must not be negative, found {parsed}"),
        });
    }
    Ok(Some(parsed))
}
