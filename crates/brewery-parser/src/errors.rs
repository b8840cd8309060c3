use thiserror::Error;

use crate::model::SourceKind;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{kind} file is missing required column(s): {}", .missing.join(", "))]
    MissingColumns {
        kind: SourceKind,
        missing: Vec<&'static str>,
    },

    #[error(
        "header row matches neither layout (sales is missing {}; production is missing {})",
        .sales_missing.join(", "),
        .production_missing.join(", ")
    )]
    UnrecognizedLayout {
        sales_missing: Vec<&'static str>,
        production_missing: Vec<&'static str>,
    },

    #[error("{kind} data row {row_index} column '{column}' invalid: {message}")]
    DataRow {
        kind: SourceKind,
        row_index: usize,
        column: &'static str,
        message: String,
    },

    #[error("{kind} file did not contain any data rows")]
    EmptyData { kind: SourceKind },
}
