use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which source relation a flat file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sales,
    Production,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Sales => "sales",
            SourceKind::Production => "production",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            SourceKind::Sales => "sales_data",
            SourceKind::Production => "production_data",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a sales flat file. Prices stay as raw text so currency-formatted
/// values reach the store untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSalesRow {
    pub date: Option<NaiveDate>,
    pub product: String,
    pub region: String,
    pub units_sold: Option<i64>,
    pub price_per_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProductionRow {
    pub date: Option<NaiveDate>,
    pub product: String,
    pub units_produced: Option<i64>,
    pub spoiled_units: Option<i64>,
    pub cost_per_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceFile {
    Sales(Vec<RawSalesRow>),
    Production(Vec<RawProductionRow>),
}

impl SourceFile {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceFile::Sales(_) => SourceKind::Sales,
            SourceFile::Production(_) => SourceKind::Production,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceFile::Sales(rows) => rows.len(),
            SourceFile::Production(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
