use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use tracing::info;

use crate::aggregate::{ProductionSummaryRow, SalesSummaryRow};
use crate::db::DbPool;
use crate::profitability::ProfitabilityRow;

pub const SALES_SUMMARY_TABLE: &str = "sales_summary";
pub const PRODUCTION_SUMMARY_TABLE: &str = "production_summary";
pub const PROFITABILITY_SUMMARY_TABLE: &str = "profitability_summary";

/// Keeps each INSERT well under the Postgres bind-parameter limit.
const INSERT_BATCH_ROWS: usize = 500;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to write derived table {table}: {source}")]
    Write {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str) -> ColumnSpec {
    ColumnSpec { name, sql_type }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    Double(Option<f64>),
}

/// A row type that owns a fully-refreshed table.
pub trait DerivedTable {
    const TABLE_NAME: &'static str;
    const COLUMNS: &'static [ColumnSpec];

    /// Values in `COLUMNS` order.
    fn values(&self) -> Vec<SqlValue>;
}

impl DerivedTable for SalesSummaryRow {
    const TABLE_NAME: &'static str = SALES_SUMMARY_TABLE;
    const COLUMNS: &'static [ColumnSpec] = &[
        column("product", "TEXT NOT NULL"),
        column("region", "TEXT NOT NULL"),
        column("total_units_sold", "BIGINT NOT NULL"),
        column("total_revenue", "DOUBLE PRECISION NOT NULL"),
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.product.clone()),
            SqlValue::Text(self.region.clone()),
            SqlValue::BigInt(self.total_units_sold),
            SqlValue::Double(Some(self.total_revenue)),
        ]
    }
}

impl DerivedTable for ProductionSummaryRow {
    const TABLE_NAME: &'static str = PRODUCTION_SUMMARY_TABLE;
    const COLUMNS: &'static [ColumnSpec] = &[
        column("product", "TEXT NOT NULL"),
        column("total_units_produced", "BIGINT NOT NULL"),
        column("total_spoiled", "BIGINT NOT NULL"),
        column("avg_efficiency", "DOUBLE PRECISION"),
        column("avg_cost_per_unit", "DOUBLE PRECISION"),
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.product.clone()),
            SqlValue::BigInt(self.total_units_produced),
            SqlValue::BigInt(self.total_spoiled),
            SqlValue::Double(self.avg_efficiency),
            SqlValue::Double(self.avg_cost_per_unit),
        ]
    }
}

impl DerivedTable for ProfitabilityRow {
    const TABLE_NAME: &'static str = PROFITABILITY_SUMMARY_TABLE;
    const COLUMNS: &'static [ColumnSpec] = &[
        column("product", "TEXT NOT NULL"),
        column("region", "TEXT NOT NULL"),
        column("total_units_sold", "BIGINT NOT NULL"),
        column("total_revenue", "DOUBLE PRECISION NOT NULL"),
        column("total_units_produced", "BIGINT NOT NULL"),
        column("total_spoiled", "BIGINT NOT NULL"),
        column("avg_efficiency", "DOUBLE PRECISION"),
        column("avg_cost_per_unit", "DOUBLE PRECISION"),
        column("total_cost", "DOUBLE PRECISION"),
        column("profit", "DOUBLE PRECISION"),
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.product.clone()),
            SqlValue::Text(self.region.clone()),
            SqlValue::BigInt(self.total_units_sold),
            SqlValue::Double(Some(self.total_revenue)),
            SqlValue::BigInt(self.total_units_produced),
            SqlValue::BigInt(self.total_spoiled),
            SqlValue::Double(self.avg_efficiency),
            SqlValue::Double(self.avg_cost_per_unit),
            SqlValue::Double(self.total_cost),
            SqlValue::Double(self.profit),
        ]
    }
}

/// Replaces the contents of `T::TABLE_NAME` with `rows`.
///
/// Rows are written to a staging table which is renamed over the target in the
/// same transaction, so readers see either the previous snapshot or the new one.
/// Returns the number of rows written.
pub async fn replace_table<T: DerivedTable>(
    pool: &DbPool,
    rows: &[T],
) -> Result<usize, MaterializeError> {
    let table = T::TABLE_NAME;
    let staging = staging_name(table);

    let mut tx = pool.begin().await.map_err(write_error(table))?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(&staging)))
        .execute(tx.as_mut())
        .await
        .map_err(write_error(table))?;
    sqlx::query(&create_table_sql(&staging, T::COLUMNS))
        .execute(tx.as_mut())
        .await
        .map_err(write_error(table))?;

    let insert_prefix = insert_prefix_sql(&staging, T::COLUMNS);
    for chunk in rows.chunks(INSERT_BATCH_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(&insert_prefix);
        builder.push_values(chunk, |mut separated, row| {
            for value in row.values() {
                match value {
                    SqlValue::Text(text) => {
                        separated.push_bind(text);
                    }
                    SqlValue::BigInt(number) => {
                        separated.push_bind(number);
                    }
                    SqlValue::Double(number) => {
                        separated.push_bind(number);
                    }
                }
            }
        });
        builder
            .build()
            .execute(tx.as_mut())
            .await
            .map_err(write_error(table))?;
    }

    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
        .execute(tx.as_mut())
        .await
        .map_err(write_error(table))?;
    sqlx::query(&format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_ident(&staging),
        quote_ident(table)
    ))
    .execute(tx.as_mut())
    .await
    .map_err(write_error(table))?;

    tx.commit().await.map_err(write_error(table))?;

    info!(table, rows = rows.len(), "derived table replaced");
    Ok(rows.len())
}

fn write_error(table: &'static str) -> impl Fn(sqlx::Error) -> MaterializeError {
    move |source| MaterializeError::Write { table, source }
}

pub fn staging_name(table: &str) -> String {
    format!("{table}__staging")
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let definitions = columns
        .iter()
        .map(|column| format!("{} {}", quote_ident(column.name), column.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({definitions})", quote_ident(table))
}

fn insert_prefix_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_ident(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({names}) ", quote_ident(table))
}
