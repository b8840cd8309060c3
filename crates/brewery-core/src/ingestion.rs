use brewery_parser::{RawProductionRow, RawSalesRow, SourceFile, SourceKind};
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder, Transaction};
use thiserror::Error;
use tracing::info;

use crate::db::DbPool;

const INSERT_BATCH_ROWS: usize = 1000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to create source tables: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("failed to append rows to {table}: {source}")]
    Append {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub kind: SourceKind,
    pub table: &'static str,
    pub rows_appended: usize,
}

/// Creates the two source relations when absent. Price and cost are stored as
/// text so currency-formatted input survives until the transform normalizes it.
pub async fn ensure_source_tables(pool: &DbPool) -> Result<(), IngestError> {
    sqlx::query(
        r#"
            CREATE TABLE IF NOT EXISTS sales_data (
                id SERIAL PRIMARY KEY,
                date DATE,
                product VARCHAR(50),
                region VARCHAR(50),
                units_sold INT,
                price_per_unit TEXT
            )
        "#,
    )
    .execute(pool)
    .await
    .map_err(IngestError::Schema)?;

    sqlx::query(
        r#"
            CREATE TABLE IF NOT EXISTS production_data (
                id SERIAL PRIMARY KEY,
                date DATE,
                product VARCHAR(50),
                units_produced INT,
                spoiled_units INT,
                cost_per_unit TEXT
            )
        "#,
    )
    .execute(pool)
    .await
    .map_err(IngestError::Schema)?;

    info!("source tables ready");
    Ok(())
}

/// Appends a parsed flat file to its source table in a single transaction.
pub async fn load_source_file(
    pool: &DbPool,
    file: &SourceFile,
) -> Result<IngestSummary, IngestError> {
    let kind = file.kind();
    let table = kind.table_name();
    let append_error = |source| IngestError::Append { table, source };

    let mut tx = pool.begin().await.map_err(append_error)?;
    match file {
        SourceFile::Sales(rows) => append_sales(&mut tx, rows).await,
        SourceFile::Production(rows) => append_production(&mut tx, rows).await,
    }
    .map_err(append_error)?;
    tx.commit().await.map_err(append_error)?;

    info!(table, rows = file.len(), "appended source rows");
    Ok(IngestSummary {
        kind,
        table,
        rows_appended: file.len(),
    })
}

async fn append_sales(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[RawSalesRow],
) -> Result<(), sqlx::Error> {
    for chunk in rows.chunks(INSERT_BATCH_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO sales_data (date, product, region, units_sold, price_per_unit) ",
        );
        builder.push_values(chunk, |mut separated, row| {
            separated
                .push_bind(row.date)
                .push_bind(row.product.clone())
                .push_bind(row.region.clone())
                .push_bind(row.units_sold)
                .push_bind(row.price_per_unit.clone());
        });
        builder.build().execute(tx.as_mut()).await?;
    }
    Ok(())
}

async fn append_production(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[RawProductionRow],
) -> Result<(), sqlx::Error> {
    for chunk in rows.chunks(INSERT_BATCH_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO production_data (date, product, units_produced, spoiled_units, cost_per_unit) ",
        );
        builder.push_values(chunk, |mut separated, row| {
            separated
                .push_bind(row.date)
                .push_bind(row.product.clone())
                .push_bind(row.units_produced)
                .push_bind(row.spoiled_units)
                .push_bind(row.cost_per_unit.clone());
        });
        builder.build().execute(tx.as_mut()).await?;
    }
    Ok(())
}
