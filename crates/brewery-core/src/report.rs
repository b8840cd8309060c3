use polars::prelude::*;
use thiserror::Error;

use crate::aggregate::{ProductionSummaryRow, SalesSummaryRow};
use crate::db::DbPool;
use crate::materialize::{
    PRODUCTION_SUMMARY_TABLE, PROFITABILITY_SUMMARY_TABLE, SALES_SUMMARY_TABLE,
};
use crate::profitability::ProfitabilityRow;
use crate::readiness::{list_tables, missing_tables};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(
        "summary table(s) missing: {}; run the transform task first",
        .missing.join(", ")
    )]
    MissingSummaries { missing: Vec<String> },

    #[error("failed to read summary tables: {0}")]
    Query(#[from] sqlx::Error),

    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// The three summary tables as last materialized.
#[derive(Debug, Clone, Default)]
pub struct SummarySnapshot {
    pub sales: Vec<SalesSummaryRow>,
    pub production: Vec<ProductionSummaryRow>,
    pub profitability: Vec<ProfitabilityRow>,
}

/// Per-product rollups shown under the summary tables.
#[derive(Debug, Clone)]
pub struct ProductRollups {
    pub revenue_by_product: DataFrame,
    pub efficiency_by_product: DataFrame,
    pub profit_by_product: DataFrame,
}

pub async fn load_snapshot(pool: &DbPool) -> Result<SummarySnapshot, ReportError> {
    let present = list_tables(pool).await?;
    let missing = missing_tables(
        &present,
        &[
            SALES_SUMMARY_TABLE,
            PRODUCTION_SUMMARY_TABLE,
            PROFITABILITY_SUMMARY_TABLE,
        ],
    );
    if !missing.is_empty() {
        return Err(ReportError::MissingSummaries { missing });
    }

    let sales = sqlx::query_as::<_, SalesSummaryRow>(
        r#"
            SELECT product, region, total_units_sold, total_revenue
            FROM sales_summary
            ORDER BY product, region
        "#,
    )
    .fetch_all(pool)
    .await?;

    let production = sqlx::query_as::<_, ProductionSummaryRow>(
        r#"
            SELECT product, total_units_produced, total_spoiled, avg_efficiency, avg_cost_per_unit
            FROM production_summary
            ORDER BY product
        "#,
    )
    .fetch_all(pool)
    .await?;

    let profitability = sqlx::query_as::<_, ProfitabilityRow>(
        r#"
            SELECT
                product,
                region,
                total_units_sold,
                total_revenue,
                total_units_produced,
                total_spoiled,
                avg_efficiency,
                avg_cost_per_unit,
                total_cost,
                profit
            FROM profitability_summary
            ORDER BY product, region
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(SummarySnapshot {
        sales,
        production,
        profitability,
    })
}

pub fn sales_frame(rows: &[SalesSummaryRow]) -> PolarsResult<DataFrame> {
    df![
        "product" => rows.iter().map(|row| row.product.clone()).collect::<Vec<_>>(),
        "region" => rows.iter().map(|row| row.region.clone()).collect::<Vec<_>>(),
        "total_units_sold" => rows.iter().map(|row| row.total_units_sold).collect::<Vec<_>>(),
        "total_revenue" => rows.iter().map(|row| row.total_revenue).collect::<Vec<_>>(),
    ]
}

pub fn production_frame(rows: &[ProductionSummaryRow]) -> PolarsResult<DataFrame> {
    df![
        "product" => rows.iter().map(|row| row.product.clone()).collect::<Vec<_>>(),
        "total_units_produced" => rows.iter().map(|row| row.total_units_produced).collect::<Vec<_>>(),
        "total_spoiled" => rows.iter().map(|row| row.total_spoiled).collect::<Vec<_>>(),
        "avg_efficiency" => rows.iter().map(|row| row.avg_efficiency).collect::<Vec<_>>(),
        "avg_cost_per_unit" => rows.iter().map(|row| row.avg_cost_per_unit).collect::<Vec<_>>(),
    ]
}

pub fn profitability_frame(rows: &[ProfitabilityRow]) -> PolarsResult<DataFrame> {
    df![
        "product" => rows.iter().map(|row| row.product.clone()).collect::<Vec<_>>(),
        "region" => rows.iter().map(|row| row.region.clone()).collect::<Vec<_>>(),
        "total_units_sold" => rows.iter().map(|row| row.total_units_sold).collect::<Vec<_>>(),
        "total_revenue" => rows.iter().map(|row| row.total_revenue).collect::<Vec<_>>(),
        "total_units_produced" => rows.iter().map(|row| row.total_units_produced).collect::<Vec<_>>(),
        "total_spoiled" => rows.iter().map(|row| row.total_spoiled).collect::<Vec<_>>(),
        "avg_efficiency" => rows.iter().map(|row| row.avg_efficiency).collect::<Vec<_>>(),
        "avg_cost_per_unit" => rows.iter().map(|row| row.avg_cost_per_unit).collect::<Vec<_>>(),
        "total_cost" => rows.iter().map(|row| row.total_cost).collect::<Vec<_>>(),
        "profit" => rows.iter().map(|row| row.profit).collect::<Vec<_>>(),
    ]
}

fn rollup_by_product(
    frame: &DataFrame,
    value: &str,
    aggregate: Expr,
) -> Result<DataFrame, ReportError> {
    let rolled = frame
        .clone()
        .lazy()
        .group_by([col("product")])
        .agg([aggregate.alias(value)])
        .sort(["product"], SortMultipleOptions::default())
        .collect()?;
    Ok(rolled)
}

pub fn rollups(snapshot: &SummarySnapshot) -> Result<ProductRollups, ReportError> {
    let sales = sales_frame(&snapshot.sales)?;
    let production = production_frame(&snapshot.production)?;
    let profitability = profitability_frame(&snapshot.profitability)?;

    Ok(ProductRollups {
        revenue_by_product: rollup_by_product(
            &sales,
            "total_revenue",
            col("total_revenue").sum(),
        )?,
        efficiency_by_product: rollup_by_product(
            &production,
            "avg_efficiency",
            col("avg_efficiency").mean(),
        )?,
        profit_by_product: rollup_by_product(&profitability, "profit", col("profit").sum())?,
    })
}
