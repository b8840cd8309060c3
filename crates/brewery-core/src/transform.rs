use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{
    aggregate_production, aggregate_sales, global_cost_mean, ProductionSummaryRow,
    SalesSummaryRow,
};
use crate::db::{self, DbPool, RetryPolicy};
use crate::error::Result;
use crate::materialize::replace_table;
use crate::profitability::{compose, ProfitabilityRow};
use crate::readiness::verify_tables;
use crate::source::{
    fetch_production_records, fetch_sales_records, ProductionRecord, SalesRecord,
};

/// Everything one run derives from the source rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTables {
    pub sales_summary: Vec<SalesSummaryRow>,
    pub production_summary: Vec<ProductionSummaryRow>,
    pub profitability: Vec<ProfitabilityRow>,
    pub global_cost_mean: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub sales_rows: usize,
    pub production_rows: usize,
    pub unparseable_prices: usize,
    pub unparseable_costs: usize,
    pub zero_production_rows: usize,
    pub spoilage_violations: usize,
}

impl SourceStats {
    pub fn collect(sales: &[SalesRecord], production: &[ProductionRecord]) -> Self {
        Self {
            sales_rows: sales.len(),
            production_rows: production.len(),
            unparseable_prices: sales
                .iter()
                .filter(|record| record.price_per_unit.is_unparseable())
                .count(),
            unparseable_costs: production
                .iter()
                .filter(|record| record.cost_per_unit.is_unparseable())
                .count(),
            zero_production_rows: production
                .iter()
                .filter(|record| record.units_produced == Some(0))
                .count(),
            spoilage_violations: production
                .iter()
                .filter(|record| record.violates_spoilage_bound())
                .count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableWrite {
    pub table: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformReport {
    pub connect_attempts: u32,
    pub source: SourceStats,
    pub global_cost_mean: Option<f64>,
    pub tables_written: Vec<TableWrite>,
}

/// Aggregates, then composes. Pure; equal inputs give equal tables.
pub fn derive_tables(sales: &[SalesRecord], production: &[ProductionRecord]) -> DerivedTables {
    let sales_summary = aggregate_sales(sales);
    let production_summary = aggregate_production(production);
    let global_cost_mean = global_cost_mean(production);
    let profitability = compose(&sales_summary, &production_summary, global_cost_mean);

    DerivedTables {
        sales_summary,
        production_summary,
        profitability,
        global_cost_mean,
    }
}

/// Full transform: connect, verify, read, derive, then replace all three
/// summary tables. Any error ends the run.
pub async fn run_transform(database_url: &str, policy: RetryPolicy) -> Result<TransformReport> {
    let (pool, attempts) = db::connect(database_url, policy).await.into_result()?;
    let result = transform_with_pool(&pool).await;
    pool.close().await;

    let mut report = result?;
    report.connect_attempts = attempts;
    Ok(report)
}

/// The transform against an already-verified connection. `connect_attempts` is
/// left at zero for the caller to fill in.
pub async fn transform_with_pool(pool: &DbPool) -> Result<TransformReport> {
    verify_tables(pool).await?;

    let sales = fetch_sales_records(pool).await?;
    let production = fetch_production_records(pool).await?;

    let stats = SourceStats::collect(&sales, &production);
    if stats.unparseable_prices > 0 || stats.unparseable_costs > 0 {
        warn!(
            unparseable_prices = stats.unparseable_prices,
            unparseable_costs = stats.unparseable_costs,
            "unparseable currency values excluded from aggregates"
        );
    }

    let derived = derive_tables(&sales, &production);
    info!(
        sales_groups = derived.sales_summary.len(),
        products = derived.production_summary.len(),
        global_cost_mean = ?derived.global_cost_mean,
        "summaries derived"
    );

    let tables_written = materialize_all(pool, &derived).await?;

    Ok(TransformReport {
        connect_attempts: 0,
        source: stats,
        global_cost_mean: derived.global_cost_mean,
        tables_written,
    })
}

async fn materialize_all(pool: &DbPool, derived: &DerivedTables) -> Result<Vec<TableWrite>> {
    let sales_rows = replace_table(pool, &derived.sales_summary).await?;
    let production_rows = replace_table(pool, &derived.production_summary).await?;
    let profitability_rows = replace_table(pool, &derived.profitability).await?;

    Ok(vec![
        TableWrite {
            table: crate::materialize::SALES_SUMMARY_TABLE,
            rows: sales_rows,
        },
        TableWrite {
            table: crate::materialize::PRODUCTION_SUMMARY_TABLE,
            rows: production_rows,
        },
        TableWrite {
            table: crate::materialize::PROFITABILITY_SUMMARY_TABLE,
            rows: profitability_rows,
        },
    ])
}
