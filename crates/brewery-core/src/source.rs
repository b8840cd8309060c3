use brewery_parser::{RawProductionRow, RawSalesRow};
use chrono::NaiveDate;
use sqlx::Row;
use tracing::info;

use crate::db::DbPool;
use crate::error::{Result, TransformError};
use crate::normalize::{normalize_optional_text, CurrencyValue};

pub const SALES_TABLE: &str = "sales_data";
pub const PRODUCTION_TABLE: &str = "production_data";
pub const REQUIRED_SOURCE_TABLES: [&str; 2] = [SALES_TABLE, PRODUCTION_TABLE];

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: Option<NaiveDate>,
    pub product: String,
    pub region: String,
    pub units_sold: Option<i64>,
    pub price_per_unit: CurrencyValue,
}

impl SalesRecord {
    pub fn new(
        date: Option<NaiveDate>,
        product: impl Into<String>,
        region: impl Into<String>,
        units_sold: Option<i64>,
        price_per_unit: Option<&str>,
    ) -> Self {
        Self {
            date,
            product: product.into(),
            region: region.into(),
            units_sold,
            price_per_unit: normalize_optional_text(price_per_unit),
        }
    }

    /// `units_sold * price_per_unit`, undefined when either side is missing.
    pub fn revenue(&self) -> Option<f64> {
        let units = self.units_sold?;
        let price = self.price_per_unit.numeric()?;
        Some(units as f64 * price)
    }
}

impl From<&RawSalesRow> for SalesRecord {
    fn from(row: &RawSalesRow) -> Self {
        SalesRecord::new(
            row.date,
            row.product.clone(),
            row.region.clone(),
            row.units_sold,
            row.price_per_unit.as_deref(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRecord {
    pub date: Option<NaiveDate>,
    pub product: String,
    pub units_produced: Option<i64>,
    pub spoiled_units: Option<i64>,
    pub cost_per_unit: CurrencyValue,
}

impl ProductionRecord {
    pub fn new(
        date: Option<NaiveDate>,
        product: impl Into<String>,
        units_produced: Option<i64>,
        spoiled_units: Option<i64>,
        cost_per_unit: Option<&str>,
    ) -> Self {
        Self {
            date,
            product: product.into(),
            units_produced,
            spoiled_units,
            cost_per_unit: normalize_optional_text(cost_per_unit),
        }
    }

    /// Fraction of produced units that were not spoiled. Undefined (not zero)
    /// when nothing was produced or either count is missing.
    pub fn efficiency(&self) -> Option<f64> {
        let produced = self.units_produced?;
        let spoiled = self.spoiled_units?;
        if produced == 0 {
            return None;
        }
        Some((produced - spoiled) as f64 / produced as f64)
    }

    /// True when the row breaks `0 <= spoiled <= produced`.
    pub fn violates_spoilage_bound(&self) -> bool {
        match (self.units_produced, self.spoiled_units) {
            (Some(produced), Some(spoiled)) => spoiled < 0 || spoiled > produced,
            (None, Some(spoiled)) => spoiled < 0,
            _ => false,
        }
    }
}

impl From<&RawProductionRow> for ProductionRecord {
    fn from(row: &RawProductionRow) -> Self {
        ProductionRecord::new(
            row.date,
            row.product.clone(),
            row.units_produced,
            row.spoiled_units,
            row.cost_per_unit.as_deref(),
        )
    }
}

/// Reads `sales_data`, normalizing prices as rows arrive. Prices are selected as
/// text so numeric and currency-string storage both work.
pub async fn fetch_sales_records(pool: &DbPool) -> Result<Vec<SalesRecord>> {
    let rows = sqlx::query(
        r#"
            SELECT
                date::text AS date,
                product,
                region,
                units_sold::bigint AS units_sold,
                price_per_unit::text AS price_per_unit
            FROM sales_data
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|source| read_error(SALES_TABLE, source))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let date: Option<String> = row.try_get("date").map_err(|e| read_error(SALES_TABLE, e))?;
        let product: Option<String> = row
            .try_get("product")
            .map_err(|e| read_error(SALES_TABLE, e))?;
        let region: Option<String> = row
            .try_get("region")
            .map_err(|e| read_error(SALES_TABLE, e))?;
        let units_sold: Option<i64> = row
            .try_get("units_sold")
            .map_err(|e| read_error(SALES_TABLE, e))?;
        let price: Option<String> = row
            .try_get("price_per_unit")
            .map_err(|e| read_error(SALES_TABLE, e))?;

        records.push(SalesRecord::new(
            parse_source_date(date.as_deref()),
            product.unwrap_or_default(),
            region.unwrap_or_default(),
            units_sold,
            price.as_deref(),
        ));
    }

    info!(rows = records.len(), table = SALES_TABLE, "loaded source rows");
    Ok(records)
}

pub async fn fetch_production_records(pool: &DbPool) -> Result<Vec<ProductionRecord>> {
    let rows = sqlx::query(
        r#"
            SELECT
                date::text AS date,
                product,
                units_produced::bigint AS units_produced,
                spoiled_units::bigint AS spoiled_units,
                cost_per_unit::text AS cost_per_unit
            FROM production_data
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|source| read_error(PRODUCTION_TABLE, source))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let date: Option<String> = row
            .try_get("date")
            .map_err(|e| read_error(PRODUCTION_TABLE, e))?;
        let product: Option<String> = row
            .try_get("product")
            .map_err(|e| read_error(PRODUCTION_TABLE, e))?;
        let units_produced: Option<i64> = row
            .try_get("units_produced")
            .map_err(|e| read_error(PRODUCTION_TABLE, e))?;
        let spoiled_units: Option<i64> = row
            .try_get("spoiled_units")
            .map_err(|e| read_error(PRODUCTION_TABLE, e))?;
        let cost: Option<String> = row
            .try_get("cost_per_unit")
            .map_err(|e| read_error(PRODUCTION_TABLE, e))?;

        records.push(ProductionRecord::new(
            parse_source_date(date.as_deref()),
            product.unwrap_or_default(),
            units_produced,
            spoiled_units,
            cost.as_deref(),
        ));
    }

    info!(rows = records.len(), table = PRODUCTION_TABLE, "loaded source rows");
    Ok(records)
}

/// Dates are informational only; anything that is not ISO-8601 is dropped.
fn parse_source_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok())
}

fn read_error(table: &'static str, source: sqlx::Error) -> TransformError {
    TransformError::SourceRead { table, source }
}
