use anyhow::{Context, Result};
use brewery_core::report::{load_snapshot, rollups, ProductRollups, SummarySnapshot};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use polars::prelude::*;
use tracing::info;

pub async fn run() -> Result<()> {
    let pool = super::connect().await?;
    let snapshot = load_snapshot(&pool).await?;
    pool.close().await;

    let rollups = rollups(&snapshot).context("failed to compute product rollups")?;
    info!(
        sales_rows = snapshot.sales.len(),
        production_rows = snapshot.production.len(),
        profitability_rows = snapshot.profitability.len(),
        "summary tables loaded"
    );

    print!("{}", render(&snapshot, &rollups)?);
    Ok(())
}

fn render(snapshot: &SummarySnapshot, rollups: &ProductRollups) -> Result<String> {
    let mut out = String::new();
    for (title, table) in [
        ("Sales summary", sales_table(snapshot)),
        ("Production summary", production_table(snapshot)),
        ("Profitability summary", profitability_table(snapshot)),
        (
            "Revenue by product",
            rollup_table(&rollups.revenue_by_product, "total_revenue", amount)?,
        ),
        (
            "Efficiency by product",
            rollup_table(&rollups.efficiency_by_product, "avg_efficiency", ratio)?,
        ),
        (
            "Profit by product",
            rollup_table(&rollups.profit_by_product, "profit", amount)?,
        ),
    ] {
        out.push_str(&format!("{title}\n{table}\n\n"));
    }
    Ok(out)
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn sales_table(snapshot: &SummarySnapshot) -> Table {
    let mut table = new_table(&["product", "region", "total_units_sold", "total_revenue"]);
    for row in &snapshot.sales {
        table.add_row(vec![
            row.product.clone(),
            row.region.clone(),
            row.total_units_sold.to_string(),
            amount(Some(row.total_revenue)),
        ]);
    }
    table
}

fn production_table(snapshot: &SummarySnapshot) -> Table {
    let mut table = new_table(&[
        "product",
        "total_units_produced",
        "total_spoiled",
        "avg_efficiency",
        "avg_cost_per_unit",
    ]);
    for row in &snapshot.production {
        table.add_row(vec![
            row.product.clone(),
            row.total_units_produced.to_string(),
            row.total_spoiled.to_string(),
            ratio(row.avg_efficiency),
            amount(row.avg_cost_per_unit),
        ]);
    }
    table
}

fn profitability_table(snapshot: &SummarySnapshot) -> Table {
    let mut table = new_table(&[
        "product",
        "region",
        "units_sold",
        "revenue",
        "units_produced",
        "spoiled",
        "efficiency",
        "cost_per_unit",
        "total_cost",
        "profit",
    ]);
    for row in &snapshot.profitability {
        table.add_row(vec![
            row.product.clone(),
            row.region.clone(),
            row.total_units_sold.to_string(),
            amount(Some(row.total_revenue)),
            row.total_units_produced.to_string(),
            row.total_spoiled.to_string(),
            ratio(row.avg_efficiency),
            amount(row.avg_cost_per_unit),
            amount(row.total_cost),
            amount(row.profit),
        ]);
    }
    table
}

fn rollup_table(frame: &DataFrame, value: &str, format: fn(Option<f64>) -> String) -> Result<Table> {
    let products = frame.column("product")?.as_materialized_series().str()?;
    let values = frame.column(value)?.as_materialized_series().f64()?;

    let mut table = new_table(&["product", value]);
    for (product, cell) in products.into_iter().zip(values.into_iter()) {
        table.add_row(vec![product.unwrap_or_default().to_string(), format(cell)]);
    }
    Ok(table)
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| format!("{v:.2}"))
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "NULL".to_string(), |v| format!("{v:.4}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewery_core::aggregate::{ProductionSummaryRow, SalesSummaryRow};
    use brewery_core::profitability::ProfitabilityRow;

    fn snapshot() -> SummarySnapshot {
        SummarySnapshot {
            sales: vec![
                SalesSummaryRow {
                    product: "IPA".into(),
                    region: "North".into(),
                    total_units_sold: 100,
                    total_revenue: 250.0,
                },
                SalesSummaryRow {
                    product: "Lager".into(),
                    region: "East".into(),
                    total_units_sold: 80,
                    total_revenue: 176.0,
                },
            ],
            production: vec![ProductionSummaryRow {
                product: "IPA".into(),
                total_units_produced: 100,
                total_spoiled: 10,
                avg_efficiency: Some(0.9),
                avg_cost_per_unit: Some(1.2),
            }],
            profitability: vec![
                ProfitabilityRow {
                    product: "IPA".into(),
                    region: "North".into(),
                    total_units_sold: 100,
                    total_revenue: 250.0,
                    total_units_produced: 100,
                    total_spoiled: 10,
                    avg_efficiency: Some(0.9),
                    avg_cost_per_unit: Some(1.2),
                    total_cost: Some(120.0),
                    profit: Some(130.0),
                },
                ProfitabilityRow {
                    product: "Lager".into(),
                    region: "East".into(),
                    total_units_sold: 80,
                    total_revenue: 176.0,
                    total_units_produced: 0,
                    total_spoiled: 0,
                    avg_efficiency: None,
                    avg_cost_per_unit: Some(1.2),
                    total_cost: Some(0.0),
                    profit: Some(176.0),
                },
            ],
        }
    }

    #[test]
    fn formats_missing_values_as_null() {
        assert_eq!(amount(None), "NULL");
        assert_eq!(amount(Some(137.5)), "137.50");
        assert_eq!(ratio(Some(0.925)), "0.9250");
        assert_eq!(ratio(None), "NULL");
    }

    #[test]
    fn renders_every_section() {
        let snapshot = snapshot();
        let rollups = rollups(&snapshot).unwrap();
        let rendered = render(&snapshot, &rollups).unwrap();

        for title in [
            "Sales summary",
            "Production summary",
            "Profitability summary",
            "Revenue by product",
            "Efficiency by product",
            "Profit by product",
        ] {
            assert!(rendered.contains(title), "missing section {title}");
        }
        assert!(rendered.contains("250.00"));
        assert!(rendered.contains("176.00"));
        assert!(rendered.contains("0.9000"));
    }
}
