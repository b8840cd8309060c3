use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::aggregate::{ProductionSummaryRow, SalesSummaryRow};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ProfitabilityRow {
    pub product: String,
    pub region: String,
    pub total_units_sold: i64,
    pub total_revenue: f64,
    pub total_units_produced: i64,
    pub total_spoiled: i64,
    pub avg_efficiency: Option<f64>,
    pub avg_cost_per_unit: Option<f64>,
    pub total_cost: Option<f64>,
    pub profit: Option<f64>,
}

/// Left-joins sales onto production by product. Every sales row survives.
///
/// Fill policy for rows without a usable production match:
/// produced and spoiled become 0, the unit cost becomes `global_cost_mean`
/// (never zero), and efficiency stays undefined. Cost and profit are only
/// undefined when no cost exists anywhere in the run.
pub fn compose(
    sales_summary: &[SalesSummaryRow],
    production_summary: &[ProductionSummaryRow],
    global_cost_mean: Option<f64>,
) -> Vec<ProfitabilityRow> {
    let by_product: HashMap<&str, &ProductionSummaryRow> = production_summary
        .iter()
        .map(|row| (row.product.as_str(), row))
        .collect();

    if global_cost_mean.is_none() {
        warn!("no parseable cost_per_unit in production data; unmatched cost and profit left empty");
    }

    sales_summary
        .iter()
        .map(|sales| {
            let matched = by_product.get(sales.product.as_str()).copied();

            let total_revenue = if sales.total_revenue.is_finite() {
                sales.total_revenue
            } else {
                0.0
            };
            let total_units_produced = matched.map_or(0, |row| row.total_units_produced);
            let total_spoiled = matched.map_or(0, |row| row.total_spoiled);
            let avg_efficiency = matched.and_then(|row| row.avg_efficiency);
            let avg_cost_per_unit = matched
                .and_then(|row| row.avg_cost_per_unit)
                .or(global_cost_mean);

            let total_cost = avg_cost_per_unit.map(|cost| total_units_produced as f64 * cost);
            let profit = total_cost.map(|cost| total_revenue - cost);

            ProfitabilityRow {
                product: sales.product.clone(),
                region: sales.region.clone(),
                total_units_sold: sales.total_units_sold,
                total_revenue,
                total_units_produced,
                total_spoiled,
                avg_efficiency,
                avg_cost_per_unit,
                total_cost,
                profit,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales(product: &str, region: &str, units: i64, revenue: f64) -> SalesSummaryRow {
        SalesSummaryRow {
            product: product.into(),
            region: region.into(),
            total_units_sold: units,
            total_revenue: revenue,
        }
    }

    fn production(product: &str, produced: i64, cost: Option<f64>) -> ProductionSummaryRow {
        ProductionSummaryRow {
            product: product.into(),
            total_units_produced: produced,
            total_spoiled: 10,
            avg_efficiency: Some(0.9),
            avg_cost_per_unit: cost,
        }
    }

    #[test]
    fn matched_rows_use_product_cost() {
        let rows = compose(
            &[sales("IPA", "North", 100, 250.0)],
            &[production("IPA", 300, Some(1.25))],
            Some(2.0),
        );

        let ipa = &rows[0];
        assert_eq!(ipa.total_units_produced, 300);
        assert_eq!(ipa.total_spoiled, 10);
        assert_eq!(ipa.avg_efficiency, Some(0.9));
        assert_eq!(ipa.avg_cost_per_unit, Some(1.25));
        assert_eq!(ipa.total_cost, Some(375.0));
        assert_eq!(ipa.profit, Some(-125.0));
    }

    #[test]
    fn unmatched_product_falls_back_to_global_mean() {
        let rows = compose(
            &[sales("Lager", "East", 80, 176.0)],
            &[production("IPA", 300, Some(1.25))],
            Some(1.4166),
        );

        let lager = &rows[0];
        assert_eq!(lager.avg_cost_per_unit, Some(1.4166));
        assert_eq!(lager.total_units_produced, 0);
        assert_eq!(lager.total_spoiled, 0);
        assert_eq!(lager.avg_efficiency, None);
        assert_eq!(lager.total_cost, Some(0.0));
        assert_eq!(lager.profit, Some(176.0));
    }

    #[test]
    fn matched_product_without_cost_uses_global_mean() {
        let rows = compose(
            &[sales("Stout", "North", 50, 124.0)],
            &[production("Stout", 80, None)],
            Some(1.5),
        );
        assert_eq!(rows[0].avg_cost_per_unit, Some(1.5));
        assert_eq!(rows[0].total_cost, Some(120.0));
        assert_eq!(rows[0].profit, Some(4.0));
    }

    #[test]
    fn every_sales_row_is_preserved() {
        let summary = vec![
            sales("IPA", "North", 100, 250.0),
            sales("IPA", "South", 50, 137.5),
            sales("Lager", "East", 80, 176.0),
        ];
        let rows = compose(&summary, &[production("IPA", 300, Some(1.25))], None);

        let keys: Vec<_> = rows
            .iter()
            .map(|row| (row.product.as_str(), row.region.as_str()))
            .collect();
        assert_eq!(keys, vec![("IPA", "North"), ("IPA", "South"), ("Lager", "East")]);
        assert_eq!(rows[2].avg_cost_per_unit, None);
        assert_eq!(rows[2].profit, None);
    }

    #[test]
    fn non_finite_revenue_is_filled_with_zero() {
        let rows = compose(&[sales("IPA", "North", 1, f64::NAN)], &[], Some(1.0));
        assert_eq!(rows[0].total_revenue, 0.0);
        assert_eq!(rows[0].profit, Some(0.0));
    }
}
