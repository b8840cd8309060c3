use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::normalize::{mean_of_numeric, CurrencyValue};
use crate::source::{ProductionRecord, SalesRecord};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SalesSummaryRow {
    pub product: String,
    pub region: String,
    pub total_units_sold: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ProductionSummaryRow {
    pub product: String,
    pub total_units_produced: i64,
    pub total_spoiled: i64,
    pub avg_efficiency: Option<f64>,
    pub avg_cost_per_unit: Option<f64>,
}

#[derive(Default)]
struct SalesAccumulator {
    units: i64,
    revenue: f64,
}

#[derive(Default)]
struct ProductionAccumulator {
    produced: i64,
    spoiled: i64,
    efficiency_sum: f64,
    efficiency_count: usize,
    costs: Vec<CurrencyValue>,
}

/// One row per distinct (product, region), ordered by key. Missing units and
/// unpriced rows contribute nothing to the sums.
pub fn aggregate_sales(sales: &[SalesRecord]) -> Vec<SalesSummaryRow> {
    let mut groups: BTreeMap<(&str, &str), SalesAccumulator> = BTreeMap::new();

    for record in sales {
        let acc = groups
            .entry((record.product.as_str(), record.region.as_str()))
            .or_default();
        if let Some(units) = record.units_sold {
            acc.units += units;
        }
        if let Some(revenue) = record.revenue() {
            acc.revenue += revenue;
        }
    }

    groups
        .into_iter()
        .map(|((product, region), acc)| SalesSummaryRow {
            product: product.to_string(),
            region: region.to_string(),
            total_units_sold: acc.units,
            total_revenue: acc.revenue,
        })
        .collect()
}

/// One row per product. Efficiency is averaged over rows where it is defined
/// and cost over parseable values; either mean is `None` when it has no inputs.
pub fn aggregate_production(production: &[ProductionRecord]) -> Vec<ProductionSummaryRow> {
    let mut groups: BTreeMap<&str, ProductionAccumulator> = BTreeMap::new();

    for record in production {
        if record.violates_spoilage_bound() {
            warn!(
                product = %record.product,
                units_produced = ?record.units_produced,
                spoiled_units = ?record.spoiled_units,
                "production row breaks 0 <= spoiled <= produced"
            );
        }

        let acc = groups.entry(record.product.as_str()).or_default();
        acc.produced += record.units_produced.unwrap_or(0);
        acc.spoiled += record.spoiled_units.unwrap_or(0);
        if let Some(efficiency) = record.efficiency() {
            acc.efficiency_sum += efficiency;
            acc.efficiency_count += 1;
        }
        acc.costs.push(record.cost_per_unit);
    }

    groups
        .into_iter()
        .map(|(product, acc)| ProductionSummaryRow {
            product: product.to_string(),
            total_units_produced: acc.produced,
            total_spoiled: acc.spoiled,
            avg_efficiency: (acc.efficiency_count > 0)
                .then(|| acc.efficiency_sum / acc.efficiency_count as f64),
            avg_cost_per_unit: mean_of_numeric(acc.costs),
        })
        .collect()
}

/// Mean of every parseable `cost_per_unit` across all production rows. Used as the
/// join-miss fallback; computed once per run.
pub fn global_cost_mean(production: &[ProductionRecord]) -> Option<f64> {
    mean_of_numeric(production.iter().map(|record| record.cost_per_unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(product: &str, region: &str, units: i64, price: &str) -> SalesRecord {
        SalesRecord::new(None, product, region, Some(units), Some(price))
    }

    fn batch(product: &str, produced: i64, spoiled: i64, cost: &str) -> ProductionRecord {
        ProductionRecord::new(None, product, Some(produced), Some(spoiled), Some(cost))
    }

    #[test]
    fn sums_units_and_revenue_per_product_region() {
        let rows = aggregate_sales(&[
            sale("IPA", "North", 100, "2.50"),
            sale("IPA", "South", 50, "2.75"),
            sale("IPA", "North", 20, "$2.50"),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region, "North");
        assert_eq!(rows[0].total_units_sold, 120);
        assert!((rows[0].total_revenue - 300.0).abs() < 1e-9);
        assert_eq!(rows[1].region, "South");
        assert!((rows[1].total_revenue - 137.5).abs() < 1e-9);
    }

    #[test]
    fn unparseable_price_keeps_units_but_not_revenue() {
        let rows = aggregate_sales(&[
            sale("Stout", "North", 40, "$3.10"),
            sale("Stout", "North", 10, "n/a"),
        ]);
        assert_eq!(rows[0].total_units_sold, 50);
        assert!((rows[0].total_revenue - 124.0).abs() < 1e-9);
    }

    #[test]
    fn zero_production_rows_are_summed_but_not_averaged() {
        let rows = aggregate_production(&[
            batch("Stout", 80, 4, "$1.75"),
            batch("Stout", 0, 0, "unknown"),
        ]);

        assert_eq!(rows.len(), 1);
        let stout = &rows[0];
        assert_eq!(stout.total_units_produced, 80);
        assert_eq!(stout.total_spoiled, 4);
        assert!((stout.avg_efficiency.unwrap() - 0.95).abs() < 1e-12);
        assert_eq!(stout.avg_cost_per_unit, Some(1.75));
    }

    #[test]
    fn product_without_defined_values_has_undefined_means() {
        let rows = aggregate_production(&[batch("Porter", 0, 0, "tbd")]);
        assert_eq!(rows[0].avg_efficiency, None);
        assert_eq!(rows[0].avg_cost_per_unit, None);
    }

    #[test]
    fn global_mean_spans_all_products() {
        let production = [
            batch("IPA", 100, 10, "$1.20"),
            batch("IPA", 200, 10, "1.30"),
            batch("Stout", 80, 4, "$1.75"),
            batch("Stout", 0, 0, "unknown"),
        ];
        let mean = global_cost_mean(&production).unwrap();
        assert!((mean - (1.20 + 1.30 + 1.75) / 3.0).abs() < 1e-12);
        assert_eq!(global_cost_mean(&[]), None);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(aggregate_sales(&[]).is_empty());
        assert!(aggregate_production(&[]).is_empty());
    }
}
