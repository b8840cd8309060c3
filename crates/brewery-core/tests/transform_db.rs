use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use brewery_core::{
    db::{self, DbPool, RetryPolicy},
    error::TransformError,
    ingestion::{ensure_source_tables, load_source_file},
    readiness::{list_tables, ReadinessError},
    report::load_snapshot,
    transform::{run_transform, transform_with_pool},
};
use brewery_parser::parse_source_file;

const DERIVED_TABLES: [&str; 3] = ["sales_summary", "production_summary", "profitability_summary"];

fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../brewery-parser/tests/data")
        .join(name);
    std::fs::read_to_string(path).expect("read fixture")
}

fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 1,
        delay: Duration::ZERO,
    }
}

async fn reset(pool: &DbPool) -> Result<()> {
    for table in [
        "sales_data",
        "production_data",
        "sales_summary",
        "production_summary",
        "profitability_summary",
        "sales_summary__staging",
        "production_summary__staging",
        "profitability_summary__staging",
    ] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

// Both scenarios share one database, so they run in a single test.
#[tokio::test]
async fn transform_round_trip_when_database_available() -> Result<()> {
    let database_url = match env::var("BREWERY_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping transform_db test because BREWERY_TEST_DATABASE_URL is not set");
            return Ok(());
        }
    };

    let (pool, _) = db::connect(&database_url, test_policy()).await.into_result()?;
    reset(&pool).await?;

    // Missing sources: fatal, names the tables, and nothing derived is written.
    match transform_with_pool(&pool).await {
        Err(TransformError::Readiness(ReadinessError::MissingTables { missing })) => {
            assert_eq!(missing, vec!["sales_data", "production_data"]);
        }
        other => bail!("expected missing-table failure, got {other:?}"),
    }
    let present = list_tables(&pool).await?;
    for table in DERIVED_TABLES {
        assert!(!present.contains(table), "{table} should not have been written");
    }

    ensure_source_tables(&pool).await?;
    for name in ["mock_sales_data.csv", "mock_production_data.csv"] {
        let file = parse_source_file(&fixture(name))?;
        load_source_file(&pool, &file).await?;
    }

    let first = run_transform(&database_url, test_policy()).await?;
    assert_eq!(first.connect_attempts, 1);
    assert_eq!(first.source.sales_rows, 6);
    let written: Vec<_> = first.tables_written.iter().map(|write| write.table).collect();
    assert_eq!(written, DERIVED_TABLES);

    let snapshot_one = load_snapshot(&pool).await?;
    run_transform(&database_url, test_policy()).await?;
    let snapshot_two = load_snapshot(&pool).await?;

    assert_eq!(snapshot_one.sales, snapshot_two.sales);
    assert_eq!(snapshot_one.production, snapshot_two.production);
    assert_eq!(snapshot_one.profitability, snapshot_two.profitability);
    assert_eq!(snapshot_two.sales.len(), 4, "full refresh must not append");

    let lager = snapshot_two
        .profitability
        .iter()
        .find(|row| row.product == "Lager")
        .expect("Lager row");
    let expected = (1.20 + 1.30 + 1.75) / 3.0;
    assert!((lager.avg_cost_per_unit.unwrap_or_default() - expected).abs() < 1e-9);

    let present = list_tables(&pool).await?;
    assert!(!present.contains("sales_summary__staging"));

    reset(&pool).await?;
    pool.close().await;
    Ok(())
}
