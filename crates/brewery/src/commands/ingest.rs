use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brewery_core::ingestion::{ensure_source_tables, load_source_file};
use brewery_parser::{parse_as, SourceFile, SourceKind};
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Sales CSV (date, product, region, units_sold, price_per_unit)
    #[arg(long, default_value = "mock_sales_data.csv")]
    pub sales: PathBuf,

    /// Production CSV (date, product, units_produced, spoiled_units, cost_per_unit)
    #[arg(long, default_value = "mock_production_data.csv")]
    pub production: PathBuf,
}

pub async fn run(args: IngestArgs) -> Result<()> {
    // Parse both files before touching the database.
    let sales = read_source(&args.sales, SourceKind::Sales)?;
    let production = read_source(&args.production, SourceKind::Production)?;

    let pool = super::connect().await?;
    ensure_source_tables(&pool).await?;

    for file in [&sales, &production] {
        let summary = load_source_file(&pool, file).await?;
        info!(
            table = summary.table,
            rows = summary.rows_appended,
            "ingest complete"
        );
    }

    pool.close().await;
    Ok(())
}

fn read_source(path: &Path, expected: SourceKind) -> Result<SourceFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file = parse_expected(path, &content, expected)?;
    info!(path = %path.display(), kind = %file.kind(), rows = file.len(), "parsed source file");
    Ok(file)
}

fn parse_expected(path: &Path, content: &str, expected: SourceKind) -> Result<SourceFile> {
    parse_as(expected, content)
        .with_context(|| format!("failed to parse {} as {expected} data", path.display()))
}
