use anyhow::{Context, Result};
use brewery_core::db::RetryPolicy;
use brewery_core::transform::run_transform;
use tracing::info;

use crate::config;

pub async fn run() -> Result<()> {
    let url = config::database_url()?;
    let report = run_transform(&url, RetryPolicy::default())
        .await
        .context("transform failed")?;

    let json = serde_json::to_string(&report).context("failed to serialise transform report")?;
    info!(report = %json, "transform complete");
    Ok(())
}
