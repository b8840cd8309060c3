pub mod ingest;
pub mod report;
pub mod transform;

use anyhow::{Context, Result};
use brewery_core::db::{self, DbPool, RetryPolicy};

use crate::config;

/// Opens a pool with the standard retry policy.
pub(crate) async fn connect() -> Result<DbPool> {
    let url = config::database_url()?;
    let (pool, _attempts) = db::connect(&url, RetryPolicy::default())
        .await
        .into_result()
        .context("could not reach the database")?;
    Ok(pool)
}
