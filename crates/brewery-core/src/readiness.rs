use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, info};

use crate::db::DbPool;
use crate::source::REQUIRED_SOURCE_TABLES;

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error(
        "required source table(s) missing: {}; run the ingest task first",
        .missing.join(", ")
    )]
    MissingTables { missing: Vec<String> },

    #[error("failed to list tables in the current schema: {0}")]
    Catalog(#[from] sqlx::Error),
}

/// Confirms every source table exists in the current schema before anything is read.
pub async fn verify_tables(pool: &DbPool) -> Result<(), ReadinessError> {
    let present = list_tables(pool).await?;
    let missing = missing_tables(&present, &REQUIRED_SOURCE_TABLES);

    if missing.is_empty() {
        info!(tables = ?REQUIRED_SOURCE_TABLES, "source tables present");
        Ok(())
    } else {
        error!(missing = ?missing, "source tables missing");
        Err(ReadinessError::MissingTables { missing })
    }
}

pub async fn list_tables(pool: &DbPool) -> Result<HashSet<String>, sqlx::Error> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema()
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(names.into_iter().collect())
}

/// Required names absent from `present`, in the order they were required.
pub fn missing_tables(present: &HashSet<String>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !present.contains(**name))
        .map(|name| name.to_string())
        .collect()
}
