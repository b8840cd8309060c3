use std::env;

use anyhow::{Context, Result};

/// Connection string from `DATABASE_URL` (or `BREWERY_DATABASE_URL`), after
/// loading any `.env` file in the working directory.
pub fn database_url() -> Result<String> {
    dotenvy::dotenv().ok();
    env::var("DATABASE_URL")
        .or_else(|_| env::var("BREWERY_DATABASE_URL"))
        .context("DATABASE_URL (or BREWERY_DATABASE_URL) must be set")
}
