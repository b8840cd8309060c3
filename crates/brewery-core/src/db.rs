// crates/brewery-core/src/db.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use tracing::{error, info, warn};

use crate::error::TransformError;

pub type DbPool = Pool<Postgres>;

/// Attempts made before a run gives up on the store.
pub const CONNECT_ATTEMPTS: u32 = 3;
/// Fixed pause between connection attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: CONNECT_ATTEMPTS,
            delay: CONNECT_RETRY_DELAY,
        }
    }
}

/// Result of [`connect`]: either a live pool or the error from the final attempt.
#[derive(Debug)]
pub enum ConnectOutcome {
    Connected { pool: DbPool, attempts: u32 },
    Exhausted { attempts: u32, last_error: sqlx::Error },
}

impl ConnectOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            ConnectOutcome::Connected { attempts, .. } | ConnectOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_result(self) -> Result<(DbPool, u32), TransformError> {
        match self {
            ConnectOutcome::Connected { pool, attempts } => Ok((pool, attempts)),
            ConnectOutcome::Exhausted {
                attempts,
                last_error,
            } => Err(TransformError::ConnectionExhausted {
                attempts,
                source: last_error,
            }),
        }
    }
}

/// Opens a Postgres pool and verifies it with a liveness probe, retrying with a
/// fixed delay. A failed probe counts as a failed attempt.
pub async fn connect(database_url: &str, policy: RetryPolicy) -> ConnectOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match open_and_probe(database_url).await {
            Ok(pool) => {
                info!(attempt, max_attempts, "database connection established");
                return ConnectOutcome::Connected {
                    pool,
                    attempts: attempt,
                };
            }
            Err(err) if attempt >= max_attempts => {
                error!(
                    attempt,
                    max_attempts,
                    error = %err,
                    "database connection failed, no attempts remaining"
                );
                return ConnectOutcome::Exhausted {
                    attempts: attempt,
                    last_error: err,
                };
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    delay_secs = policy.delay.as_secs(),
                    "database connection failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

async fn open_and_probe(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    if let Err(err) = probe(&pool).await {
        pool.close().await;
        return Err(err);
    }
    Ok(pool)
}

/// Trivial round trip used to confirm the connection is usable.
pub async fn probe(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
