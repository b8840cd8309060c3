// crates/brewery-core/src/error.rs

use thiserror::Error;

use crate::materialize::MaterializeError;
use crate::readiness::ReadinessError;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("could not connect to the database after {attempts} attempt(s): {source}")]
    ConnectionExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error("failed to read source table {table}: {source}")]
    SourceRead {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
