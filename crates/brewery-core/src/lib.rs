pub mod aggregate;
pub mod db;
pub mod error;
pub mod ingestion;
pub mod materialize;
pub mod normalize;
pub mod profitability;
pub mod readiness;
pub mod report;
pub mod source;
pub mod transform;
