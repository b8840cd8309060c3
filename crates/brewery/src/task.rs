use std::env;
use std::str::FromStr;

use anyhow::{bail, Error, Result};

pub const TASK_ENV_VAR: &str = "ETL_TASK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlTask {
    Ingest,
    Transform,
    Report,
}

impl EtlTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtlTask::Ingest => "ingest",
            EtlTask::Transform => "transform",
            EtlTask::Report => "report",
        }
    }

    /// Reads `ETL_TASK`, defaulting to ingest when unset.
    pub fn from_env() -> Result<Self> {
        match env::var(TASK_ENV_VAR) {
            Ok(value) => value.parse(),
            Err(env::VarError::NotPresent) => Ok(EtlTask::Ingest),
            Err(err) => bail!("{TASK_ENV_VAR} could not be read: {err}"),
        }
    }
}

impl FromStr for EtlTask {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ingest" => Ok(EtlTask::Ingest),
            "transform" => Ok(EtlTask::Transform),
            "report" => Ok(EtlTask::Report),
            _ => bail!(
                "invalid {TASK_ENV_VAR} value '{value}'; use 'ingest', 'transform' or 'report'"
            ),
        }
    }
}
