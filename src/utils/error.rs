//! Failure taxonomy shared by the reassignment, coverage and consensus steps.
//!
//! Each variant carries enough context (cluster id, batch index, offending line)
//! for the failed unit to be rerun on its own.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CnvError {
    /// An expected per-cluster or per-batch input file does not exist.
    #[error("Missing input for cluster {cluster_id} (batch {batch}): {path}")]
    MissingInput {
        cluster_id: String,
        batch: usize,
        path: String,
    },
    /// A line or record could not be interpreted.
    #[error("Malformed record ({reason}): {record}")]
    MalformedRecord { reason: String, record: String },
    /// A cluster cannot be processed with the given inputs or thresholds.
    #[error("Cluster {cluster_id}: {reason}")]
    Configuration { cluster_id: String, reason: String },
    #[error("No genome clusters were selected")]
    NoClustersSelected,
}

impl CnvError {
    pub fn malformed(reason: impl Into<String>, record: impl Into<String>) -> Self {
        CnvError::MalformedRecord {
            reason: reason.into(),
            record: record.into(),
        }
    }
}

impl From<CnvError> for String {
    fn from(err: CnvError) -> String {
        err.to_string()
    }
}
