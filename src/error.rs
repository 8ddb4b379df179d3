use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds the pipeline distinguishes. Everything except `DownstreamCall`
/// ends the run with a non-zero exit.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot connect to database at {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("CSV not found at {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Batch {batch} of {total} failed to insert: {source:#}")]
    BatchInsert {
        batch: usize,
        total: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("CRM call failed for {name}: {message}")]
    DownstreamCall { name: String, message: String },

    #[error("Set {0} in the environment or .env")]
    MissingCredential(&'static str),

    #[error("Batch size must be between 1 and {max}, got {0}", max = crate::config::MAX_BATCH_SIZE)]
    InvalidBatchSize(usize),
}
