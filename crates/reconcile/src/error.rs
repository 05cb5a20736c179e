//! Error types for a reconciliation run.

use thiserror::Error;

/// Fatal conditions terminating a reconciliation run.
///
/// Any of these aborts the remaining batches; no partial report is
/// produced. Resource release is the caller's responsibility and must
/// happen on these paths too.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Reading the next batch from the flat-file source failed.
    #[error("failed to read batch {batch} from the record source: {source}")]
    Source {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    /// A lookup-gateway call failed or timed out.
    #[error("{entity} lookup failed for batch {batch}: {source}")]
    Lookup {
        entity: &'static str,
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    /// The run was canceled at a batch boundary.
    #[error("reconciliation canceled before batch {batch}")]
    Canceled { batch: usize },
}
