//! The reconciliation run loop.

use chrono::{DateTime, Utc};
use patient_model::structurally_equal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::accumulator::DiscrepancyAccumulator;
use crate::checks;
use crate::error::ReconcileError;
use crate::gateway::{BatchSource, LookupGateway};
use crate::report::{assemble, DiscrepancyReport};

/// Drives batches from a [`BatchSource`] through the five checks against
/// a [`LookupGateway`] and assembles the final report.
///
/// Batches are processed strictly in sequence; the only suspension
/// points are the batch read, the patient lookup, and the conditional
/// email lookup, in that order. The email lookup's candidate set is
/// derived from patient data already read, so this ordering is load
/// bearing. Cancellation is honored at batch boundaries only.
pub struct ReconcileEngine {
    processing_instant: DateTime<Utc>,
    cancel: CancellationToken,
    acc: DiscrepancyAccumulator,
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileEngine {
    pub fn new() -> Self {
        Self {
            processing_instant: Utc::now(),
            cancel: CancellationToken::new(),
            acc: DiscrepancyAccumulator::new(),
        }
    }

    /// Overrides the instant the schedule offsets are computed from.
    pub fn with_processing_instant(mut self, instant: DateTime<Utc>) -> Self {
        self.processing_instant = instant;
        self
    }

    /// Attaches a token checked before each batch; canceling it aborts
    /// the run between batches, never mid-batch.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs all batches to completion and assembles the report.
    ///
    /// Any source or lookup failure aborts the remaining batches and no
    /// report is produced; the caller is responsible for releasing the
    /// underlying store connection on both paths.
    pub async fn run<S, G>(
        mut self,
        source: &mut S,
        gateway: &G,
    ) -> Result<DiscrepancyReport, ReconcileError>
    where
        S: BatchSource + Send,
        G: LookupGateway + Sync,
    {
        let mut batch_index = 0usize;

        loop {
            if self.cancel.is_cancelled() {
                warn!(batch = batch_index, "reconciliation canceled at batch boundary");
                return Err(ReconcileError::Canceled { batch: batch_index });
            }

            let batch = source
                .next_batch()
                .await
                .map_err(|err| ReconcileError::Source {
                    batch: batch_index,
                    source: err,
                })?;
            let Some(batch) = batch else {
                break;
            };
            debug!(batch = batch_index, records = batch.len(), "processing batch");

            self.process_batch(batch_index, &batch, gateway).await?;
            batch_index += 1;
        }

        info!(
            batches = batch_index,
            flagged = self.acc.total_flagged(),
            "reconciliation complete"
        );
        Ok(assemble(&self.acc))
    }

    async fn process_batch<G: LookupGateway + Sync>(
        &mut self,
        batch_index: usize,
        batch: &[patient_model::PatientRecord],
        gateway: &G,
    ) -> Result<(), ReconcileError> {
        let member_ids: Vec<i64> = batch.iter().map(|r| r.member_id).collect();

        let stored = gateway
            .find_patients(&member_ids)
            .await
            .map_err(|err| ReconcileError::Lookup {
                entity: "patient",
                batch: batch_index,
                source: err,
            })?;

        self.acc
            .patient_diffs
            .extend(checks::patient_diffs(batch, &stored, structurally_equal));
        self.acc
            .first_name_missing
            .extend(checks::first_name_missing(batch));
        self.acc
            .email_missing_with_consent
            .extend(checks::email_missing_with_consent(batch));

        let candidates = checks::email_candidates(batch);

        // No round-trip at all when no record in the batch expects emails.
        if candidates.is_empty() {
            return Ok(());
        }

        let emails = gateway
            .find_emails(&candidates)
            .await
            .map_err(|err| ReconcileError::Lookup {
                entity: "email",
                batch: batch_index,
                source: err,
            })?;

        self.acc
            .emails_missing
            .extend(checks::emails_missing(&candidates, &emails));
        self.acc.email_schedule_mismatches.extend(
            checks::email_schedule_mismatches(&candidates, &emails, self.processing_instant),
        );

        Ok(())
    }
}
