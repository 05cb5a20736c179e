//! Contracts the engine consumes: the batched record source and the
//! document-store lookup gateway.

use async_trait::async_trait;
use patient_model::{EmailRecord, PatientRecord};

/// A lazy, finite, single-pass sequence of patient batches.
///
/// Implementations yield batches of exactly the configured size except
/// possibly the last, which may be shorter but never empty. `Ok(None)`
/// marks end of input; the source is not restartable afterwards.
#[async_trait]
pub trait BatchSource {
    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<PatientRecord>>>;
}

/// Query access to the persisted patient and email collections.
///
/// Both lookups must tolerate an empty id set by returning an empty vec
/// without a round-trip. Timeouts are enforced here, not by the engine,
/// and surface as errors.
#[async_trait]
pub trait LookupGateway {
    async fn find_patients(&self, member_ids: &[i64]) -> anyhow::Result<Vec<PatientRecord>>;

    async fn find_emails(&self, member_ids: &[i64]) -> anyhow::Result<Vec<EmailRecord>>;
}
