//! In-memory fakes and record builders for tests.
//!
//! Shared by this crate's unit tests and by downstream integration
//! tests, so reconciliation runs can be exercised without a MongoDB
//! instance or a file on disk.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use patient_model::{EmailRecord, PatientRecord};

use crate::gateway::{BatchSource, LookupGateway};

/// A fully-populated patient record with the given member id.
pub fn sample_patient(member_id: i64) -> PatientRecord {
    PatientRecord {
        program_id: 100,
        data_source: "WEB".to_string(),
        card_number: 9_000_000_000 + member_id,
        member_id,
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 17).unwrap(),
        address1: "1 Main St".to_string(),
        address2: String::new(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62704".to_string(),
        tel_number: "555-0100".to_string(),
        email: format!("patient{member_id}@example.com"),
        consent: true,
        mobile: "555-0101".to_string(),
    }
}

/// A stored email scheduled `offset_days` after `processing_instant`.
pub fn email_at(member_id: i64, processing_instant: DateTime<Utc>, offset_days: i64) -> EmailRecord {
    EmailRecord {
        member_id,
        email: format!("patient{member_id}@example.com"),
        schedule: processing_instant + Duration::days(offset_days),
        template: format!("test{offset_days}"),
    }
}

/// The four expected emails for one consenting patient.
pub fn full_email_schedule(member_id: i64, processing_instant: DateTime<Utc>) -> Vec<EmailRecord> {
    (1..=patient_model::EMAIL_SCHEDULE_DAYS as i64)
        .map(|day| email_at(member_id, processing_instant, day))
        .collect()
}

/// A [`BatchSource`] over pre-built batches.
pub struct VecSource {
    batches: VecDeque<Vec<PatientRecord>>,
}

impl VecSource {
    pub fn new(batches: Vec<Vec<PatientRecord>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

#[async_trait]
impl BatchSource for VecSource {
    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<PatientRecord>>> {
        Ok(self.batches.pop_front())
    }
}

/// A [`LookupGateway`] over in-memory collections, counting round-trips
/// so tests can assert that empty candidate sets skip the email lookup.
#[derive(Default)]
pub struct InMemoryStore {
    pub patients: Vec<PatientRecord>,
    pub emails: Vec<EmailRecord>,
    patient_calls: AtomicUsize,
    email_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(patients: Vec<PatientRecord>, emails: Vec<EmailRecord>) -> Self {
        Self {
            patients,
            emails,
            ..Default::default()
        }
    }

    pub fn patient_calls(&self) -> usize {
        self.patient_calls.load(Ordering::SeqCst)
    }

    pub fn email_calls(&self) -> usize {
        self.email_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupGateway for InMemoryStore {
    async fn find_patients(&self, member_ids: &[i64]) -> anyhow::Result<Vec<PatientRecord>> {
        if member_ids.is_empty() {
            return Ok(vec![]);
        }
        self.patient_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .patients
            .iter()
            .filter(|p| member_ids.contains(&p.member_id))
            .cloned()
            .collect())
    }

    async fn find_emails(&self, member_ids: &[i64]) -> anyhow::Result<Vec<EmailRecord>> {
        if member_ids.is_empty() {
            return Ok(vec![]);
        }
        self.email_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .emails
            .iter()
            .filter(|e| member_ids.contains(&e.member_id))
            .cloned()
            .collect())
    }
}
