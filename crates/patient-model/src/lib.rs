//! Record types shared by the upload and reconciliation pipelines.
//!
//! Field names are serialized in camelCase so documents round-trip
//! unchanged against the collections written by the upstream loader
//! (`memberId`, `firstName`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of scheduled emails expected per consenting patient, one per
/// offset day 1..=EMAIL_SCHEDULE_DAYS from the processing instant.
pub const EMAIL_SCHEDULE_DAYS: usize = 4;

/// One row of the patient extract, keyed by `member_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub program_id: i32,
    pub data_source: String,
    pub card_number: i64,
    pub member_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub tel_number: String,
    pub email: String,
    pub consent: bool,
    pub mobile: String,
}

impl PatientRecord {
    /// Whether this patient should have scheduled emails in the store.
    pub fn has_email_consent(&self) -> bool {
        self.consent && !self.email.is_empty()
    }
}

/// A scheduled email derived from a consenting patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub member_id: i64,
    pub email: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub schedule: DateTime<Utc>,
    pub template: String,
}

/// Structural equality over every field of two patient records.
///
/// Kept as a free function so the field-diff check can take it as an
/// injectable comparator and be tested without a live store.
pub fn structurally_equal(a: &PatientRecord, b: &PatientRecord) -> bool {
    a == b
}
