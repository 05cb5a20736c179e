//! The five per-batch discrepancy checks.
//!
//! Each check is a pure function from batch data (and, where relevant,
//! looked-up store data) to the list of flagged member ids, so they are
//! testable without any store connection.

use chrono::{DateTime, Datelike, Duration, Utc};
use patient_model::{EmailRecord, PatientRecord, EMAIL_SCHEDULE_DAYS};

/// Flat-file vs patient-collection check.
///
/// A member id is flagged exactly when the store holds a record for it
/// and that record is structurally equal to the flat one. Ids whose
/// stored counterpart differs, and ids absent from the store, are left
/// unflagged. This polarity is inherited from the upstream audit and is
/// deliberately preserved; see DESIGN.md.
pub fn patient_diffs(
    flat: &[PatientRecord],
    stored: &[PatientRecord],
    eq: impl Fn(&PatientRecord, &PatientRecord) -> bool,
) -> Vec<i64> {
    flat.iter()
        .filter(|&flat_record| {
            stored
                .iter()
                .find(|s| s.member_id == flat_record.member_id)
                .is_some_and(|s| eq(flat_record, s))
        })
        .map(|r| r.member_id)
        .collect()
}

/// Candidate ids for the email checks: consenting records with an
/// address, in batch order.
pub fn email_candidates(flat: &[PatientRecord]) -> Vec<i64> {
    flat.iter()
        .filter(|r| r.has_email_consent())
        .map(|r| r.member_id)
        .collect()
}

/// Flags every record whose first name is empty.
pub fn first_name_missing(flat: &[PatientRecord]) -> Vec<i64> {
    flat.iter()
        .filter(|r| r.first_name.is_empty())
        .map(|r| r.member_id)
        .collect()
}

/// Flags every record that consented to email but carries no address.
pub fn email_missing_with_consent(flat: &[PatientRecord]) -> Vec<i64> {
    flat.iter()
        .filter(|r| r.email.is_empty() && r.consent)
        .map(|r| r.member_id)
        .collect()
}

/// Flags each candidate id whose stored email count is not exactly
/// [`EMAIL_SCHEDULE_DAYS`].
pub fn emails_missing(candidate_ids: &[i64], emails: &[EmailRecord]) -> Vec<i64> {
    candidate_ids
        .iter()
        .copied()
        .filter(|id| {
            emails.iter().filter(|e| e.member_id == *id).count() != EMAIL_SCHEDULE_DAYS
        })
        .collect()
}

/// Flags each candidate id whose stored schedules, sorted ascending, do
/// not land on the expected day for their offset.
///
/// The i-th sorted schedule (i from 1) is expected on
/// `processing_instant + i days`, compared on day-of-month only. The
/// day-of-month comparison is a known limitation: it can accept a wrong
/// month when the day number happens to line up across a month boundary.
pub fn email_schedule_mismatches(
    candidate_ids: &[i64],
    emails: &[EmailRecord],
    processing_instant: DateTime<Utc>,
) -> Vec<i64> {
    candidate_ids
        .iter()
        .copied()
        .filter(|id| {
            let mut schedules: Vec<DateTime<Utc>> = emails
                .iter()
                .filter(|e| e.member_id == *id)
                .map(|e| e.schedule)
                .collect();
            schedules.sort();

            schedules.iter().enumerate().any(|(i, schedule)| {
                let expected = processing_instant + Duration::days(i as i64 + 1);
                schedule.day() != expected.day()
            })
        })
        .collect()
}
