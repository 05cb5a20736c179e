//! Upload pipeline: extract -> Patients collection + derived Emails.

use chrono::{DateTime, Duration, Utc};
use mongo_store::MongoStore;
use patient_model::{EmailRecord, PatientRecord, EMAIL_SCHEDULE_DAYS};
use reconcile::BatchSource;
use tracing::{debug, info};

use crate::validate::validate;

/// Counters for one upload run.
#[derive(Debug, Default, Clone, Copy)]
pub struct UploadSummary {
    pub records_read: usize,
    pub records_uploaded: usize,
    pub records_rejected: usize,
    pub emails_created: usize,
}

/// The four scheduled emails derived from one consenting patient:
/// offsets 1..=4 days from `from`, templates `test1`..`test4`, in
/// ascending schedule order.
pub fn schedule_emails(member_id: i64, email: &str, from: DateTime<Utc>) -> Vec<EmailRecord> {
    (1..=EMAIL_SCHEDULE_DAYS as i64)
        .map(|day| EmailRecord {
            member_id,
            email: email.to_string(),
            schedule: from + Duration::days(day),
            template: format!("test{day}"),
        })
        .collect()
}

/// Streams the extract batch by batch into the store.
///
/// Records failing validation are logged and dropped; the rest are
/// inserted, and each consenting record with an email address gets its
/// four scheduled emails. Empty batches of either kind skip the insert
/// round-trip.
pub async fn upload<S: BatchSource + Send>(
    store: &MongoStore,
    source: &mut S,
) -> anyhow::Result<UploadSummary> {
    let mut summary = UploadSummary::default();

    while let Some(batch) = source.next_batch().await? {
        let batch_len = batch.len();
        summary.records_read += batch_len;

        let valid: Vec<PatientRecord> = batch.into_iter().filter(validate).collect();
        summary.records_rejected += batch_len - valid.len();

        store.insert_patients(&valid).await?;
        summary.records_uploaded += valid.len();

        let now = Utc::now();
        let emails: Vec<EmailRecord> = valid
            .iter()
            .filter(|p| p.has_email_consent())
            .flat_map(|p| schedule_emails(p.member_id, &p.email, now))
            .collect();

        store.insert_emails(&emails).await?;
        summary.emails_created += emails.len();

        debug!(
            uploaded = valid.len(),
            emails = emails.len(),
            "uploaded batch"
        );
    }

    info!(
        read = summary.records_read,
        uploaded = summary.records_uploaded,
        rejected = summary.records_rejected,
        emails = summary.emails_created,
        "upload complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn schedule_spans_the_four_offset_days() {
        let from = Utc::now();
        let emails = schedule_emails(1001, "jane@example.com", from);

        assert_eq!(emails.len(), EMAIL_SCHEDULE_DAYS);
        for (i, email) in emails.iter().enumerate() {
            let expected = from + Duration::days(i as i64 + 1);
            assert_eq!(email.schedule.day(), expected.day());
            assert_eq!(email.template, format!("test{}", i + 1));
            assert_eq!(email.member_id, 1001);
            assert_eq!(email.email, "jane@example.com");
        }
    }

    #[test]
    fn schedule_is_ascending() {
        let emails = schedule_emails(1001, "jane@example.com", Utc::now());
        for pair in emails.windows(2) {
            assert!(pair[0].schedule < pair[1].schedule);
        }
    }
}
