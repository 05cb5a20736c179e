//! End-to-end reconciliation: a real extract file on disk, batched
//! through `FlatFileSource`, reconciled against an in-memory store, and
//! exported as CSV.

use std::io::Write;

use chrono::Utc;
use flatfile_source::FlatFileSource;
use patient_audit::export;
use patient_model::PatientRecord;
use reconcile::testing::{full_email_schedule, sample_patient, InMemoryStore};
use reconcile::ReconcileEngine;

fn extract_line(p: &PatientRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        p.program_id,
        p.data_source,
        p.card_number,
        p.member_id,
        p.first_name,
        p.last_name,
        p.date_of_birth.format("%Y-%m-%d"),
        p.address1,
        p.address2,
        p.city,
        p.state,
        p.zip,
        p.tel_number,
        p.email,
        if p.consent { "Y" } else { "N" },
        p.mobile
    )
}

fn write_extract(records: &[&PatientRecord]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "programId|dataSource|cardNumber|memberId|firstName|lastName|dateOfBirth|address1|address2|city|state|zip|telNumber|email|consent|mobile").unwrap();
    for record in records {
        writeln!(file, "{}", extract_line(record)).unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn flags_the_nameless_record_in_the_second_entry() {
    let now = Utc::now();

    // Record A round-trips the store unchanged; record B lost its first
    // name in the extract. Both have complete email schedules.
    let a = sample_patient(1001);
    let mut b = sample_patient(1002);
    b.first_name = String::new();

    let mut stored_b = b.clone();
    stored_b.city = "Elsewhere".to_string();
    let stored = vec![a.clone(), stored_b];
    let emails: Vec<_> = [1001i64, 1002]
        .into_iter()
        .flat_map(|id| full_email_schedule(id, now))
        .collect();

    let file = write_extract(&[&a, &b]);
    let mut source = FlatFileSource::open(file.path(), 10).unwrap();
    let store = InMemoryStore::new(stored, emails);

    let report = ReconcileEngine::new()
        .with_processing_instant(now)
        .run(&mut source, &store)
        .await
        .unwrap();

    assert_eq!(report.entries[1].member_ids, vec![1002]);
    // A's stored copy is identical, which is exactly what the first
    // check flags.
    assert_eq!(report.entries[0].member_ids, vec![1001]);
    assert!(report.entries[2].member_ids.is_empty());
    assert!(report.entries[3].member_ids.is_empty());
    assert!(report.entries[4].member_ids.is_empty());
}

#[tokio::test]
async fn multi_batch_run_exports_a_five_row_csv() {
    let now = Utc::now();

    // 25 records over batch size 10 -> three batches. Every fifth
    // record consented without an email address.
    let mut records = Vec::new();
    for i in 0..25i64 {
        let mut p = sample_patient(1000 + i);
        if i % 5 == 0 {
            p.email = String::new();
        }
        records.push(p);
    }
    let emails: Vec<_> = records
        .iter()
        .filter(|p| p.has_email_consent())
        .flat_map(|p| full_email_schedule(p.member_id, now))
        .collect();

    let refs: Vec<&PatientRecord> = records.iter().collect();
    let file = write_extract(&refs);
    let mut source = FlatFileSource::open(file.path(), 10).unwrap();
    let store = InMemoryStore::new(vec![], emails);

    let report = ReconcileEngine::new()
        .with_processing_instant(now)
        .run(&mut source, &store)
        .await
        .unwrap();

    // One patient lookup per batch; email lookups only for batches with
    // candidates (all three here).
    assert_eq!(store.patient_calls(), 3);
    assert_eq!(store.email_calls(), 3);
    assert_eq!(
        report.entries[2].member_ids,
        vec![1000, 1005, 1010, 1015, 1020]
    );

    let mut out = Vec::new();
    export::write_report_to(&report, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert!(text.contains("\"1000,1005,1010,1015,1020\""));
}
