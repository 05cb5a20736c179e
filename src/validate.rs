//! Record validation applied before upload.

use chrono::Utc;
use patient_model::PatientRecord;
use tracing::warn;

/// Whether a record is fit for upload.
///
/// An empty email is acceptable (it simply yields no schedule); a
/// non-empty one must look like an address. The date of birth must not
/// lie in the future. Each failure is logged with the member id.
pub fn validate(patient: &PatientRecord) -> bool {
    let mut valid = true;

    if !patient.email.is_empty() && !plausible_email(&patient.email) {
        warn!(
            member_id = patient.member_id,
            email = %patient.email,
            "email address is not valid"
        );
        valid = false;
    }

    if patient.date_of_birth > Utc::now().date_naive() {
        warn!(
            member_id = patient.member_id,
            date_of_birth = %patient.date_of_birth,
            "date of birth lies in the future"
        );
        valid = false;
    }

    valid
}

fn plausible_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && domain.contains('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use reconcile::testing::sample_patient;

    #[test]
    fn accepts_a_well_formed_record() {
        assert!(validate(&sample_patient(1001)));
    }

    #[test]
    fn accepts_an_empty_email() {
        let mut p = sample_patient(1001);
        p.email = String::new();
        p.consent = false;
        assert!(validate(&p));
    }

    #[test]
    fn rejects_mangled_emails() {
        for email in ["no-at-sign", "@nodomain", "nolocal@", "two@@ats.com", "sp ace@x.com", "bare@domain"] {
            let mut p = sample_patient(1001);
            p.email = email.to_string();
            assert!(!validate(&p), "{email:?} accepted");
        }
    }

    #[test]
    fn rejects_a_future_date_of_birth() {
        let mut p = sample_patient(1001);
        p.date_of_birth = (Utc::now() + Duration::days(30)).date_naive();
        assert!(!validate(&p));
    }

    #[test]
    fn accepts_a_past_date_of_birth() {
        let mut p = sample_patient(1001);
        p.date_of_birth = NaiveDate::from_ymd_opt(1945, 1, 2).unwrap();
        assert!(validate(&p));
    }
}
