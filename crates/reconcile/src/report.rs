//! Discrepancy report assembly.

use crate::accumulator::DiscrepancyAccumulator;

/// Report entry labels, in emission order. The wording is fixed by the
/// downstream consumers of the exported CSV.
pub const REPORT_LABELS: [&str; 5] = [
    "Verify the data in flat file matches the data in patient collection",
    "Patient IDs - where first name is missing",
    "Patient IDs - Email address is missing but consent is Y",
    "Verify Emails were created in Email Collection for patients who have CONSENT as Y",
    "Verify the Email schedule matches with the above",
];

/// One named check result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub name: &'static str,
    pub member_ids: Vec<i64>,
}

/// The full report: always exactly five entries, in [`REPORT_LABELS`]
/// order, with empty id lists kept rather than omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscrepancyReport {
    pub entries: Vec<ReportEntry>,
}

impl DiscrepancyReport {
    /// Whether no check flagged anything.
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.member_ids.is_empty())
    }
}

/// Maps the accumulators into named entries in fixed declaration order,
/// independent of discovery order or accumulator size.
pub fn assemble(acc: &DiscrepancyAccumulator) -> DiscrepancyReport {
    let lists = [
        &acc.patient_diffs,
        &acc.first_name_missing,
        &acc.email_missing_with_consent,
        &acc.emails_missing,
        &acc.email_schedule_mismatches,
    ];

    DiscrepancyReport {
        entries: REPORT_LABELS
            .into_iter()
            .zip(lists)
            .map(|(name, ids)| ReportEntry {
                name,
                member_ids: ids.clone(),
            })
            .collect(),
    }
}
