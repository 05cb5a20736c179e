//! Per-run accumulation of flagged member ids.

/// Flagged member ids for the five checks, accumulated across batches.
///
/// Owned exclusively by the engine for the duration of one run; each
/// batch appends in discovery order and no deduplication is performed
/// (member ids are unique upstream). The assembler receives it only
/// after the final batch.
#[derive(Debug, Default, Clone)]
pub struct DiscrepancyAccumulator {
    pub(crate) patient_diffs: Vec<i64>,
    pub(crate) first_name_missing: Vec<i64>,
    pub(crate) email_missing_with_consent: Vec<i64>,
    pub(crate) emails_missing: Vec<i64>,
    pub(crate) email_schedule_mismatches: Vec<i64>,
}

impl DiscrepancyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of flags across all categories.
    pub fn total_flagged(&self) -> usize {
        self.patient_diffs.len()
            + self.first_name_missing.len()
            + self.email_missing_with_consent.len()
            + self.emails_missing.len()
            + self.email_schedule_mismatches.len()
    }
}
