//! CSV export of the discrepancy report.
//!
//! Output format is fixed by downstream consumers: pipe-delimited,
//! every field quoted, header `Test name | Test Result`, one row per
//! check, the result cell holding the flagged member ids joined with
//! commas.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use csv::{QuoteStyle, WriterBuilder};
use reconcile::DiscrepancyReport;

/// Writes the five report rows to `writer`.
pub fn write_report_to<W: io::Write>(report: &DiscrepancyReport, writer: W) -> anyhow::Result<()> {
    let mut csv = WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    csv.write_record(["Test name", "Test Result"])?;
    for entry in &report.entries {
        let ids = entry
            .member_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        csv.write_record([entry.name, ids.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the report to a file at `path`.
pub fn write_report(report: &DiscrepancyReport, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    write_report_to(report, file)
        .with_context(|| format!("failed to write report to {}", path.display()))
}
