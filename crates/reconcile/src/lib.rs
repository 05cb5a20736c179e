//! Batch reconciliation of a patient flat-file extract against the
//! document store, plus validation of derived email-scheduling data.
//!
//! The engine pulls fixed-size batches from a [`BatchSource`], resolves
//! each batch against a [`LookupGateway`], runs five discrepancy checks,
//! and assembles the accumulated member ids into a fixed-order
//! [`DiscrepancyReport`].

pub mod accumulator;
pub mod checks;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod report;
pub mod testing;

pub use accumulator::DiscrepancyAccumulator;
pub use engine::ReconcileEngine;
pub use error::ReconcileError;
pub use gateway::{BatchSource, LookupGateway};
pub use report::{assemble, DiscrepancyReport, ReportEntry, REPORT_LABELS};
