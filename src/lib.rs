//! patient-audit library
//!
//! Audits a healthcare data pipeline in two steps:
//!
//! - `upload` streams the pipe-delimited patient extract into the
//!   MongoDB `Patients` collection and derives the four scheduled
//!   emails for every consenting patient.
//! - `report` re-reads the extract in batches, reconciles it against
//!   the stored collections, and exports a five-entry discrepancy
//!   report as pipe-delimited CSV.
//!
//! The reconciliation engine itself lives in the `reconcile` crate,
//! batched file reading in `flatfile-source`, and the store client in
//! `mongo-store`. This crate wires them together and owns the upload
//! and export adapters.

pub mod export;
pub mod upload;
pub mod validate;
