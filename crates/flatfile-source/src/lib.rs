//! Streaming batch source over the pipe-delimited patient extract.
//!
//! The extract is line-oriented: a header line to skip, then one
//! 16-field record per line. Records are buffered into fixed-size
//! batches so downstream lookups stay bounded.
//!
//! Malformed lines (wrong field count, unparsable number or date) are
//! skipped and logged with their line number rather than failing the
//! run; I/O errors remain fatal.

mod parse;
mod source;

pub use parse::{parse_line, ParseError, FLAT_FILE_FIELDS};
pub use source::FlatFileSource;
