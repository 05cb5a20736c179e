//! Batched iteration over the extract.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use async_trait::async_trait;
use patient_model::PatientRecord;
use reconcile::BatchSource;
use tracing::{info, warn};

/// Lazy, single-pass source of fixed-size patient batches.
///
/// Yields batches of exactly `batch_size` records except possibly the
/// last; never yields an empty batch. The first line of the input is a
/// header and is always skipped, as are blank lines and malformed
/// record lines (the latter with a warning).
pub struct FlatFileSource<R> {
    lines: Lines<R>,
    batch_size: usize,
    line: usize,
    header_skipped: bool,
    skipped: usize,
    end_logged: bool,
}

impl FlatFileSource<BufReader<File>> {
    /// Opens the extract at `path`.
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), batch_size))
    }
}

impl<R: BufRead> FlatFileSource<R> {
    pub fn new(reader: R, batch_size: usize) -> Self {
        Self {
            lines: reader.lines(),
            // A batch below one record cannot make progress.
            batch_size: batch_size.max(1),
            line: 0,
            header_skipped: false,
            skipped: 0,
            end_logged: false,
        }
    }

    /// Malformed lines skipped so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    fn read_batch(&mut self) -> io::Result<Option<Vec<PatientRecord>>> {
        let mut batch = Vec::with_capacity(self.batch_size);

        while batch.len() < self.batch_size {
            let Some(line) = self.lines.next() else {
                break;
            };
            let line = line?;
            self.line += 1;

            if !self.header_skipped {
                self.header_skipped = true;
                continue;
            }

            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            match super::parse_line(line, self.line) {
                Ok(record) => batch.push(record),
                Err(err) => {
                    self.skipped += 1;
                    warn!("skipping malformed line: {err}");
                }
            }
        }

        if batch.is_empty() {
            if !self.end_logged {
                self.end_logged = true;
                info!(
                    lines = self.line,
                    skipped = self.skipped,
                    "reached end of extract"
                );
            }
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

#[async_trait]
impl<R: BufRead + Send> BatchSource for FlatFileSource<R> {
    async fn next_batch(&mut self) -> anyhow::Result<Option<Vec<PatientRecord>>> {
        Ok(self.read_batch()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    const HEADER: &str =
        "programId|dataSource|cardNumber|memberId|firstName|lastName|dateOfBirth|address1|address2|city|state|zip|telNumber|email|consent|mobile";

    fn record_line(member_id: i64) -> String {
        format!(
            "100|WEB|9000000001|{member_id}|Jane|Doe|1980-05-17|1 Main St||Springfield|IL|62704|555-0100|jane{member_id}@example.com|Y|555-0101"
        )
    }

    fn extract(records: usize) -> Cursor<Vec<u8>> {
        let mut text = String::from(HEADER);
        for i in 0..records {
            text.push('\n');
            text.push_str(&record_line(1000 + i as i64));
        }
        text.push('\n');
        Cursor::new(text.into_bytes())
    }

    fn batch_sizes(mut source: FlatFileSource<Cursor<Vec<u8>>>) -> Vec<usize> {
        let mut sizes = Vec::new();
        while let Some(batch) = source.read_batch().unwrap() {
            assert!(!batch.is_empty(), "empty batch yielded");
            sizes.push(batch.len());
        }
        // A second read past the end must stay at the end.
        assert!(source.read_batch().unwrap().is_none());
        sizes
    }

    #[test]
    fn splits_input_into_full_batches_plus_remainder() {
        let sizes = batch_sizes(FlatFileSource::new(extract(25), 10));
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn exact_multiple_yields_only_full_batches() {
        let sizes = batch_sizes(FlatFileSource::new(extract(20), 10));
        assert_eq!(sizes, vec![10, 10]);
    }

    #[test]
    fn batch_size_one_yields_one_record_per_batch() {
        let sizes = batch_sizes(FlatFileSource::new(extract(3), 1));
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn header_only_input_yields_no_batches() {
        let sizes = batch_sizes(FlatFileSource::new(extract(0), 10));
        assert!(sizes.is_empty());
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let sizes = batch_sizes(FlatFileSource::new(Cursor::new(Vec::new()), 10));
        assert!(sizes.is_empty());
    }

    #[test]
    fn header_line_is_not_parsed_as_a_record() {
        let mut source = FlatFileSource::new(extract(2), 10);
        let batch = source.read_batch().unwrap().unwrap();
        assert_eq!(batch[0].member_id, 1000);
        assert_eq!(source.skipped_lines(), 0);
    }

    #[test]
    fn malformed_lines_are_skipped_without_corrupting_batches() {
        let mut text = String::from(HEADER);
        text.push('\n');
        text.push_str(&record_line(1001));
        text.push_str("\nnot|a|record\n");
        text.push_str(&record_line(1002));
        text.push('\n');

        let mut source = FlatFileSource::new(Cursor::new(text.into_bytes()), 10);
        let batch = source.read_batch().unwrap().unwrap();

        let ids: Vec<i64> = batch.iter().map(|r| r.member_id).collect();
        assert_eq!(ids, vec![1001, 1002]);
        assert_eq!(source.skipped_lines(), 1);
        assert!(source.read_batch().unwrap().is_none());
    }

    #[test]
    fn blank_and_crlf_lines_are_tolerated() {
        let mut text = String::from(HEADER);
        text.push_str("\r\n");
        text.push_str(&record_line(1001));
        text.push_str("\r\n\r\n");

        let mut source = FlatFileSource::new(Cursor::new(text.into_bytes()), 10);
        let batch = source.read_batch().unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].mobile, "555-0101");
    }

    #[test]
    fn open_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{}", record_line(1001)).unwrap();
        file.flush().unwrap();

        let mut source = FlatFileSource::open(file.path(), 10).unwrap();
        let batch = source.read_batch().unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn implements_the_engine_source_contract() {
        let mut source = FlatFileSource::new(extract(2), 1);

        let first = BatchSource::next_batch(&mut source).await.unwrap().unwrap();
        assert_eq!(first[0].member_id, 1000);
        let second = BatchSource::next_batch(&mut source).await.unwrap().unwrap();
        assert_eq!(second[0].member_id, 1001);
        assert!(BatchSource::next_batch(&mut source).await.unwrap().is_none());
    }
}
