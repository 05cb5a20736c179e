//! Line-level parsing of the patient extract.

use std::str::FromStr;

use chrono::NaiveDate;
use patient_model::PatientRecord;
use thiserror::Error;

/// Fields per record line, in `PatientRecord` declaration order.
pub const FLAT_FILE_FIELDS: usize = 16;

/// A malformed extract line. Recoverable: the source skips and logs it.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {field} is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: unparsable date of birth: {value:?}")]
    InvalidDate { line: usize, value: String },
}

fn parse_number<T: FromStr>(
    value: &str,
    field: &'static str,
    line: usize,
) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_date(value: &str, line: usize) -> Result<NaiveDate, ParseError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .map_err(|_| ParseError::InvalidDate {
            line,
            value: value.to_string(),
        })
}

/// Parses one pipe-delimited record line. `line` is the 1-based line
/// number in the extract, used only for diagnostics.
pub fn parse_line(line_text: &str, line: usize) -> Result<PatientRecord, ParseError> {
    let cells: Vec<&str> = line_text.split('|').collect();
    if cells.len() != FLAT_FILE_FIELDS {
        return Err(ParseError::FieldCount {
            line,
            expected: FLAT_FILE_FIELDS,
            found: cells.len(),
        });
    }

    Ok(PatientRecord {
        program_id: parse_number(cells[0], "programId", line)?,
        data_source: cells[1].to_string(),
        card_number: parse_number(cells[2], "cardNumber", line)?,
        member_id: parse_number(cells[3], "memberId", line)?,
        first_name: cells[4].to_string(),
        last_name: cells[5].to_string(),
        date_of_birth: parse_date(cells[6], line)?,
        address1: cells[7].to_string(),
        address2: cells[8].to_string(),
        city: cells[9].to_string(),
        state: cells[10].to_string(),
        zip: cells[11].to_string(),
        tel_number: cells[12].to_string(),
        email: cells[13].to_string(),
        consent: cells[14] == "Y",
        mobile: cells[15].to_string(),
    })
}
