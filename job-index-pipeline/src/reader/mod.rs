//! Reader module for the job index pipeline.
//!
//! Streams rows out of the job CSV and normalizes each one into a
//! [`NormalizedRow`]. The reader holds one record at a time, so memory stays
//! bounded regardless of file size.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::errors::{PipelineError, RowParseError};
use job_index_shared::{Industry, NewJob};

pub const COLUMN_TITLE: &str = "Job Title";
pub const COLUMN_COMPANY: &str = "Company";
pub const COLUMN_LOCATION: &str = "Location";
pub const COLUMN_EXPERIENCE_LEVEL: &str = "Experience Level";
pub const COLUMN_SALARY: &str = "Salary";
pub const COLUMN_INDUSTRY: &str = "Industry";
pub const COLUMN_REQUIRED_SKILLS: &str = "Required Skills";

/// What to do with a row that cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowErrorPolicy {
    /// Log the row, count it, and keep going.
    #[default]
    Skip,
    /// Fail the whole ingestion on the first bad row.
    Abort,
}

impl RowErrorPolicy {
    /// Apply the policy to a row error.
    ///
    /// Returns `Ok(())` when the row should be skipped.
    pub fn handle(self, error: RowParseError) -> Result<(), PipelineError> {
        match self {
            RowErrorPolicy::Skip => {
                warn!(row = error.row(), error = %error, "Skipping malformed row");
                Ok(())
            }
            RowErrorPolicy::Abort => Err(PipelineError::RowParse(error)),
        }
    }
}

impl FromStr for RowErrorPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(RowErrorPolicy::Skip),
            "abort" => Ok(RowErrorPolicy::Abort),
            other => Err(PipelineError::config(format!(
                "Unknown row error policy {:?}, expected \"skip\" or \"abort\"",
                other
            ))),
        }
    }
}

impl fmt::Display for RowErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorPolicy::Skip => f.write_str("skip"),
            RowErrorPolicy::Abort => f.write_str("abort"),
        }
    }
}

/// Configuration for the CSV reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub policy: RowErrorPolicy,
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            policy: RowErrorPolicy::default(),
            delimiter: b',',
        }
    }
}

/// One CSV row turned into a candidate job plus its raw skill list.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Data row number, starting at 1.
    pub row: u64,
    pub job: NewJob,
    /// The unsplit `Required Skills` text.
    pub required_skills: String,
}

/// Coerce salary text into an integer.
///
/// Unparsable or non-finite input yields 0; fractions are truncated toward zero.
/// Values beyond the `i64` range saturate at its bounds, which the index maps
/// as `long`.
pub fn parse_salary(text: &str) -> i64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ColumnIndex {
    title: Option<usize>,
    company: Option<usize>,
    location: Option<usize>,
    experience_level: Option<usize>,
    salary: Option<usize>,
    industry: Option<usize>,
    required_skills: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let columns = Self {
            title: position(COLUMN_TITLE),
            company: position(COLUMN_COMPANY),
            location: position(COLUMN_LOCATION),
            experience_level: position(COLUMN_EXPERIENCE_LEVEL),
            salary: position(COLUMN_SALARY),
            industry: position(COLUMN_INDUSTRY),
            required_skills: position(COLUMN_REQUIRED_SKILLS),
        };

        debug!(columns = ?columns, "Resolved CSV columns");
        columns
    }
}

/// Sequential reader over job CSV rows.
///
/// Yields one `Result` per data row; the caller decides what a bad row means
/// through [`RowErrorPolicy`]. To read the file again, construct a new reader.
pub struct RowReader<R> {
    records: csv::StringRecordsIntoIter<R>,
    columns: ColumnIndex,
    row: u64,
}

impl RowReader<File> {
    /// Open a CSV file and read its header.
    pub fn from_path(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self, PipelineError> {
        let reader = builder(config).from_path(path)?;
        Self::from_csv(reader)
    }
}

impl<R: io::Read> RowReader<R> {
    /// Read CSV from any byte source.
    pub fn from_reader(reader: R, config: &ReaderConfig) -> Result<Self, PipelineError> {
        Self::from_csv(builder(config).from_reader(reader))
    }

    fn from_csv(mut reader: csv::Reader<R>) -> Result<Self, PipelineError> {
        let headers = reader.headers()?.clone();

        Ok(Self {
            columns: ColumnIndex::from_headers(&headers),
            records: reader.into_records(),
            row: 0,
        })
    }

    fn normalize(&self, record: &StringRecord) -> Result<NormalizedRow, RowParseError> {
        let row = self.row;
        let field = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .map(str::trim)
                .unwrap_or_default()
        };
        let required = |index: Option<usize>, column: &'static str| {
            let value = field(index);
            if value.is_empty() {
                Err(RowParseError::missing_field(row, column))
            } else {
                Ok(value)
            }
        };

        let title = required(self.columns.title, COLUMN_TITLE)?;
        let company = required(self.columns.company, COLUMN_COMPANY)?;
        let industry = required(self.columns.industry, COLUMN_INDUSTRY)?
            .parse::<Industry>()
            .map_err(|error| RowParseError::UnknownIndustry { row, error })?;

        Ok(NormalizedRow {
            row,
            job: NewJob {
                title: title.to_string(),
                company: company.to_string(),
                location: field(self.columns.location).to_string(),
                experience_level: field(self.columns.experience_level).to_string(),
                salary: parse_salary(field(self.columns.salary)),
                industry,
            },
            required_skills: field(self.columns.required_skills).to_string(),
        })
    }
}

impl<R: io::Read> Iterator for RowReader<R> {
    type Item = Result<NormalizedRow, RowParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;

        Some(match record {
            Ok(record) => self.normalize(&record),
            Err(e) => Err(RowParseError::malformed(self.row, e.to_string())),
        })
    }
}

fn builder(config: &ReaderConfig) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(config.delimiter).trim(csv::Trim::All);
    builder
}

/// Rows read into memory by [`load_all`].
#[derive(Debug, Clone, Default)]
pub struct LoadedRows {
    pub rows: Vec<NormalizedRow>,
    /// Rows dropped under [`RowErrorPolicy::Skip`].
    pub skipped: usize,
}

/// Read the whole file into memory, applying the configured row policy.
pub fn load_all(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<LoadedRows, PipelineError> {
    let mut loaded = LoadedRows::default();

    for result in RowReader::from_path(path, config)? {
        match result {
            Ok(row) => loaded.rows.push(row),
            Err(e) => {
                config.policy.handle(e)?;
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "Job Title,Company,Location,Experience Level,Salary,Industry,Required Skills\n";

    fn read(body: &str) -> Vec<Result<NormalizedRow, RowParseError>> {
        let csv = format!("{}{}", HEADER, body);
        RowReader::from_reader(csv.as_bytes(), &ReaderConfig::default())
            .unwrap()
            .collect()
    }

    #[test]
    fn test_parse_salary() {
        assert_eq!(parse_salary("85000"), 85_000);
        assert_eq!(parse_salary(" 72000.9 "), 72_000);
        assert_eq!(parse_salary("-10.5"), -10);
        assert_eq!(parse_salary("1e3"), 1000);
        assert_eq!(parse_salary(""), 0);
        assert_eq!(parse_salary("n/a"), 0);
        assert_eq!(parse_salary("NaN"), 0);
        assert_eq!(parse_salary("inf"), 0);
    }

    #[test]
    fn test_parse_salary_beyond_32_bits() {
        assert_eq!(parse_salary("3000000000"), 3_000_000_000);
        assert_eq!(parse_salary("1e300"), i64::MAX);
        assert_eq!(parse_salary("-1e300"), i64::MIN);
    }

    #[test]
    fn test_normalizes_row() {
        let rows = read("  Engineer , Acme,Berlin,Senior,95000.5,Software,\"Go, SQL\"\n");

        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.row, 1);
        assert_eq!(row.job.title, "Engineer");
        assert_eq!(row.job.company, "Acme");
        assert_eq!(row.job.salary, 95_000);
        assert_eq!(row.job.industry, Industry::Software);
        assert_eq!(row.required_skills, "Go, SQL");
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let rows = read("Engineer,Acme,,,abc,finance,\n");

        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.job.location, "");
        assert_eq!(row.job.experience_level, "");
        assert_eq!(row.job.salary, 0);
        assert_eq!(row.job.industry, Industry::Finance);
        assert_eq!(row.required_skills, "");
    }

    #[test]
    fn test_missing_required_fields() {
        let rows = read(",Acme,Berlin,Mid,1,Software,Go\nEngineer, ,Berlin,Mid,1,Software,Go\n");

        assert_eq!(rows[0], Err(RowParseError::missing_field(1, COLUMN_TITLE)));
        assert_eq!(rows[1], Err(RowParseError::missing_field(2, COLUMN_COMPANY)));
    }

    #[test]
    fn test_unknown_industry() {
        let rows = read("Engineer,Acme,Berlin,Mid,1,Aerospace,Go\n");

        assert!(matches!(rows[0], Err(RowParseError::UnknownIndustry { row: 1, .. })));
    }

    #[test]
    fn test_unreadable_record() {
        let rows = read("Engineer,Acme\nTeacher,School,Oslo,Mid,1,Education,Math\n");

        assert!(matches!(rows[0], Err(RowParseError::Malformed { row: 1, .. })));
        assert!(rows[1].is_ok());
    }

    #[test]
    fn test_skips_blank_lines() {
        let rows = read("\nEngineer,Acme,Berlin,Mid,1,Software,Go\n\n");

        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }

    #[test]
    fn test_missing_header_column_fails_each_row() {
        let csv = "Job Title,Company,Location\nEngineer,Acme,Berlin\n";
        let rows: Vec<_> = RowReader::from_reader(csv.as_bytes(), &ReaderConfig::default())
            .unwrap()
            .collect();

        assert_eq!(rows[0], Err(RowParseError::missing_field(1, COLUMN_INDUSTRY)));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Skip".parse::<RowErrorPolicy>().unwrap(), RowErrorPolicy::Skip);
        assert_eq!(" abort ".parse::<RowErrorPolicy>().unwrap(), RowErrorPolicy::Abort);
        assert!("ignore".parse::<RowErrorPolicy>().is_err());
    }

    #[test]
    fn test_load_all_skip_and_abort() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}Engineer,Acme,Berlin,Mid,1,Software,Go\nBad,Row,Oslo,Mid,1,Space,Go\n",
            HEADER
        )
        .unwrap();

        let loaded = load_all(file.path(), &ReaderConfig::default()).unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.skipped, 1);

        let abort = ReaderConfig {
            policy: RowErrorPolicy::Abort,
            ..ReaderConfig::default()
        };
        let result = load_all(file.path(), &abort);
        assert!(matches!(
            result,
            Err(PipelineError::RowParse(RowParseError::UnknownIndustry { row: 2, .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = RowReader::from_path("/nonexistent/jobs.csv", &ReaderConfig::default());
        assert!(matches!(result, Err(PipelineError::Csv(_))));
    }
}
