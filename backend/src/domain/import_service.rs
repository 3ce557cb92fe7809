//! Roster import for the gelt calculator.
//!
//! Accepts CSV text with either `First Name, Last Name, Age` or
//! `Full Name, Age` columns. Every row yields an explicit outcome, so the
//! caller (and the user) can see how many rows were accepted and exactly why
//! the rest were dropped, instead of a binary success/failure.

use std::fmt;

use anyhow::{anyhow, Result};
use log::{info, warn};

use crate::domain::models::birthday::Birthday;
use crate::domain::models::child::Child;

/// Why an import row was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RowRejection {
    MissingName,
    MissingAge,
    UnparsableAge(String),
    NegativeAge(i64),
    AgeOutOfRange(i64),
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingName => write!(f, "Missing name"),
            RowRejection::MissingAge => write!(f, "Missing age"),
            RowRejection::UnparsableAge(raw) => write!(f, "Age is not a number: '{}'", raw),
            RowRejection::NegativeAge(age) => write!(f, "Age must not be negative: {}", age),
            RowRejection::AgeOutOfRange(age) => write!(f, "Age is out of range: {}", age),
        }
    }
}

/// A dropped row with its 1-based line number (the header is line 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: RowRejection,
}

/// Result of parsing an import file: the accepted children plus the
/// per-row rejections.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub children: Vec<Child>,
    pub rejected: Vec<RejectedRow>,
}

impl ImportReport {
    pub fn accepted_count(&self) -> usize {
        self.children.len()
    }
}

/// Service for building a gelt roster from external data.
#[derive(Clone, Default)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    /// Parse CSV text into an import report.
    ///
    /// Returns an error only when the file itself is unusable (unreadable CSV
    /// or zero accepted rows); individual bad rows land in the report.
    pub fn parse_children_csv(&self, csv_content: &str) -> Result<ImportReport> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv_content.as_bytes());

        let headers = reader.headers()?.clone();
        let full_name_idx = column_index(&headers, "Full Name");
        let first_name_idx = column_index(&headers, "First Name");
        let last_name_idx = column_index(&headers, "Last Name");
        let age_idx = column_index(&headers, "Age");

        let mut children = Vec::new();
        let mut rejected = Vec::new();

        for (i, record) in reader.records().enumerate() {
            let line = i + 2; // header is line 1
            let record = record?;

            let name = extract_name(&record, full_name_idx, first_name_idx, last_name_idx);
            let (first_name, last_name) = match name {
                Some(parts) => parts,
                None => {
                    rejected.push(RejectedRow {
                        line,
                        reason: RowRejection::MissingName,
                    });
                    continue;
                }
            };

            let age = match parse_age(&record, age_idx) {
                Ok(age) => age,
                Err(reason) => {
                    rejected.push(RejectedRow { line, reason });
                    continue;
                }
            };

            children.push(Child::new(first_name, last_name, age));
        }

        if children.is_empty() {
            warn!(
                "CSV import produced no valid rows ({} rejected)",
                rejected.len()
            );
            return Err(anyhow!("No valid data found in CSV file"));
        }

        info!(
            "Parsed CSV import: {} accepted, {} rejected",
            children.len(),
            rejected.len()
        );
        Ok(ImportReport { children, rejected })
    }

    /// Build a gelt roster from the birthday list; archived entries are
    /// skipped.
    pub fn children_from_birthdays(&self, birthdays: &[Birthday]) -> Vec<Child> {
        let children: Vec<Child> = birthdays
            .iter()
            .filter(|b| !b.archived)
            .map(|b| Child::new(b.first_name.clone(), b.last_name.clone(), b.age))
            .collect();
        info!(
            "Imported {} children from {} birthday entries",
            children.len(),
            birthdays.len()
        );
        children
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

/// Pull the name columns out of a record. "Full Name" wins when present;
/// the first whitespace splits first from last name.
fn extract_name(
    record: &csv::StringRecord,
    full_name_idx: Option<usize>,
    first_name_idx: Option<usize>,
    last_name_idx: Option<usize>,
) -> Option<(String, String)> {
    if let Some(idx) = full_name_idx {
        let full = record.get(idx).unwrap_or("").trim();
        if !full.is_empty() {
            let mut parts = full.split_whitespace();
            let first = parts.next().unwrap_or("").to_string();
            let last = parts.collect::<Vec<_>>().join(" ");
            return Some((first, last));
        }
    }

    let first = first_name_idx
        .and_then(|idx| record.get(idx))
        .unwrap_or("")
        .trim()
        .to_string();
    if first.is_empty() {
        return None;
    }
    let last = last_name_idx
        .and_then(|idx| record.get(idx))
        .unwrap_or("")
        .trim()
        .to_string();
    Some((first, last))
}

fn parse_age(record: &csv::StringRecord, age_idx: Option<usize>) -> Result<u32, RowRejection> {
    let raw = age_idx
        .and_then(|idx| record.get(idx))
        .unwrap_or("")
        .trim();
    if raw.is_empty() {
        return Err(RowRejection::MissingAge);
    }
    let age: i64 = raw
        .parse()
        .map_err(|_| RowRejection::UnparsableAge(raw.to_string()))?;
    if age < 0 {
        return Err(RowRejection::NegativeAge(age));
    }
    if age > i64::from(u32::MAX) {
        return Err(RowRejection::AgeOutOfRange(age));
    }
    Ok(age as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use shared::Gender;

    #[test]
    fn test_import_with_separate_name_columns() {
        let csv = "First Name,Last Name,Age\nAvi,Mizrahi,5\nBatya,Mizrahi,15\n";
        let report = ImportService::new().parse_children_csv(csv).unwrap();

        assert_eq!(report.accepted_count(), 2);
        assert!(report.rejected.is_empty());
        assert_eq!(report.children[0].first_name, "Avi");
        assert_eq!(report.children[0].last_name, "Mizrahi");
        assert_eq!(report.children[1].age, 15);
    }

    #[test]
    fn test_import_with_full_name_column() {
        let csv = "Full Name,Age\nAvi Ben Mizrahi,5\nBatya,3\n";
        let report = ImportService::new().parse_children_csv(csv).unwrap();

        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.children[0].first_name, "Avi");
        assert_eq!(report.children[0].last_name, "Ben Mizrahi");
        // A single-token full name leaves the last name empty
        assert_eq!(report.children[1].first_name, "Batya");
        assert_eq!(report.children[1].last_name, "");
    }

    #[test]
    fn test_bad_rows_are_reported_with_line_and_reason() {
        let csv = "First Name,Last Name,Age\n\
                   Avi,Mizrahi,5\n\
                   ,Mizrahi,7\n\
                   Batya,Mizrahi,\n\
                   Chaim,Mizrahi,five\n\
                   Dina,Mizrahi,-2\n";
        let report = ImportService::new().parse_children_csv(csv).unwrap();

        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.rejected.len(), 4);
        assert_eq!(report.rejected[0].line, 3);
        assert_eq!(report.rejected[0].reason, RowRejection::MissingName);
        assert_eq!(report.rejected[1].line, 4);
        assert_eq!(report.rejected[1].reason, RowRejection::MissingAge);
        assert_eq!(
            report.rejected[2].reason,
            RowRejection::UnparsableAge("five".to_string())
        );
        assert_eq!(report.rejected[3].reason, RowRejection::NegativeAge(-2));
    }

    #[test]
    fn test_age_beyond_u32_is_rejected_not_wrapped() {
        let csv = "First Name,Last Name,Age\nAvi,Mizrahi,4294967296\nBatya,Mizrahi,5\n";
        let report = ImportService::new().parse_children_csv(csv).unwrap();

        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 2);
        assert_eq!(report.rejected[0].reason, RowRejection::AgeOutOfRange(4294967296));
    }

    #[test]
    fn test_age_zero_is_valid() {
        let csv = "First Name,Last Name,Age\nTinok,Mizrahi,0\n";
        let report = ImportService::new().parse_children_csv(csv).unwrap();
        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.children[0].age, 0);
    }

    #[test]
    fn test_no_valid_rows_is_an_error() {
        let csv = "First Name,Last Name,Age\n,x,\n,y,\n";
        let err = ImportService::new().parse_children_csv(csv).unwrap_err();
        assert!(err.to_string().contains("No valid data"));
    }

    #[test]
    fn test_missing_age_column_rejects_every_row() {
        let csv = "First Name,Last Name\nAvi,Mizrahi\n";
        let err = ImportService::new().parse_children_csv(csv).unwrap_err();
        assert!(err.to_string().contains("No valid data"));
    }

    #[test]
    fn test_children_from_birthdays_skips_archived() {
        let now = Utc::now();
        let make = |first: &str, age: u32, archived: bool| Birthday {
            id: Birthday::generate_id(1),
            first_name: first.to_string(),
            last_name: "Katz".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            after_sunset: false,
            gender: Gender::Unknown,
            hebrew_date: None,
            next_birthday: None,
            age,
            archived,
            created_at: now,
            updated_at: now,
        };
        let birthdays = vec![make("Noam", 10, false), make("Yael", 8, true)];

        let children = ImportService::new().children_from_birthdays(&birthdays);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].first_name, "Noam");
        assert_eq!(children[0].age, 10);
    }
}
