use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::months;
use super::types::InvoiceRecord;

/// Report entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One business-rule finding on an extracted record.
///
/// Findings never block filing — the record lands in its sheet regardless,
/// so problems stay visible instead of silently dropping data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Finding {
    /// Receptor RFC differs from the organization's RFC.
    ReceiverMismatch { found: String, expected: String },
    /// Issue date falls outside the configured fiscal year.
    DateOutOfYear { date: NaiveDateTime, year: i32 },
    /// Calendar month of the issue date differs from the folder the file was
    /// in. The record is filed under its date's month and flagged yellow.
    FolderDateMismatch { folder: String, date_month: u32 },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::ReceiverMismatch { .. } | Finding::DateOutOfYear { .. } => Severity::Error,
            Finding::FolderDateMismatch { .. } => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::ReceiverMismatch { found, expected } => {
                write!(f, "receiver RFC '{found}' does not match expected '{expected}'")
            }
            Finding::DateOutOfYear { date, year } => {
                write!(f, "issue date {} outside fiscal year {year}", date.date())
            }
            Finding::FolderDateMismatch { folder, date_month } => {
                write!(
                    f,
                    "found in folder '{folder}' but issued in {}",
                    months::month_name(*date_month).unwrap_or("?")
                )
            }
        }
    }
}

/// Apply the business rules to one record. Returns every finding, not just
/// the first: a document can mismatch the receiver AND fall outside the year,
/// and both belong in the report.
pub fn validate_record(
    record: &InvoiceRecord,
    expected_receiver_rfc: &str,
    fiscal_year: i32,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    if record.receiver_rfc != expected_receiver_rfc {
        findings.push(Finding::ReceiverMismatch {
            found: record.receiver_rfc.clone(),
            expected: expected_receiver_rfc.to_string(),
        });
    }

    if record.issue_date.year() != fiscal_year {
        findings.push(Finding::DateOutOfYear {
            date: record.issue_date,
            year: fiscal_year,
        });
    }

    let date_month = record.issue_date.month();
    if months::month_number(&record.source_month) != Some(date_month) {
        findings.push(Finding::FolderDateMismatch {
            folder: record.source_month.clone(),
            date_month,
        });
    }

    findings
}
