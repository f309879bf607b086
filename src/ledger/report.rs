use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::{Finding, Severity};

/// One line of the run transcript. Rendering is the caller's concern; the
/// engine only guarantees order and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub severity: Severity,
    pub message: String,
    pub path: Option<PathBuf>,
}

/// Final tallies for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// XML documents visited, including ones that failed extraction.
    pub processed: usize,
    /// Rows inserted into a month sheet.
    pub filed: usize,
    /// Filed rows whose UUID already existed somewhere in the ledger.
    pub duplicates: usize,
    /// Rows flagged yellow for a folder/date month mismatch.
    pub flagged: usize,
    /// Error-severity entries other than duplicates.
    pub errors: usize,
}

/// Ordered event log plus tallies, returned to the caller whatever the
/// outcome of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
    pub counts: Counts,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>, path: Option<&Path>) {
        let message = message.into();
        info!(target: "conciliador", %message);
        self.push(Severity::Info, message, path);
    }

    pub fn warning(&mut self, message: impl Into<String>, path: Option<&Path>) {
        let message = message.into();
        warn!(target: "conciliador", %message);
        self.push(Severity::Warning, message, path);
    }

    pub fn error(&mut self, message: impl Into<String>, path: Option<&Path>) {
        let message = message.into();
        error!(target: "conciliador", %message);
        self.counts.errors += 1;
        self.push(Severity::Error, message, path);
    }

    /// Record a validation finding against the file that produced it.
    pub fn finding(&mut self, finding: &Finding, path: &Path) {
        match finding.severity() {
            Severity::Error => self.error(finding.to_string(), Some(path)),
            Severity::Warning => self.warning(finding.to_string(), Some(path)),
            Severity::Info => self.info(finding.to_string(), Some(path)),
        }
    }

    /// Duplicate entries carry error severity but tally under
    /// `counts.duplicates`, not `counts.errors`.
    pub fn duplicate(&mut self, message: impl Into<String>, path: Option<&Path>) {
        let message = message.into();
        error!(target: "conciliador", %message);
        self.push(Severity::Error, message, path);
    }

    fn push(&mut self, severity: Severity, message: String, path: Option<&Path>) {
        self.entries.push(ReportEntry {
            severity,
            message,
            path: path.map(Path::to_path_buf),
        });
    }
}
