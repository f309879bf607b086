use std::path::PathBuf;

use thiserror::Error;

/// Errors turning one XML document into an [`InvoiceRecord`](super::InvoiceRecord).
///
/// These are per-file conditions: the reconciler records them in the run
/// report and moves on to the next document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The document is not well-formed XML or is not a CFDI Comprobante.
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// A field the ledger cannot do without is absent or empty.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: &'static str },
}

impl ExtractError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}

/// Run-fatal errors. Anything here aborts the whole run; the persisted
/// ledger file is left exactly as it was.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The ledger workbook could not be opened or read.
    #[error("could not open ledger workbook {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// The updated workbook could not be written back.
    #[error("could not save ledger workbook {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    /// A pre-existing row has a date cell that cannot be parsed.
    ///
    /// Only raised under [`DatePolicy::Strict`](super::DatePolicy::Strict);
    /// the default policy records a warning and defers the row instead.
    #[error("unparsable date {value:?} in sheet '{sheet}' row {row}")]
    UnparsableExistingDate {
        sheet: String,
        row: usize,
        value: String,
    },

    /// The invoice folder tree could not be traversed.
    #[error("could not read folder {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
