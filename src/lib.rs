//! # conciliador
//!
//! CFDI 4.0 reconciliation engine: walks a year's folder tree of invoice
//! XML, extracts each document, validates it against the company's fiscal
//! profile, and files it into the month sheets of an Excel control ledger.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Cross-month duplicate detection, receiver/year validation, and misfiled
//! document flagging follow the SAT CFDI 4.0 document model.
//!
//! ## Quick Start
//!
//! ```no_run
//! use conciliador::core::RunConfig;
//! use conciliador::ledger;
//!
//! # fn main() -> Result<(), conciliador::core::LedgerError> {
//! let config = RunConfig::default();
//! let report = ledger::run(
//!     "./2026".as_ref(),
//!     "./FICHERO_CONTROL_2026.xlsx".as_ref(),
//!     &config,
//! )?;
//! for entry in &report.entries {
//!     println!("{}: {}", entry.severity, entry.message);
//! }
//! println!("filed {} of {} documents", report.counts.filed, report.counts.processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Record/row types, month catalog, category mapping, validation |
//! | `cfdi` | CFDI 4.0 XML extraction |
//! | `ledger` | Folder discovery, ledger index, reconciliation pipeline |
//! | `xlsx` (default) | Excel workbook read/write with highlight persistence |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "cfdi")]
pub mod cfdi;

#[cfg(feature = "ledger")]
pub mod ledger;

#[cfg(feature = "xlsx")]
pub mod xlsx;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
