//! The reconciliation engine: folder discovery, the in-memory ledger index,
//! the per-file pipeline, and the run report handed back to the caller.
//!
//! # Example
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
//! println!("filed {} of {} documents", report.counts.filed, report.counts.processed);
//! # Ok(())
//! # }
//! ```

mod discover;
mod index;
mod reconcile;
mod report;

pub use discover::{DiscoveredFile, discover_invoices};
pub use index::LedgerIndex;
#[cfg(feature = "xlsx")]
pub use reconcile::{run, run_with_progress};
pub use reconcile::{ProgressFn, reconcile, reconcile_with_progress};
pub use report::{Counts, ReportEntry, RunReport};
