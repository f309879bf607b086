use std::path::Path;

use chrono::Datelike;
use tracing::debug;

use crate::cfdi::{SourceContext, extract_invoice};
use crate::core::{Finding, LedgerError, LedgerRow, RunConfig, months};

use super::discover::{DiscoveredFile, discover_invoices};
use super::index::LedgerIndex;
use super::report::RunReport;

/// Per-file progress callback; invoked after each document is dealt with.
pub type ProgressFn<'a> = dyn FnMut(&Path) + 'a;

/// Reconcile every XML document under `root` into `index`.
///
/// Per-file failures never abort the run; they become report entries and the
/// next file is processed. Only folder-traversal failure is fatal here, since
/// workbook I/O happens before and after this call.
pub fn reconcile(
    root: &Path,
    index: &mut LedgerIndex,
    config: &RunConfig,
    report: &mut RunReport,
) -> Result<(), LedgerError> {
    reconcile_with_progress(root, index, config, report, None)
}

/// [`reconcile`] with an optional per-file progress callback.
pub fn reconcile_with_progress(
    root: &Path,
    index: &mut LedgerIndex,
    config: &RunConfig,
    report: &mut RunReport,
    mut progress: Option<&mut ProgressFn<'_>>,
) -> Result<(), LedgerError> {
    let files = discover_invoices(root)?;
    debug!(target: "conciliador", count = files.len(), "documents discovered");

    for file in &files {
        process_file(file, index, config, report);
        if let Some(cb) = progress.as_deref_mut() {
            cb(&file.path);
        }
    }
    Ok(())
}

fn process_file(
    file: &DiscoveredFile,
    index: &mut LedgerIndex,
    config: &RunConfig,
    report: &mut RunReport,
) {
    report.counts.processed += 1;

    let xml = match std::fs::read_to_string(&file.path) {
        Ok(xml) => xml,
        Err(e) => {
            report.error(format!("could not read file: {e}"), Some(&file.path));
            return;
        }
    };

    let ctx = SourceContext {
        employee: &file.employee,
        source_month: &file.month_folder,
        source_path: &file.path,
    };
    let record = match extract_invoice(&xml, ctx, config) {
        Ok(record) => record,
        Err(e) => {
            report.error(e.to_string(), Some(&file.path));
            return;
        }
    };

    let findings = crate::core::validate_record(
        &record,
        &config.expected_receiver_rfc,
        config.fiscal_year,
    );

    // Duplicate check is global: a misfiled duplicate may sit in any month.
    let existing = index.lookup_uuid(&record.uuid).to_vec();

    // Target sheet follows the issue date, never the folder.
    let target_month = record.issue_date.month();
    let new_loc = index.insert(target_month, LedgerRow::from_record(&record));

    if !existing.is_empty() {
        report.counts.duplicates += 1;
        index.mark_duplicate(new_loc);
        let new_sheet = months::sheet_name(target_month, index.year());
        for loc in existing {
            index.mark_duplicate(loc);
            let sheet = months::sheet_name(loc.month, index.year());
            let existing_path = index.row(loc).and_then(|r| r.source_path.clone());
            report.duplicate(
                format!(
                    "duplicate UUID {}: row {} of '{sheet}' matches new row {} of '{new_sheet}' \
                     from {}",
                    record.uuid,
                    loc.row + 1,
                    new_loc.row + 1,
                    file.path.display(),
                ),
                existing_path.as_deref(),
            );
            report.duplicate(
                format!(
                    "duplicate UUID {}: filed as row {} of '{new_sheet}', already present at \
                     row {} of '{sheet}'",
                    record.uuid,
                    new_loc.row + 1,
                    loc.row + 1,
                ),
                Some(&file.path),
            );
        }
    }

    for finding in &findings {
        if let Finding::FolderDateMismatch { .. } = finding {
            // Red from the duplicate check above takes priority.
            index.mark_misfiled(new_loc);
            report.counts.flagged += 1;
        }
        report.finding(finding, &file.path);
    }

    report.counts.filed += 1;
}

/// Full run: open the ledger workbook, build the index, reconcile the folder
/// tree, and write changed sheets back (unless `simulate_only`).
///
/// The caller receives the complete [`RunReport`] for any outcome short of a
/// fatal ledger I/O error; a failed save leaves the persisted file untouched.
#[cfg(feature = "xlsx")]
pub fn run(
    root: &Path,
    ledger_path: &Path,
    config: &RunConfig,
) -> Result<RunReport, LedgerError> {
    run_with_progress(root, ledger_path, config, None)
}

/// [`run`] with an optional per-file progress callback.
#[cfg(feature = "xlsx")]
pub fn run_with_progress(
    root: &Path,
    ledger_path: &Path,
    config: &RunConfig,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<RunReport, LedgerError> {
    use crate::xlsx::{LedgerBook, write_ledger};

    let mut report = RunReport::new();
    let book = LedgerBook::open(ledger_path)?;
    let mut index = LedgerIndex::from_book(&book, config, &mut report)?;

    reconcile_with_progress(root, &mut index, config, &mut report, progress)?;

    // The report must read the same either way; the skipped write is only
    // surfaced through tracing.
    if config.simulate_only {
        tracing::info!(target: "conciliador", "simulation: ledger file left unmodified");
    } else {
        write_ledger(&book, &index, ledger_path, config.fiscal_year)?;
    }
    Ok(report)
}
