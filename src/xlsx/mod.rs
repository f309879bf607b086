//! Workbook persistence for the ledger.
//!
//! Reading goes through calamine for cell values and through the raw zip
//! parts for row highlights, which calamine does not expose. Writing rebuilds
//! the whole workbook with rust_xlsxwriter and replaces the file atomically.

mod fills;
mod read;
mod write;

pub use read::{CellValue, LedgerBook, RawSheet};
pub use write::write_ledger;
