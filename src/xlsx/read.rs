use std::path::{Path, PathBuf};
use std::str::FromStr;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::{
    COLUMNS, DatePolicy, Highlight, LedgerError, LedgerRow, RunConfig, months, normalize_uuid,
};
use crate::ledger::{LedgerIndex, RunReport};

use super::fills::read_row_fills;

/// A cell as read from the persisted workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }

    fn as_decimal(&self) -> Decimal {
        match self {
            // Re-quantize to shed IEEE noise; CFDI amounts carry ≤ 6 decimals.
            CellValue::Number(f) => Decimal::from_f64_retain(*f)
                .map(|d| d.round_dp(6).normalize())
                .unwrap_or_default(),
            CellValue::Text(s) => Decimal::from_str(s.trim()).unwrap_or_default(),
            _ => Decimal::ZERO,
        }
    }
}

/// One sheet's full cell grid plus recovered row highlights, in file order.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    pub cells: Vec<Vec<CellValue>>,
    pub row_fills: Vec<Highlight>,
}

impl RawSheet {
    pub fn row_fill(&self, row: usize) -> Highlight {
        self.row_fills.get(row).copied().unwrap_or(Highlight::None)
    }

    /// A ledger sheet starts with the standard header row; anything else is
    /// pass-through content even when its name looks like a month.
    pub(crate) fn is_ledger_sheet(&self) -> bool {
        self.cells
            .first()
            .and_then(|row| row.first())
            .is_some_and(|cell| matches!(cell, CellValue::Text(s) if s == COLUMNS[0]))
    }
}

/// The persisted workbook, read once at run start. Sheets the run does not
/// touch are written back from exactly this data.
#[derive(Debug, Clone)]
pub struct LedgerBook {
    pub sheets: Vec<RawSheet>,
    path: PathBuf,
}

impl LedgerBook {
    /// Read every sheet of the workbook. Failure here is fatal to the run.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let open_err = |reason: String| LedgerError::Open {
            path: path.to_path_buf(),
            reason,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| open_err(e.to_string()))?;
        let mut fills = read_row_fills(path)?;

        let names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| open_err(format!("sheet '{name}': {e}")))?;

            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
            for row in range.rows() {
                let mut out = vec![CellValue::Empty; start_col as usize];
                out.extend(row.iter().map(convert_cell));
                cells.push(out);
            }

            let row_fills = fills.remove(&name).unwrap_or_default();
            sheets.push(RawSheet {
                name,
                cells,
                row_fills,
            });
        }
        debug!(target: "conciliador", sheets = sheets.len(), "ledger workbook read");
        Ok(Self {
            sheets,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{e:?}")),
    }
}

impl LedgerIndex {
    /// Build the index from a workbook read at run start.
    ///
    /// Month sheets are recognized by name (`"<Mes> <year>"`) and header;
    /// everything else passes through untouched at write-back. Rows whose
    /// date cell is empty or unparsable become unordered rows under
    /// [`DatePolicy::WarnAndDefer`]; [`DatePolicy::Strict`] aborts instead.
    pub fn from_book(
        book: &LedgerBook,
        config: &RunConfig,
        report: &mut RunReport,
    ) -> Result<Self, LedgerError> {
        let mut index = LedgerIndex::new(config.fiscal_year);

        for sheet in &book.sheets {
            let Some(month) = months::parse_sheet_name(&sheet.name, config.fiscal_year) else {
                continue;
            };
            if !sheet.is_ledger_sheet() {
                continue;
            }

            for (i, cells) in sheet.cells.iter().enumerate().skip(1) {
                if cells.iter().all(CellValue::is_empty) {
                    continue;
                }
                let row = parse_ledger_row(sheet, i, cells, config, report)?;
                index.insert_existing(month, row);
            }
        }
        Ok(index)
    }
}

fn parse_ledger_row(
    sheet: &RawSheet,
    row_idx: usize,
    cells: &[CellValue],
    config: &RunConfig,
    report: &mut RunReport,
) -> Result<LedgerRow, LedgerError> {
    let cell = |c: usize| cells.get(c).cloned().unwrap_or(CellValue::Empty);

    let date_cell = cell(0);
    let (issue_date, raw_date) = match parse_date_cell(&date_cell) {
        Ok(date) => (date, None),
        Err(value) => match config.existing_date_policy {
            DatePolicy::Strict => {
                return Err(LedgerError::UnparsableExistingDate {
                    sheet: sheet.name.clone(),
                    row: row_idx + 1,
                    value,
                });
            }
            DatePolicy::WarnAndDefer => {
                let shown = if value.is_empty() { "<empty>" } else { &value };
                report.warning(
                    format!(
                        "unparsable date {shown} in sheet '{}' row {}; row kept at end of sheet",
                        sheet.name,
                        row_idx + 1,
                    ),
                    None,
                );
                let raw = (!value.is_empty()).then_some(value);
                (None, raw)
            }
        },
    };

    Ok(LedgerRow {
        issue_date,
        raw_date,
        issuer_name: cell(1).as_text(),
        issuer_rfc: cell(2).as_text(),
        folio: cell(3).as_text(),
        uuid: normalize_uuid(&cell(4).as_text()),
        concept: cell(5).as_text(),
        subtotal: cell(6).as_decimal(),
        iva: cell(7).as_decimal(),
        otros_impuestos: cell(8).as_decimal(),
        total: cell(9).as_decimal(),
        comments: String::new(),
        employee: cell(11).as_text(),
        highlight: sheet.row_fill(row_idx),
        source_path: None,
    })
}

/// `Ok` for a usable date, `Err(raw cell text)` otherwise.
fn parse_date_cell(cell: &CellValue) -> Result<Option<NaiveDateTime>, String> {
    match cell {
        CellValue::DateTime(dt) => Ok(Some(*dt)),
        CellValue::Text(s) => {
            let t = s.trim();
            NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S"))
                .map(Some)
                .or_else(|_| {
                    NaiveDate::parse_from_str(t, "%Y-%m-%d")
                        .map(|d| d.and_hms_opt(0, 0, 0))
                })
                .map_err(|_| s.clone())
        }
        CellValue::Empty => Err(String::new()),
        CellValue::Number(f) => Err(f.to_string()),
        CellValue::Bool(b) => Err(b.to_string()),
    }
}
