use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use crate::core::{COLUMNS, Highlight, LedgerError, LedgerRow, MonthSheet, months};
use crate::ledger::LedgerIndex;

use super::read::{CellValue, LedgerBook, RawSheet};

const YELLOW: u32 = 0xFFF59D;
const RED: u32 = 0xEF9A9A;
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm";
const AMOUNT_FORMAT: &str = "#,##0.00";

/// Write the reconciled ledger back to `path`.
///
/// Touched month sheets are re-sorted and rendered from the index. Every
/// other sheet, untouched months and unrelated sheets alike, is written
/// cell-for-cell from what was read at run start, in the original sheet
/// order. The workbook lands in a temp file first and is renamed over the
/// target, so an interrupted run never leaves a half-written ledger.
pub fn write_ledger(
    book: &LedgerBook,
    index: &LedgerIndex,
    path: &Path,
    year: i32,
) -> Result<(), LedgerError> {
    let save_err = |reason: String| LedgerError::Save {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = Workbook::new();
    let formats = CellFormats::new();

    let mut months_rendered = Vec::new();
    for raw in &book.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&raw.name)
            .map_err(|e| save_err(e.to_string()))?;

        // Only a real ledger sheet may be replaced by the index; a sheet
        // that merely shares a month name keeps its content.
        match months::parse_sheet_name(&raw.name, year) {
            Some(month) if raw.is_ledger_sheet() => {
                months_rendered.push(month);
                match index.sheet(month) {
                    Some(sheet) if sheet.is_touched() => {
                        render_month_sheet(worksheet, sheet, &formats)
                            .map_err(|e| save_err(e.to_string()))?;
                    }
                    _ => copy_raw_sheet(worksheet, raw, &formats)
                        .map_err(|e| save_err(e.to_string()))?,
                }
            }
            _ => copy_raw_sheet(worksheet, raw, &formats)
                .map_err(|e| save_err(e.to_string()))?,
        }
    }

    // Months that gained their first rows this run get fresh sheets,
    // appended in calendar order. A name collision with a non-ledger sheet
    // gets a numbered suffix rather than overwriting it.
    let taken: Vec<&str> = book.sheets.iter().map(|s| s.name.as_str()).collect();
    for (month, sheet) in index.sheets() {
        if months_rendered.contains(&month) || !sheet.is_touched() {
            continue;
        }
        let name = unique_sheet_name(month, year, &taken);
        if name != months::sheet_name(month, year) {
            warn!(
                target: "conciliador",
                sheet = %name,
                "month sheet name already used by non-ledger content"
            );
        }
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(name)
            .map_err(|e| save_err(e.to_string()))?;
        render_month_sheet(worksheet, sheet, &formats).map_err(|e| save_err(e.to_string()))?;
    }

    let temp = path.with_extension("xlsx.tmp");
    workbook.save(&temp).map_err(|e| save_err(e.to_string()))?;
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        save_err(e.to_string())
    })?;
    debug!(target: "conciliador", path = %path.display(), "ledger workbook saved");
    Ok(())
}

fn unique_sheet_name(month: u32, year: i32, taken: &[&str]) -> String {
    let base = months::sheet_name(month, year);
    if !taken.contains(&base.as_str()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base} ({n})");
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

struct CellFormats {
    header: Format,
    text: [Format; 3],
    date: [Format; 3],
    amount: [Format; 3],
}

impl CellFormats {
    fn new() -> Self {
        let fill = |f: Format, h: usize| match h {
            1 => f.set_background_color(Color::RGB(YELLOW)),
            2 => f.set_background_color(Color::RGB(RED)),
            _ => f,
        };
        Self {
            header: Format::new().set_bold(),
            text: std::array::from_fn(|h| fill(Format::new(), h)),
            date: std::array::from_fn(|h| fill(Format::new().set_num_format(DATE_FORMAT), h)),
            amount: std::array::from_fn(|h| fill(Format::new().set_num_format(AMOUNT_FORMAT), h)),
        }
    }

    fn slot(highlight: Highlight) -> usize {
        match highlight {
            Highlight::None => 0,
            Highlight::Yellow => 1,
            Highlight::Red => 2,
        }
    }
}

fn render_month_sheet(
    worksheet: &mut Worksheet,
    sheet: &MonthSheet,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
    }
    worksheet.autofilter(0, 0, 0, COLUMNS.len() as u16 - 1)?;

    for (i, row) in sheet.sorted_rows().iter().enumerate() {
        write_ledger_row(worksheet, i as u32 + 1, row, formats)?;
    }
    Ok(())
}

fn write_ledger_row(
    worksheet: &mut Worksheet,
    r: u32,
    row: &LedgerRow,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    let h = CellFormats::slot(row.highlight);
    let text = &formats.text[h];
    let amount = &formats.amount[h];

    match (row.issue_date, row.raw_date.as_deref()) {
        (Some(date), _) => {
            worksheet.write_datetime_with_format(r, 0, &date, &formats.date[h])?;
        }
        // Unordered row: keep whatever the date cell held.
        (None, Some(raw)) => {
            worksheet.write_string_with_format(r, 0, raw, text)?;
        }
        (None, None) => {
            worksheet.write_blank(r, 0, text)?;
        }
    }

    worksheet.write_string_with_format(r, 1, &row.issuer_name, text)?;
    worksheet.write_string_with_format(r, 2, &row.issuer_rfc, text)?;
    worksheet.write_string_with_format(r, 3, &row.folio, text)?;
    worksheet.write_string_with_format(r, 4, &row.uuid, text)?;
    worksheet.write_string_with_format(r, 5, &row.concept, text)?;
    worksheet.write_number_with_format(r, 6, decimal_cell(&row.subtotal), amount)?;
    worksheet.write_number_with_format(r, 7, decimal_cell(&row.iva), amount)?;
    worksheet.write_number_with_format(r, 8, decimal_cell(&row.otros_impuestos), amount)?;
    worksheet.write_number_with_format(r, 9, decimal_cell(&row.total), amount)?;
    // Comentarios is always blank on write; it belongs to whoever reviews
    // the sheet by hand.
    worksheet.write_string_with_format(r, 10, "", text)?;
    worksheet.write_string_with_format(r, 11, &row.employee, text)?;
    Ok(())
}

fn decimal_cell(d: &rust_decimal::Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn copy_raw_sheet(
    worksheet: &mut Worksheet,
    raw: &RawSheet,
    formats: &CellFormats,
) -> Result<(), XlsxError> {
    for (r, cells) in raw.cells.iter().enumerate() {
        let h = CellFormats::slot(raw.row_fill(r));
        let text = &formats.text[h];
        for (c, cell) in cells.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                CellValue::Empty => {
                    if h != 0 {
                        worksheet.write_blank(r, c, text)?;
                    }
                }
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(r, c, s, text)?;
                }
                CellValue::Number(f) => {
                    worksheet.write_number_with_format(r, c, *f, text)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(r, c, dt, &formats.date[h])?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean_with_format(r, c, *b, text)?;
                }
            }
        }
    }
    Ok(())
}
