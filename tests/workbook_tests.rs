#![cfg(feature = "xlsx")]

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use conciliador::core::{COLUMNS, DatePolicy, Highlight, LedgerError, RunConfig};
use conciliador::ledger::{self, LedgerIndex, RunReport};
use conciliador::xlsx::{CellValue, LedgerBook};
use rust_xlsxwriter::{Color, Format, Workbook};
use tempfile::TempDir;

const YELLOW: u32 = 0xFFF59D;
const RED: u32 = 0xEF9A9A;

fn dt(m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, m, d)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

struct SeedRow<'a> {
    date: Option<&'a str>,
    uuid: &'a str,
    employee: &'a str,
    fill: Option<u32>,
}

/// Build a ledger workbook fixture: one month sheet plus an unrelated sheet.
fn seed_ledger(path: &Path, sheet_name: &str, rows: &[SeedRow<'_>]) {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    for (c, header) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, c as u16, *header).unwrap();
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        let format = match row.fill {
            Some(rgb) => Format::new().set_background_color(Color::RGB(rgb)),
            None => Format::new(),
        };
        if let Some(date) = row.date {
            match NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
                Ok(parsed) => {
                    let date_format = format.clone().set_num_format("yyyy-mm-dd hh:mm");
                    sheet.write_datetime_with_format(r, 0, &parsed, &date_format).unwrap();
                }
                Err(_) => {
                    sheet.write_string_with_format(r, 0, date, &format).unwrap();
                }
            }
        }
        sheet.write_string_with_format(r, 1, "Proveedor SA", &format).unwrap();
        sheet.write_string_with_format(r, 2, "PRO990101AAA", &format).unwrap();
        sheet.write_string_with_format(r, 3, "A-1", &format).unwrap();
        sheet.write_string_with_format(r, 4, row.uuid, &format).unwrap();
        sheet.write_string_with_format(r, 5, "PAPELERIA", &format).unwrap();
        for c in 6..10 {
            sheet.write_number_with_format(r, c, 100.0, &format).unwrap();
        }
        sheet.write_string_with_format(r, 10, "", &format).unwrap();
        sheet.write_string_with_format(r, 11, row.employee, &format).unwrap();
    }

    let notes = workbook.add_worksheet();
    notes.set_name("Notas").unwrap();
    notes.write_string(0, 0, "recordatorio interno").unwrap();
    notes.write_number(1, 1, 42.5).unwrap();

    workbook.save(path).unwrap();
}

fn invoice_xml(fecha: &str, uuid: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4" Version="4.0"
    Fecha="{fecha}" Folio="9" SubTotal="100.00" Total="116.00">
  <cfdi:Emisor Rfc="PRO990101AAA" Nombre="Proveedor SA"/>
  <cfdi:Receptor Rfc="MES2301274X9" UsoCFDI="G03"/>
  <cfdi:Conceptos><cfdi:Concepto ClaveProdServ="44121700" Importe="100.00"/></cfdi:Conceptos>
  <cfdi:Impuestos><cfdi:Traslados>
    <cfdi:Traslado Impuesto="002" Importe="16.00"/>
  </cfdi:Traslados></cfdi:Impuestos>
  <cfdi:Complemento>
    <tfd:TimbreFiscalDigital xmlns:tfd="http://www.sat.gob.mx/TimbreFiscalDigital" UUID="{uuid}"/>
  </cfdi:Complemento>
</cfdi:Comprobante>"#
    )
}

fn write_invoice(root: &Path, month: &str, employee: &str, file: &str, xml: &str) {
    let dir = root.join(month).join(employee);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), xml).unwrap();
}

fn column_values(book: &LedgerBook, sheet: &str, col: usize) -> Vec<String> {
    book.sheet(sheet)
        .unwrap()
        .cells
        .iter()
        .skip(1)
        .map(|row| match row.get(col) {
            Some(CellValue::Text(s)) => s.clone(),
            Some(CellValue::Number(f)) => f.to_string(),
            Some(CellValue::DateTime(dt)) => dt.to_string(),
            _ => String::new(),
        })
        .collect()
}

// --- Reading ---

#[test]
fn open_recovers_cells_and_fills() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[
            SeedRow { date: Some("2026-01-05T09:00:00"), uuid: "A-1", employee: "Ana", fill: None },
            SeedRow { date: Some("2026-01-08T09:00:00"), uuid: "B-2", employee: "Beto", fill: Some(RED) },
            SeedRow { date: Some("2026-01-09T09:00:00"), uuid: "C-3", employee: "Carla", fill: Some(YELLOW) },
        ],
    );

    let book = LedgerBook::open(&ledger).unwrap();
    let sheet = book.sheet("Enero 2026").unwrap();

    assert_eq!(sheet.row_fill(0), Highlight::None);
    assert_eq!(sheet.row_fill(1), Highlight::None);
    assert_eq!(sheet.row_fill(2), Highlight::Red);
    assert_eq!(sheet.row_fill(3), Highlight::Yellow);
    assert_eq!(
        sheet.cells[1][0],
        CellValue::DateTime(dt(1, 5))
    );
    assert!(book.sheet("Notas").is_some());
}

#[test]
fn from_book_indexes_month_sheets_only() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("2026-01-05T09:00:00"), uuid: "{a-1}", employee: "Ana", fill: None }],
    );

    let book = LedgerBook::open(&ledger).unwrap();
    let config = RunConfig::default();
    let mut report = RunReport::new();
    let index = LedgerIndex::from_book(&book, &config, &mut report).unwrap();

    // Normalized on read, so the lookup matches what extraction produces.
    assert_eq!(index.lookup_uuid("A-1").len(), 1);
    assert!(index.touched_months().is_empty());
    assert!(index.sheet(1).is_some());
}

#[test]
fn unparsable_date_defers_by_default() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[
            SeedRow { date: Some("pendiente"), uuid: "U-1", employee: "Ana", fill: None },
            SeedRow { date: Some("2026-01-20T09:00:00"), uuid: "U-2", employee: "Zoe", fill: None },
        ],
    );

    let book = LedgerBook::open(&ledger).unwrap();
    let config = RunConfig::default();
    let mut report = RunReport::new();
    let index = LedgerIndex::from_book(&book, &config, &mut report).unwrap();

    let rows = index.sheet(1).unwrap().sorted_rows();
    assert_eq!(rows[0].uuid, "U-2");
    assert_eq!(rows[1].uuid, "U-1");
    assert_eq!(rows[1].raw_date.as_deref(), Some("pendiente"));
    assert!(report.entries.iter().any(|e| e.message.contains("pendiente")));
}

#[test]
fn unparsable_date_aborts_under_strict_policy() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("pendiente"), uuid: "U-1", employee: "Ana", fill: None }],
    );

    let book = LedgerBook::open(&ledger).unwrap();
    let config = RunConfig {
        existing_date_policy: DatePolicy::Strict,
        ..RunConfig::default()
    };
    let mut report = RunReport::new();
    let err = LedgerIndex::from_book(&book, &config, &mut report).unwrap_err();
    assert!(matches!(err, LedgerError::UnparsableExistingDate { row: 2, .. }));
}

// --- Full run and write-back ---

#[test]
fn run_files_sorts_and_persists_highlights() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("2026-01-15T09:00:00"), uuid: "OLD-1", employee: "Zoe", fill: None }],
    );

    let root = tmp.path().join("2026");
    write_invoice(&root, "Enero", "Ana", "f1.xml", &invoice_xml("2026-01-10T09:00:00", "NEW-1"));
    // Misfiled: found in Enero, issued in February.
    write_invoice(&root, "Enero", "Ana", "f2.xml", &invoice_xml("2026-02-02T09:00:00", "NEW-2"));

    let report = ledger::run(&root, &ledger, &RunConfig::default()).unwrap();
    assert_eq!(report.counts.filed, 2);
    assert_eq!(report.counts.flagged, 1);

    let book = LedgerBook::open(&ledger).unwrap();

    // Enero re-sorted: Ana's new row before Zoe's pre-existing one.
    let uuids = column_values(&book, "Enero 2026", 4);
    assert_eq!(uuids, ["NEW-1", "OLD-1"]);

    // Febrero created for the misfiled document, flagged yellow.
    let feb = book.sheet("Febrero 2026").unwrap();
    assert_eq!(column_values(&book, "Febrero 2026", 4), ["NEW-2"]);
    assert_eq!(feb.row_fill(1), Highlight::Yellow);

    // Unrelated sheet survives the rewrite.
    let notas = book.sheet("Notas").unwrap();
    assert_eq!(notas.cells[0][0], CellValue::Text("recordatorio interno".into()));
    assert_eq!(notas.cells[1][1], CellValue::Number(42.5));
}

#[test]
fn duplicate_against_existing_row_turns_both_red_on_disk() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("2026-01-15T09:00:00"), uuid: "DUP-1", employee: "Ana", fill: None }],
    );

    let root = tmp.path().join("2026");
    write_invoice(&root, "Enero", "Beto", "f1.xml", &invoice_xml("2026-01-18T09:00:00", "DUP-1"));

    let report = ledger::run(&root, &ledger, &RunConfig::default()).unwrap();
    assert_eq!(report.counts.duplicates, 1);

    let book = LedgerBook::open(&ledger).unwrap();
    let sheet = book.sheet("Enero 2026").unwrap();
    assert_eq!(sheet.row_fill(1), Highlight::Red);
    assert_eq!(sheet.row_fill(2), Highlight::Red);
}

#[test]
fn highlights_survive_a_second_run() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("2026-01-15T09:00:00"), uuid: "DUP-1", employee: "Ana", fill: None }],
    );

    let root = tmp.path().join("2026");
    write_invoice(&root, "Enero", "Beto", "f1.xml", &invoice_xml("2026-01-18T09:00:00", "DUP-1"));
    ledger::run(&root, &ledger, &RunConfig::default()).unwrap();

    // Second run over a different folder must not lose the red marks.
    let other_root = tmp.path().join("otros");
    write_invoice(&other_root, "Marzo", "Ana", "f1.xml", &invoice_xml("2026-03-01T09:00:00", "M-1"));
    ledger::run(&other_root, &ledger, &RunConfig::default()).unwrap();

    let book = LedgerBook::open(&ledger).unwrap();
    let sheet = book.sheet("Enero 2026").unwrap();
    assert_eq!(sheet.row_fill(1), Highlight::Red);
    assert_eq!(sheet.row_fill(2), Highlight::Red);
    assert_eq!(column_values(&book, "Marzo 2026", 4), ["M-1"]);
}

#[test]
fn simulation_leaves_the_file_untouched() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");
    seed_ledger(
        &ledger,
        "Enero 2026",
        &[SeedRow { date: Some("2026-01-15T09:00:00"), uuid: "OLD-1", employee: "Ana", fill: None }],
    );
    let before = fs::read(&ledger).unwrap();

    let root = tmp.path().join("2026");
    write_invoice(&root, "Enero", "Ana", "f1.xml", &invoice_xml("2026-01-10T09:00:00", "NEW-1"));

    let config = RunConfig {
        simulate_only: true,
        ..RunConfig::default()
    };
    let report = ledger::run(&root, &ledger, &config).unwrap();

    assert_eq!(report.counts.filed, 1);
    assert_eq!(fs::read(&ledger).unwrap(), before);

    // A real run over the same inputs produces an identical report.
    let real = ledger::run(&root, &ledger, &RunConfig::default()).unwrap();
    assert_eq!(real.counts, report.counts);
    assert_eq!(real.entries, report.entries);
}

#[test]
fn month_named_sheet_without_ledger_header_is_preserved() {
    let tmp = TempDir::new().unwrap();
    let ledger = tmp.path().join("control.xlsx");

    // A sheet that borrows a month name but holds unrelated content.
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Enero 2026").unwrap();
    sheet.write_string(0, 0, "contenido importante").unwrap();
    sheet.write_number(3, 2, 12345.0).unwrap();
    workbook.save(&ledger).unwrap();

    let root = tmp.path().join("2026");
    write_invoice(&root, "Enero", "Ana", "f1.xml", &invoice_xml("2026-01-10T09:00:00", "NEW-1"));

    let report = ledger::run(&root, &ledger, &RunConfig::default()).unwrap();
    assert_eq!(report.counts.filed, 1);

    let book = LedgerBook::open(&ledger).unwrap();

    let kept = book.sheet("Enero 2026").unwrap();
    assert_eq!(kept.cells[0][0], CellValue::Text("contenido importante".into()));
    assert_eq!(kept.cells[3][2], CellValue::Number(12345.0));

    // The filed row lands in a fresh sheet with a deduplicated name.
    assert_eq!(column_values(&book, "Enero 2026 (2)", 4), ["NEW-1"]);
}

#[test]
fn missing_ledger_file_is_an_open_error() {
    let tmp = TempDir::new().unwrap();
    let err = LedgerBook::open(&tmp.path().join("nope.xlsx")).unwrap_err();
    assert!(matches!(err, LedgerError::Open { .. }));
}
