use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ledger column headers, in sheet order. Every monthly sheet carries exactly
/// these twelve columns; a sheet whose first header differs is not a ledger
/// sheet and is passed through untouched.
pub const COLUMNS: [&str; 12] = [
    "Fecha",
    "Proveedor",
    "Proveedor RFC",
    "Folio Factura",
    "UUID",
    "Concepto",
    "Importe",
    "IVA",
    "Otros Impuestos",
    "Total",
    "Comentarios",
    "Empleado",
];

/// One invoice extracted from a CFDI 4.0 document.
///
/// All monetary values use [`rust_decimal::Decimal`] — never floating point.
/// `employee` and `source_month` come from the folder the file was found in,
/// not from the XML: the folder tree is ground truth for who filed what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Fiscal UUID from the TimbreFiscalDigital complement, normalized
    /// (trimmed, uppercased, braces stripped).
    pub uuid: String,
    /// Comprobante `Fecha` attribute.
    pub issue_date: NaiveDateTime,
    /// Emisor `Nombre`.
    pub issuer_name: String,
    /// Emisor `Rfc`.
    pub issuer_rfc: String,
    /// `Serie`-`Folio`, joined with a dash when both are present.
    pub folio: String,
    /// Receptor `Rfc` — checked against the configured organization RFC.
    pub receiver_rfc: String,
    /// Immediate containing folder name, copied verbatim.
    pub employee: String,
    /// Comprobante `SubTotal`.
    pub subtotal: Decimal,
    /// Sum of document-level Traslado/Retencion amounts with `Impuesto == "002"`.
    pub iva: Decimal,
    /// Sum of all other document-level tax amounts.
    pub otros_impuestos: Decimal,
    /// Comprobante `Total`.
    pub total: Decimal,
    /// `ClaveProdServ` of the first Concepto, raw.
    pub product_code: String,
    /// Human label for `product_code`, or the raw code when unmapped.
    pub concept: String,
    /// Month folder the file was found in.
    pub source_month: String,
    /// Originating document, for traceability.
    pub source_path: PathBuf,
}

/// Row fill color, a presentation attribute rather than a data column.
/// Red (duplicate) always wins over yellow (misfiled month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    #[default]
    None,
    Yellow,
    Red,
}

/// A persisted row in a monthly sheet.
///
/// `issue_date` is `None` for "unordered rows" — pre-existing rows whose date
/// cell was empty or unparsable. They sort after every dated row but are
/// never dropped; `raw_date` preserves whatever text the cell held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub issue_date: Option<NaiveDateTime>,
    pub raw_date: Option<String>,
    pub issuer_name: String,
    pub issuer_rfc: String,
    pub folio: String,
    pub uuid: String,
    pub concept: String,
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub otros_impuestos: Decimal,
    pub total: Decimal,
    /// Always written back blank; reserved for manual annotations.
    pub comments: String,
    pub employee: String,
    pub highlight: Highlight,
    /// Originating XML document, when the row was filed this run.
    pub source_path: Option<PathBuf>,
}

impl LedgerRow {
    /// Build the row that files `record` into a sheet.
    pub fn from_record(record: &InvoiceRecord) -> Self {
        Self {
            issue_date: Some(record.issue_date),
            raw_date: None,
            issuer_name: record.issuer_name.clone(),
            issuer_rfc: record.issuer_rfc.clone(),
            folio: record.folio.clone(),
            uuid: record.uuid.clone(),
            concept: record.concept.clone(),
            subtotal: record.subtotal,
            iva: record.iva,
            otros_impuestos: record.otros_impuestos,
            total: record.total,
            comments: String::new(),
            employee: record.employee.clone(),
            highlight: Highlight::None,
            source_path: Some(record.source_path.clone()),
        }
    }
}

/// Where a row lives: month number (1–12) plus position within the sheet's
/// row vector. Positions are stable during a run — sorting happens only at
/// write-back, on a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLocation {
    pub month: u32,
    pub row: usize,
}

/// Ordered row set for one calendar month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthSheet {
    pub rows: Vec<LedgerRow>,
    touched: bool,
}

impl MonthSheet {
    /// Append a row without marking the sheet dirty (loading existing state).
    pub fn push_existing(&mut self, row: LedgerRow) -> usize {
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// Append a row filed this run; the sheet will be re-sorted and rewritten.
    pub fn push(&mut self, row: LedgerRow) -> usize {
        self.touched = true;
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Rows in write-back order: employee (case-insensitive) ascending, then
    /// issue date ascending. Unordered rows go strictly last, keeping their
    /// relative order.
    pub fn sorted_rows(&self) -> Vec<LedgerRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(compare_rows);
        rows
    }
}

fn compare_rows(a: &LedgerRow, b: &LedgerRow) -> Ordering {
    match (a.issue_date, b.issue_date) {
        (Some(da), Some(db)) => a
            .employee
            .to_lowercase()
            .cmp(&b.employee.to_lowercase())
            .then(da.cmp(&db)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        // Stable sort keeps pre-existing relative order between unordered rows.
        (None, None) => Ordering::Equal,
    }
}

/// Normalize a fiscal UUID: trim, uppercase, strip braces. The SAT treats
/// `{abc}` and `ABC` as the same folio fiscal.
pub fn normalize_uuid(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .collect::<String>()
        .to_uppercase()
}
