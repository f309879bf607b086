use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::core::{Highlight, LedgerRow, MonthSheet, RowLocation};

/// In-memory view of the ledger: one sheet per month plus a global UUID
/// index spanning all months, so a duplicate misfiled into another month is
/// still caught.
///
/// Built once per run from the persisted workbook, mutated during
/// reconciliation, and handed to the sheet writer at the end. Row positions
/// are stable for the lifetime of the index — sorting happens at write-back
/// on a copy of each sheet's rows.
#[derive(Debug, Clone, Default)]
pub struct LedgerIndex {
    sheets: BTreeMap<u32, MonthSheet>,
    by_uuid: HashMap<String, Vec<RowLocation>>,
    year: i32,
}

impl LedgerIndex {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Load a row read from the persisted workbook. Does not mark the sheet
    /// touched; rows with an empty UUID are kept but not indexed.
    pub fn insert_existing(&mut self, month: u32, row: LedgerRow) -> RowLocation {
        let uuid = row.uuid.clone();
        let pos = self.sheets.entry(month).or_default().push_existing(row);
        let loc = RowLocation { month, row: pos };
        if !uuid.is_empty() {
            self.by_uuid.entry(uuid).or_default().push(loc);
        }
        loc
    }

    /// File a new row this run. Marks the sheet touched and indexes the UUID.
    pub fn insert(&mut self, month: u32, row: LedgerRow) -> RowLocation {
        let uuid = row.uuid.clone();
        let pos = self.sheets.entry(month).or_default().push(row);
        let loc = RowLocation { month, row: pos };
        if !uuid.is_empty() {
            self.by_uuid.entry(uuid).or_default().push(loc);
        }
        debug!(target: "conciliador", month, row = pos, "row filed");
        loc
    }

    /// Every row currently holding `uuid`, across all months.
    pub fn lookup_uuid(&self, uuid: &str) -> &[RowLocation] {
        self.by_uuid.get(uuid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flag a row red as one side of a duplicate pair. Red always wins, so
    /// this also overrides a yellow set earlier, and the sheet is rewritten
    /// even if the row pre-existed this run.
    pub fn mark_duplicate(&mut self, loc: RowLocation) {
        if let Some(sheet) = self.sheets.get_mut(&loc.month) {
            if let Some(row) = sheet.rows.get_mut(loc.row) {
                row.highlight = Highlight::Red;
                sheet.mark_touched();
            }
        }
    }

    /// Flag a row yellow unless it is already red.
    pub fn mark_misfiled(&mut self, loc: RowLocation) {
        if let Some(sheet) = self.sheets.get_mut(&loc.month) {
            if let Some(row) = sheet.rows.get_mut(loc.row) {
                if row.highlight != Highlight::Red {
                    row.highlight = Highlight::Yellow;
                }
            }
        }
    }

    pub fn row(&self, loc: RowLocation) -> Option<&LedgerRow> {
        self.sheets.get(&loc.month)?.rows.get(loc.row)
    }

    pub fn sheet(&self, month: u32) -> Option<&MonthSheet> {
        self.sheets.get(&month)
    }

    /// Month sheets in calendar order.
    pub fn sheets(&self) -> impl Iterator<Item = (u32, &MonthSheet)> {
        self.sheets.iter().map(|(m, s)| (*m, s))
    }

    pub fn touched_months(&self) -> Vec<u32> {
        self.sheets
            .iter()
            .filter(|(_, s)| s.is_touched())
            .map(|(m, _)| *m)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Highlight;

    fn row(uuid: &str) -> LedgerRow {
        LedgerRow {
            issue_date: None,
            raw_date: None,
            issuer_name: String::new(),
            issuer_rfc: String::new(),
            folio: String::new(),
            uuid: uuid.into(),
            concept: String::new(),
            subtotal: Default::default(),
            iva: Default::default(),
            otros_impuestos: Default::default(),
            total: Default::default(),
            comments: String::new(),
            employee: "Ana".into(),
            highlight: Highlight::None,
            source_path: None,
        }
    }

    #[test]
    fn uuid_lookup_spans_months() {
        let mut index = LedgerIndex::new(2026);
        assert_eq!(index.year(), 2026);
        index.insert_existing(1, row("ABC123"));
        index.insert(2, row("ABC123"));

        let locs = index.lookup_uuid("ABC123");
        assert_eq!(locs.len(), 2);
        assert_eq!(locs[0].month, 1);
        assert_eq!(locs[1].month, 2);
        assert!(index.lookup_uuid("MISSING").is_empty());
    }

    #[test]
    fn existing_rows_do_not_touch_sheets() {
        let mut index = LedgerIndex::new(2026);
        index.insert_existing(1, row("A"));
        assert!(index.touched_months().is_empty());

        index.insert(1, row("B"));
        assert_eq!(index.touched_months(), vec![1]);
    }

    #[test]
    fn duplicate_marking_touches_and_beats_yellow() {
        let mut index = LedgerIndex::new(2026);
        let loc = index.insert_existing(3, row("A"));
        index.mark_misfiled(loc);
        assert_eq!(index.row(loc).unwrap().highlight, Highlight::Yellow);

        index.mark_duplicate(loc);
        assert_eq!(index.row(loc).unwrap().highlight, Highlight::Red);
        assert_eq!(index.touched_months(), vec![3]);

        // yellow never downgrades red
        index.mark_misfiled(loc);
        assert_eq!(index.row(loc).unwrap().highlight, Highlight::Red);
    }

    #[test]
    fn empty_uuid_rows_are_kept_but_not_indexed() {
        let mut index = LedgerIndex::new(2026);
        index.insert_existing(1, row(""));
        assert!(index.lookup_uuid("").is_empty());
        assert_eq!(index.sheet(1).unwrap().rows.len(), 1);
    }
}
