//! Record Store - one sheet of bibliographic rows.
//!
//! Key invariants:
//! - Row identity is the data-row position (`RowIndex`), header excluded
//! - Every row is padded to the header width
//! - Status cells always parse as a `StatusCode` (checked on construction,
//!   and only written through `set_status` afterwards)
//! - Writing a field whose column is missing appends that column

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::code::CodeValue;
use crate::columns::{ColumnNames, Field, Slot, Year};
use crate::error::StoreError;
use crate::status::StatusCode;

static EMPTY: CellValue = CellValue::Empty;

/// Stable identity of a data row (0-based, header excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIndex(pub usize);

impl std::fmt::Display for RowIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    pub name: String,
    headers: Vec<String>,
    index: FxHashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
    names: ColumnNames,
}

impl RecordStore {
    /// Build a store from a header row and data rows.
    ///
    /// Adds `status` (0), `discipline` (unset) and `forc_string` (unset)
    /// columns when the source lacks them.
    pub fn new(
        name: impl Into<String>,
        mut headers: Vec<String>,
        mut rows: Vec<Vec<CellValue>>,
        names: ColumnNames,
    ) -> Result<Self, StoreError> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        while headers.len() < width {
            headers.push(format!("Unnamed: {}", headers.len()));
        }
        for row in &mut rows {
            row.resize(headers.len(), CellValue::Empty);
        }

        let registered = names.all();
        let mut index = FxHashMap::default();
        for (col, header) in headers.iter().enumerate() {
            if index.contains_key(header) {
                if registered.contains(&header.as_str()) {
                    return Err(StoreError::DuplicateColumn(header.clone()));
                }
                continue;
            }
            index.insert(header.clone(), col);
        }

        let mut store = Self { name: name.into(), headers, index, rows, names };

        let status = store.names.status.clone();
        let status_col = store.ensure_column(&status, StatusCode::Unhandled.to_cell());
        let discipline = store.names.discipline.clone();
        store.ensure_column(&discipline, CellValue::Empty);
        let forc = store.names.forc_string.clone();
        store.ensure_column(&forc, CellValue::Empty);

        for (row, cells) in store.rows.iter().enumerate() {
            let cell = &cells[status_col];
            if StatusCode::from_cell(cell).is_none() {
                return Err(StoreError::InvalidStatus { row, value: cell.raw_display() });
            }
        }

        Ok(store)
    }

    pub fn names(&self) -> &ColumnNames {
        &self.names
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_indices(&self) -> impl Iterator<Item = RowIndex> {
        (0..self.rows.len()).map(RowIndex)
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.index.get(header).copied()
    }

    pub fn field_column(&self, field: Field) -> Option<usize> {
        self.column_index(self.names.name(field))
    }

    /// Return the column for `header`, appending it (filled with `default`) if missing.
    pub fn ensure_column(&mut self, header: &str, default: CellValue) -> usize {
        if let Some(col) = self.column_index(header) {
            return col;
        }
        let col = self.headers.len();
        self.headers.push(header.to_string());
        self.index.insert(header.to_string(), col);
        for row in &mut self.rows {
            row.push(default.clone());
        }
        col
    }

    // ------------------------------------------------------------------
    // Raw cell access
    // ------------------------------------------------------------------

    pub fn get(&self, row: RowIndex, col: usize) -> &CellValue {
        self.rows
            .get(row.0)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Panics if `row` or `col` is out of range.
    pub fn set(&mut self, row: RowIndex, col: usize, value: CellValue) {
        self.rows[row.0][col] = value;
    }

    pub fn cell(&self, row: RowIndex, field: Field) -> &CellValue {
        match self.field_column(field) {
            Some(col) => self.get(row, col),
            None => &EMPTY,
        }
    }

    pub fn set_cell(&mut self, row: RowIndex, field: Field, value: CellValue) {
        let header = self.names.name(field).to_string();
        let col = self.ensure_column(&header, CellValue::Empty);
        self.set(row, col, value);
    }

    pub fn text(&self, row: RowIndex, field: Field) -> Option<String> {
        self.cell(row, field).as_text()
    }

    // ------------------------------------------------------------------
    // Typed columns
    // ------------------------------------------------------------------

    pub fn status(&self, row: RowIndex) -> StatusCode {
        StatusCode::from_cell(self.cell(row, Field::Status)).unwrap_or_default()
    }

    pub fn set_status(&mut self, row: RowIndex, status: StatusCode) {
        self.set_cell(row, Field::Status, status.to_cell());
    }

    pub fn discipline(&self, row: RowIndex) -> Option<String> {
        self.text(row, Field::Discipline)
    }

    pub fn set_discipline(&mut self, row: RowIndex, discipline: &str) {
        self.set_cell(row, Field::Discipline, CellValue::text(discipline));
    }

    pub fn code(&self, row: RowIndex, year: Year, slot: Slot) -> Option<CodeValue> {
        CodeValue::from_cell(self.cell(row, Field::ForCode(year, slot)))
    }

    pub fn set_code(&mut self, row: RowIndex, year: Year, slot: Slot, code: Option<&CodeValue>) {
        let value = code.map(CodeValue::to_cell).unwrap_or_default();
        self.set_cell(row, Field::ForCode(year, slot), value);
    }

    pub fn pct(&self, row: RowIndex, year: Year, slot: Slot) -> Option<f64> {
        self.cell(row, Field::ForPct(year, slot)).as_number()
    }

    pub fn set_pct(&mut self, row: RowIndex, year: Year, slot: Slot, pct: Option<f64>) {
        let value = pct.map(CellValue::from_number).unwrap_or_default();
        self.set_cell(row, Field::ForPct(year, slot), value);
    }

    pub fn clawback_justification(&self, row: RowIndex) -> Option<String> {
        self.text(row, Field::ClawbackJustification)
    }

    pub fn set_clawback_justification(&mut self, row: RowIndex, justification: &str) {
        self.set_cell(row, Field::ClawbackJustification, CellValue::text(justification));
    }

    pub fn forc_string(&self, row: RowIndex) -> Option<String> {
        self.text(row, Field::ForcString)
    }

    pub fn set_forc_string(&mut self, row: RowIndex, forc: &str) {
        self.set_cell(row, Field::ForcString, CellValue::text(forc));
    }

    // ------------------------------------------------------------------
    // Set operations
    // ------------------------------------------------------------------

    pub fn filter(&self, predicate: impl Fn(RowIndex, &RecordStore) -> bool) -> BTreeSet<RowIndex> {
        self.row_indices().filter(|&row| predicate(row, self)).collect()
    }

    /// Write `value` into `field` for every row in `rows`.
    pub fn assign(&mut self, rows: &BTreeSet<RowIndex>, field: Field, value: CellValue) {
        for &row in rows {
            self.set_cell(row, field, value.clone());
        }
    }

    /// A new store holding only `rows`, renumbered from zero.
    pub fn subset(&self, rows: &BTreeSet<RowIndex>) -> RecordStore {
        Self {
            name: self.name.clone(),
            headers: self.headers.clone(),
            index: self.index.clone(),
            rows: rows.iter().filter_map(|row| self.rows.get(row.0).cloned()).collect(),
            names: self.names.clone(),
        }
    }
}
