use erafix_engine::{CellValue, ColumnNames, RecordStore, StoreError};

/// One sheet exactly as read, header row included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Build a record store: the first non-blank row is the header.
    ///
    /// Blank header cells are named `Unnamed: N`, and fully blank rows
    /// after the header are dropped.
    pub fn to_store(&self, names: &ColumnNames) -> Result<RecordStore, StoreError> {
        let mut rows = self
            .rows
            .iter()
            .skip_while(|row| row.iter().all(CellValue::is_empty));

        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .enumerate()
                .map(|(col, cell)| match cell.as_text() {
                    Some(text) => text,
                    None => format!("Unnamed: {col}"),
                })
                .collect(),
            None => Vec::new(),
        };

        let data: Vec<Vec<CellValue>> = rows
            .filter(|row| !row.iter().all(CellValue::is_empty))
            .cloned()
            .collect();

        RecordStore::new(self.name.clone(), headers, data, names.clone())
    }

    /// Header row followed by the data rows of `store`.
    pub fn from_store(store: &RecordStore) -> Self {
        let mut rows = Vec::with_capacity(store.len() + 1);
        rows.push(store.headers().iter().map(CellValue::text).collect());
        rows.extend(store.rows().iter().cloned());
        Self::new(store.name.clone(), rows)
    }
}
