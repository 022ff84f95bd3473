//! Workbook load/save with sheet selection.
//!
//! All sheets are read; the selected one becomes the [`RecordStore`] and the
//! rest are written back unchanged on save.

use std::path::{Path, PathBuf};

use erafix_engine::{ColumnNames, RecordStore};

use crate::error::IoError;
use crate::sheet::RawSheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    /// Read-only Excel/ODF formats (xls, xlsb, ods).
    Legacy,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "xls" | "xlsb" | "ods" => Ok(Self::Legacy),
            "csv" | "tsv" | "txt" => Ok(Self::Csv),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Legacy)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedWorkbook {
    pub path: PathBuf,
    /// Every sheet as read; the active one is replaced by `store` on save.
    pub sheets: Vec<RawSheet>,
    pub active: usize,
    pub store: RecordStore,
}

/// Load `path`, selecting sheet `sheet_index` (0-based).
///
/// A single-sheet source needs no index. With several sheets and no index,
/// fails with [`IoError::AmbiguousSheet`] so the caller can ask the user.
pub fn load(path: &Path, sheet_index: Option<usize>, names: &ColumnNames) -> Result<LoadedWorkbook, IoError> {
    let sheets = read_sheets(path)?;
    let count = sheets.len();

    let active = match (sheet_index, count) {
        (_, 0) => return Err(IoError::NoSheets(path.to_path_buf())),
        (Some(index), _) if index >= count => return Err(IoError::SheetIndex { index, count }),
        (Some(index), _) => index,
        (None, 1) => 0,
        (None, _) => {
            return Err(IoError::AmbiguousSheet {
                sheets: sheets.into_iter().map(|s| s.name).collect(),
            })
        }
    };

    let store = sheets[active].to_store(names)?;
    log::info!(
        "loaded {} row(s) from sheet '{}' of {}",
        store.len(),
        store.name,
        path.display()
    );

    Ok(LoadedWorkbook {
        path: path.to_path_buf(),
        sheets,
        active,
        store,
    })
}

fn read_sheets(path: &Path) -> Result<Vec<RawSheet>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    match FileFormat::from_path(path)? {
        FileFormat::Xlsx | FileFormat::Legacy => crate::xlsx::import(path),
        FileFormat::Csv => Ok(vec![crate::csv::import(path)?]),
    }
}

impl LoadedWorkbook {
    /// Sheets to write: the store in place of the active sheet.
    pub fn output_sheets(&self) -> Vec<RawSheet> {
        self.sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| {
                if i == self.active {
                    RawSheet::from_store(&self.store)
                } else {
                    sheet.clone()
                }
            })
            .collect()
    }

    /// Save to `path`. CSV output holds only the active sheet.
    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        let format = FileFormat::from_path(path)?;
        match format {
            FileFormat::Xlsx => crate::xlsx::export(&self.output_sheets(), path)?,
            FileFormat::Csv => {
                if self.sheets.len() > 1 {
                    log::warn!(
                        "CSV output keeps only sheet '{}'; {} other sheet(s) dropped",
                        self.store.name,
                        self.sheets.len() - 1
                    );
                }
                crate::csv::export(&RawSheet::from_store(&self.store), path)?
            }
            FileFormat::Legacy => {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                return Err(IoError::UnsupportedFormat(ext.to_string()));
            }
        }
        log::info!("saved {} row(s) to {}", self.store.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.XLSX")).unwrap(), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_path(Path::new("a.ods")).unwrap(), FileFormat::Legacy);
        assert_eq!(FileFormat::from_path(Path::new("a.csv")).unwrap(), FileFormat::Csv);
        assert!(!FileFormat::Legacy.is_writable());
        assert!(matches!(
            FileFormat::from_path(Path::new("a.pdf")),
            Err(IoError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("gone.csv"), None, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, IoError::NotFound(_)));
    }

    #[test]
    fn csv_needs_no_sheet_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outputs.csv");
        fs::write(&path, "AUTHORS\nGee, A.\n").unwrap();

        let book = load(&path, None, &ColumnNames::default()).unwrap();
        assert_eq!(book.active, 0);
        assert_eq!(book.store.len(), 1);

        let err = load(&path, Some(1), &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, IoError::SheetIndex { index: 1, count: 1 }));
    }

    #[test]
    fn legacy_output_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outputs.csv");
        fs::write(&path, "AUTHORS\nGee, A.\n").unwrap();
        let book = load(&path, None, &ColumnNames::default()).unwrap();
        let err = book.save(&dir.path().join("out.xls")).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(_)));
    }
}
