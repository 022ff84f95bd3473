use std::fmt;
use std::path::PathBuf;

use erafix_engine::StoreError;

#[derive(Debug)]
pub enum IoError {
    /// Source file does not exist.
    NotFound(PathBuf),
    /// File exists but could not be opened as a workbook.
    Open { path: PathBuf, message: String },
    /// Workbook has no sheets at all.
    NoSheets(PathBuf),
    /// Several sheets and no index given; the caller must choose.
    AmbiguousSheet { sheets: Vec<String> },
    /// Requested sheet index is out of range.
    SheetIndex { index: usize, count: usize },
    Read { path: PathBuf, message: String },
    Write { path: PathBuf, message: String },
    /// Extension we cannot read (or, for saving, write).
    UnsupportedFormat(String),
    /// Loaded sheet is not a valid record store.
    Store(StoreError),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::Open { path, message } => {
                write!(f, "cannot open {}: {message}", path.display())
            }
            Self::NoSheets(path) => write!(f, "{} contains no sheets", path.display()),
            Self::AmbiguousSheet { sheets } => {
                write!(f, "workbook has {} sheets ({}), choose one", sheets.len(), sheets.join(", "))
            }
            Self::SheetIndex { index, count } => {
                write!(f, "sheet index {index} out of range (workbook has {count} sheet(s))")
            }
            Self::Read { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "failed to write {}: {message}", path.display())
            }
            Self::UnsupportedFormat(ext) => write!(f, "unsupported file format '{ext}'"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<StoreError> for IoError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
