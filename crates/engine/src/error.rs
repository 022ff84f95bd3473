use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A status cell holds something other than 0/1/2 or a known sentinel.
    InvalidStatus { row: usize, value: String },
    /// Two header cells carry the same name.
    DuplicateColumn(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStatus { row, value } => {
                write!(f, "row {}: unrecognized status '{value}'", row + 1)
            }
            Self::DuplicateColumn(name) => write!(f, "duplicate column '{name}'"),
        }
    }
}

impl std::error::Error for StoreError {}
