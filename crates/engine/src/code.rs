use serde::{Serialize, Serializer};

use crate::cell::CellValue;

/// A field-of-research code, kept as text.
///
/// Codes are compared by prefix: the division `02` is an ancestor of the
/// group `0206`. Non-numeric markers (e.g. `MD`) are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodeValue(String);

impl CodeValue {
    /// Normalize a stored code. Returns `None` for empty and null sentinels.
    ///
    /// Numeric storage loses leading zeros and may add a `.0` suffix, so an
    /// all-digit code of odd width gets its leading `0` back.
    pub fn parse(raw: &str) -> Option<CodeValue> {
        let CellValue::Text(text) = CellValue::from_input(raw) else {
            return None;
        };

        let text = text.strip_suffix(".0").unwrap_or(&text);
        if text.is_empty() {
            return None;
        }

        if text.bytes().all(|b| b.is_ascii_digit()) && text.len() % 2 == 1 {
            Some(CodeValue(format!("0{text}")))
        } else {
            Some(CodeValue(text.to_string()))
        }
    }

    pub fn from_cell(cell: &CellValue) -> Option<CodeValue> {
        match cell {
            CellValue::Empty => None,
            CellValue::Number(n) => Self::parse(&CellValue::Number(*n).raw_display()),
            CellValue::Text(s) => Self::parse(s),
        }
    }

    /// A code exactly as written by the user (already validated digits).
    pub fn verbatim(code: impl Into<String>) -> CodeValue {
        CodeValue(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &CodeValue) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn to_cell(&self) -> CellValue {
        CellValue::Text(self.0.clone())
    }
}

impl std::fmt::Display for CodeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CodeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
