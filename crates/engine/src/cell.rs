use serde::{Deserialize, Serialize};

/// Text values that loaders and spreadsheet exports use to spell "no value".
const NULL_SENTINELS: &[&str] = &["nan", "NaN", "None", "null", "NULL"];

/// A single normalized cell.
///
/// Text is never coerced into a number: FOR codes such as `0206` must keep
/// their leading zero, so only the reader decides when a cell is numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed) {
            return CellValue::Empty;
        }

        CellValue::Text(trimmed.to_string())
    }

    pub fn from_number(n: f64) -> Self {
        if n.is_nan() {
            CellValue::Empty
        } else {
            CellValue::Number(n)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::from_input(&s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// Display text, or `None` for an empty cell.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.raw_display()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_empty() {
        for s in ["", "  ", "nan", "NaN", "None", "null"] {
            assert_eq!(CellValue::from_input(s), CellValue::Empty, "{s:?}");
        }
    }

    #[test]
    fn numeric_text_stays_text() {
        assert_eq!(CellValue::from_input(" 0206 "), CellValue::Text("0206".into()));
        assert_eq!(CellValue::from_input("0206").as_number(), Some(206.0));
    }

    #[test]
    fn number_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(206.0).raw_display(), "206");
        assert_eq!(CellValue::Number(33.5).raw_display(), "33.5");
        assert_eq!(CellValue::from_number(f64::NAN), CellValue::Empty);
    }
}
