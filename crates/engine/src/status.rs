use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Per-row handling state.
///
/// The numeric progression (`0`, `1`, `2`) and the two sentinels share one
/// persisted column, so the cell mapping keeps the sentinels as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    #[default]
    Unhandled,
    Resolved,
    CarriedForward,
    ClawbackNeeded,
    Confused,
}

impl StatusCode {
    pub const ALL: [StatusCode; 5] = [
        StatusCode::Unhandled,
        StatusCode::Resolved,
        StatusCode::CarriedForward,
        StatusCode::ClawbackNeeded,
        StatusCode::Confused,
    ];

    /// Parse a persisted status. Empty cells are `Unhandled`.
    pub fn from_cell(cell: &CellValue) -> Option<StatusCode> {
        match cell {
            CellValue::Empty => Some(StatusCode::Unhandled),
            CellValue::Number(n) => Self::from_number(*n),
            CellValue::Text(s) => Self::parse(s),
        }
    }

    pub fn parse(s: &str) -> Option<StatusCode> {
        let s = s.trim();
        if let Ok(n) = s.parse::<f64>() {
            return Self::from_number(n);
        }
        if s.eq_ignore_ascii_case("clawbackneeded") {
            Some(StatusCode::ClawbackNeeded)
        } else if s.eq_ignore_ascii_case("confused") {
            Some(StatusCode::Confused)
        } else {
            None
        }
    }

    fn from_number(n: f64) -> Option<StatusCode> {
        if n == 0.0 {
            Some(StatusCode::Unhandled)
        } else if n == 1.0 {
            Some(StatusCode::Resolved)
        } else if n == 2.0 {
            Some(StatusCode::CarriedForward)
        } else {
            None
        }
    }

    pub fn to_cell(self) -> CellValue {
        match self {
            StatusCode::Unhandled => CellValue::Number(0.0),
            StatusCode::Resolved => CellValue::Number(1.0),
            StatusCode::CarriedForward => CellValue::Number(2.0),
            StatusCode::ClawbackNeeded => CellValue::Text("ClawbackNeeded".into()),
            StatusCode::Confused => CellValue::Text("confused".into()),
        }
    }

    /// Rows that need a person to look at them again.
    pub fn needs_follow_up(self) -> bool {
        matches!(self, StatusCode::ClawbackNeeded | StatusCode::Confused)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unhandled => write!(f, "unhandled"),
            Self::Resolved => write!(f, "resolved"),
            Self::CarriedForward => write!(f, "carried_forward"),
            Self::ClawbackNeeded => write!(f, "clawback_needed"),
            Self::Confused => write!(f, "confused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_mapping_is_stable() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_cell(&status.to_cell()), Some(status));
        }
    }

    #[test]
    fn numeric_text_and_floats_parse() {
        assert_eq!(StatusCode::parse("0"), Some(StatusCode::Unhandled));
        assert_eq!(StatusCode::parse("1.0"), Some(StatusCode::Resolved));
        assert_eq!(StatusCode::from_cell(&CellValue::Number(2.0)), Some(StatusCode::CarriedForward));
        assert_eq!(StatusCode::parse("Confused"), Some(StatusCode::Confused));
        assert_eq!(StatusCode::parse("3"), None);
        assert_eq!(StatusCode::parse("done"), None);
    }

    #[test]
    fn sentinels_stay_distinct_from_numbers() {
        assert!(matches!(StatusCode::ClawbackNeeded.to_cell(), CellValue::Text(_)));
        assert!(matches!(StatusCode::Confused.to_cell(), CellValue::Text(_)));
        assert!(StatusCode::Confused.needs_follow_up());
        assert!(!StatusCode::Resolved.needs_follow_up());
    }
}
