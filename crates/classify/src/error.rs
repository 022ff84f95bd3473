use std::fmt;

#[derive(Debug)]
pub enum ClassifyError {
    /// FORC string does not match the code grammar.
    InvalidFormat(String),
    /// Normalized percentages do not add up to 100.
    PercentageMismatch { pct1: f64, pct2: f64, pct3: f64 },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, clashing column names, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(input) => write!(f, "FORC string not valid: '{input}'"),
            Self::PercentageMismatch { pct1, pct2, pct3 } => {
                write!(f, "percentages don't add to 100: {pct1} + {pct2} + {pct3} = {}", pct1 + pct2 + pct3)
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ClassifyError {}
