use std::collections::HashSet;

use erafix_engine::ColumnNames;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyConfig {
    /// Disciplines that are recorded but do not resolve the row.
    #[serde(default = "default_exempt_disciplines")]
    pub exempt_disciplines: Vec<String>,
    #[serde(default)]
    pub clawback: ClawbackConfig,
    #[serde(default)]
    pub columns: ColumnNames,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            exempt_disciplines: default_exempt_disciplines(),
            clawback: ClawbackConfig::default(),
            columns: ColumnNames::default(),
        }
    }
}

fn default_exempt_disciplines() -> Vec<String> {
    ["quantum", "astro", "photonics", "biophotonics"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Clawback
// ---------------------------------------------------------------------------

/// How a code moved into the FOR4 clawback slot is handled.
///
/// `threshold_pct` is the minimum weight the missing code must carry for the
/// move to happen automatically; anything lighter is flagged instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ClawbackConfig {
    #[serde(default = "default_threshold")]
    pub threshold_pct: f64,
    #[serde(default)]
    pub rebalance: RebalancePolicy,
}

impl Default for ClawbackConfig {
    fn default() -> Self {
        Self {
            threshold_pct: default_threshold(),
            rebalance: RebalancePolicy::default(),
        }
    }
}

fn default_threshold() -> f64 {
    66.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalancePolicy {
    /// Spread the moved weight evenly over the remaining occupied slots.
    #[default]
    EvenSplit,
    /// Leave the remaining percentages exactly as parsed.
    NoAdjustment,
}

impl std::fmt::Display for RebalancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EvenSplit => write!(f, "even_split"),
            Self::NoAdjustment => write!(f, "no_adjustment"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ClassifyConfig {
    pub fn from_toml(input: &str) -> Result<Self, ClassifyError> {
        let config: ClassifyConfig =
            toml::from_str(input).map_err(|e| ClassifyError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        let threshold = self.clawback.threshold_pct;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return Err(ClassifyError::ConfigValidation(format!(
                "clawback.threshold_pct must be in (0, 100], got {threshold}"
            )));
        }

        let mut seen = HashSet::new();
        for name in self.columns.all() {
            if name.trim().is_empty() {
                return Err(ClassifyError::ConfigValidation(
                    "column names must not be empty".into(),
                ));
            }
            if !seen.insert(name) {
                return Err(ClassifyError::ConfigValidation(format!(
                    "column '{name}' is mapped to more than one field"
                )));
            }
        }

        Ok(())
    }

    /// Exempt disciplines are matched exactly (case-sensitive).
    pub fn is_exempt(&self, discipline: &str) -> bool {
        self.exempt_disciplines.iter().any(|d| d == discipline)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
