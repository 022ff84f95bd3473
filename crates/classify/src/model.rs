use std::collections::{BTreeMap, BTreeSet};

use erafix_engine::{RowIndex, StatusCode};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    AssignDiscipline { term: String, discipline: String },
    CarryForward,
    ApplyCodeString {
        forc: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        justification: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        term: Option<String>,
    },
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssignDiscipline { .. } => write!(f, "assign_discipline"),
            Self::CarryForward => write!(f, "carry_forward"),
            Self::ApplyCodeString { .. } => write!(f, "apply_code_string"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub touched: usize,
    pub resolved: usize,
    pub carried_forward: usize,
    pub clawback_needed: usize,
    pub confused: usize,
    /// Rows touched but left unhandled (e.g. an exempt discipline).
    pub unhandled: usize,
}

impl AllocationSummary {
    /// Rows that need a human to look at them.
    pub fn flagged(&self) -> usize {
        self.clawback_needed + self.confused
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationMeta {
    pub engine_version: String,
    pub run_at: String,
}

impl AllocationMeta {
    pub fn now() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// What one engine operation did to the store.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    pub operation: Operation,
    pub touched: BTreeSet<RowIndex>,
    /// Status of every touched row after the operation.
    pub outcomes: BTreeMap<RowIndex, StatusCode>,
    pub summary: AllocationSummary,
    pub meta: AllocationMeta,
}

impl AllocationReport {
    pub fn new(operation: Operation, outcomes: BTreeMap<RowIndex, StatusCode>) -> Self {
        let summary = compute_summary(&outcomes);
        Self {
            operation,
            touched: outcomes.keys().copied().collect(),
            outcomes,
            summary,
            meta: AllocationMeta::now(),
        }
    }

    /// Touched rows that ended in `status`.
    pub fn rows_with(&self, status: StatusCode) -> BTreeSet<RowIndex> {
        self.outcomes
            .iter()
            .filter(|&(_, &s)| s == status)
            .map(|(&row, _)| row)
            .collect()
    }
}

/// Count outcomes per status.
pub fn compute_summary(outcomes: &BTreeMap<RowIndex, StatusCode>) -> AllocationSummary {
    let mut summary = AllocationSummary {
        touched: outcomes.len(),
        ..AllocationSummary::default()
    };

    for status in outcomes.values() {
        match status {
            StatusCode::Unhandled => summary.unhandled += 1,
            StatusCode::Resolved => summary.resolved += 1,
            StatusCode::CarriedForward => summary.carried_forward += 1,
            StatusCode::ClawbackNeeded => summary.clawback_needed += 1,
            StatusCode::Confused => summary.confused += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let outcomes = BTreeMap::from([
            (RowIndex(0), StatusCode::Resolved),
            (RowIndex(2), StatusCode::Resolved),
            (RowIndex(3), StatusCode::ClawbackNeeded),
            (RowIndex(5), StatusCode::Confused),
            (RowIndex(7), StatusCode::Unhandled),
        ]);
        let report = AllocationReport::new(Operation::CarryForward, outcomes);
        assert_eq!(report.summary.touched, 5);
        assert_eq!(report.summary.resolved, 2);
        assert_eq!(report.summary.flagged(), 2);
        assert_eq!(report.summary.unhandled, 1);
        assert_eq!(report.touched.len(), 5);
        assert_eq!(report.rows_with(StatusCode::Resolved), BTreeSet::from([RowIndex(0), RowIndex(2)]));
    }

    #[test]
    fn report_serializes() {
        let report = AllocationReport::new(
            Operation::ApplyCodeString { forc: "0206".into(), justification: None, term: None },
            BTreeMap::from([(RowIndex(1), StatusCode::ClawbackNeeded)]),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"]["kind"], "apply_code_string");
        assert!(json["operation"].get("justification").is_none());
        assert_eq!(json["touched"][0], 1);
        assert_eq!(json["outcomes"]["1"], "clawback_needed");
        assert_eq!(json["summary"]["clawback_needed"], 1);
    }
}
