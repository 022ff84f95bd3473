//! Allocation engine - applies disciplines and FOR codes to matched rows.
//!
//! Key invariants:
//! - A FORC string is parsed before any row is read; a bad string leaves
//!   the store untouched
//! - Per-row ambiguity is recorded as `ClawbackNeeded` / `Confused`, never
//!   returned as an error
//! - Only `Unhandled` rows are candidates for carry-forward and code strings
//! - Every candidate row records the FORC string it was offered

use std::collections::BTreeMap;

use erafix_engine::{CodeValue, RecordStore, RowIndex, Slot, StatusCode, Year};

use crate::config::{ClassifyConfig, RebalancePolicy};
use crate::error::ClassifyError;
use crate::forc::{self, ParsedCodes};
use crate::matcher::{self, SearchField};
use crate::model::{AllocationReport, Operation};

/// Marker in an existing code that lets any FORC string overwrite the row.
const MD_MARKER: &str = "MD";

pub struct AllocationEngine<'a> {
    config: &'a ClassifyConfig,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(config: &'a ClassifyConfig) -> Self {
        Self { config }
    }

    /// Set `discipline` on every row matching `term` that has none yet.
    ///
    /// Rows are resolved unless the discipline is exempt.
    pub fn assign_discipline(
        &self,
        store: &mut RecordStore,
        term: &str,
        discipline: &str,
        search: &SearchField,
    ) -> AllocationReport {
        let operation = Operation::AssignDiscipline {
            term: term.to_string(),
            discipline: discipline.to_string(),
        };

        let discipline = discipline.trim();
        if discipline.is_empty() {
            log::warn!("empty discipline for '{term}', nothing assigned");
            return AllocationReport::new(operation, BTreeMap::new());
        }

        let resolves = !self.config.is_exempt(discipline);
        let mut outcomes = BTreeMap::new();
        for row in matcher::find(store, term, search, true, false) {
            store.set_discipline(row, discipline);
            if resolves {
                store.set_status(row, StatusCode::Resolved);
            }
            log::debug!("row {row}: discipline '{discipline}'");
            outcomes.insert(row, store.status(row));
        }

        let report = AllocationReport::new(operation, outcomes);
        log::info!(
            "assigned '{discipline}' to {} row(s) matching '{term}' ({} resolved)",
            report.summary.touched,
            report.summary.resolved
        );
        report
    }

    /// Copy ERA 2015 codes into empty ERA 2018 columns for unhandled rows.
    pub fn carry_forward(&self, store: &mut RecordStore) -> AllocationReport {
        let mut outcomes = BTreeMap::new();

        for row in matcher::unhandled_rows(store) {
            let mut found = false;
            for slot in Slot::ALL {
                if let Some(code) = store.code(row, Year::Era2015, slot) {
                    found = true;
                    if store.code(row, Year::Era2018, slot).is_none() {
                        store.set_code(row, Year::Era2018, slot, Some(&code));
                    }
                }
                if let Some(pct) = store.pct(row, Year::Era2015, slot) {
                    found = true;
                    if store.pct(row, Year::Era2018, slot).is_none() {
                        store.set_pct(row, Year::Era2018, slot, Some(pct));
                    }
                }
            }

            if found {
                store.set_status(row, StatusCode::CarriedForward);
                outcomes.insert(row, StatusCode::CarriedForward);
            }
        }

        let report = AllocationReport::new(Operation::CarryForward, outcomes);
        log::info!("carried forward {} row(s)", report.summary.carried_forward);
        report
    }

    /// Reconcile `forc` against the existing ERA 2018 codes of every
    /// unhandled row (or those matching `target`).
    pub fn apply_code_string(
        &self,
        store: &mut RecordStore,
        forc: &str,
        justification: Option<&str>,
        target: Option<(&str, &SearchField)>,
    ) -> Result<AllocationReport, ClassifyError> {
        let parsed = forc::parse(forc)?;
        let justification = justification.map(str::trim).filter(|j| !j.is_empty());

        let candidates = match target {
            Some((term, search)) => matcher::find(store, term, search, false, true),
            None => matcher::unhandled_rows(store),
        };

        let mut outcomes = BTreeMap::new();
        for row in candidates {
            let status = self.reconcile(store, row, forc, &parsed, justification);
            store.set_status(row, status);
            outcomes.insert(row, status);
        }

        let report = AllocationReport::new(
            Operation::ApplyCodeString {
                forc: forc.to_string(),
                justification: justification.map(str::to_string),
                term: target.map(|(term, _)| term.to_string()),
            },
            outcomes,
        );
        log::info!(
            "applied '{forc}' to {} row(s): {} resolved, {} flagged",
            report.summary.touched,
            report.summary.resolved,
            report.summary.flagged()
        );
        Ok(report)
    }

    fn reconcile(
        &self,
        store: &mut RecordStore,
        row: RowIndex,
        forc: &str,
        parsed: &ParsedCodes,
        justification: Option<&str>,
    ) -> StatusCode {
        store.set_forc_string(row, forc);

        let defaults = Slot::WEIGHTED.map(|slot| store.code(row, Year::Era2018, slot));

        if defaults.iter().flatten().any(|code| code.as_str().contains(MD_MARKER)) {
            log::debug!("row {row}: MD marker, overwriting codes");
            write_weighted(store, row, &parsed.codes, parsed.pcts);
            return StatusCode::Resolved;
        }

        let default_present = defaults.clone().map(|d| d.is_some());
        let present: [bool; 3] = std::array::from_fn(|i| match (&parsed.codes[i], &defaults[i]) {
            (Some(provided), Some(default)) => default.is_prefix_of(provided),
            (Some(_), None) => true,
            (None, _) => false,
        });

        if present == default_present {
            log::debug!("row {row}: codes compatible, applying");
            write_weighted(store, row, &parsed.codes, parsed.pcts);
            return StatusCode::Resolved;
        }

        let Some(justification) = justification else {
            log::debug!("row {row}: codes differ and no justification");
            return StatusCode::ClawbackNeeded;
        };

        // Lost relative to the existing slot, or replaced by a different code.
        let missing: [bool; 3] =
            std::array::from_fn(|i| (default_present[i] && !present[i]) || defaults[i] != parsed.codes[i]);

        if parsed.count() == 1 && missing[0] {
            if let Some(code) = parsed.code(Slot::First) {
                log::debug!("row {row}: single new code {code} -> FOR4");
                store.set_code(row, Year::Era2018, Slot::Fourth, Some(code));
                store.set_pct(row, Year::Era2018, Slot::Fourth, Some(100.0));
                store.set_clawback_justification(row, justification);
                return StatusCode::Resolved;
            }
        }

        if parsed.count() > 1 && (missing[1] || missing[2]) {
            return self.claw_back(store, row, parsed, &missing, justification);
        }

        if present.iter().all(|&p| p) {
            log::debug!("row {row}: all codes present but inconsistent with existing slots");
            return StatusCode::Confused;
        }

        log::debug!("row {row}: codes conflict with existing slots");
        StatusCode::ClawbackNeeded
    }

    /// Move the one missing secondary code into FOR4 if it carries enough weight.
    fn claw_back(
        &self,
        store: &mut RecordStore,
        row: RowIndex,
        parsed: &ParsedCodes,
        missing: &[bool; 3],
        justification: &str,
    ) -> StatusCode {
        let threshold = self.config.clawback.threshold_pct;
        // Only a provided code can be moved.
        let moved: Vec<Slot> = [Slot::Second, Slot::Third]
            .into_iter()
            .filter(|&slot| missing[slot.index()] && parsed.code(slot).is_some())
            .collect();

        let slot = match moved.as_slice() {
            [slot] if parsed.pct(*slot) >= threshold => *slot,
            [slot] => {
                log::debug!(
                    "row {row}: missing code at {}% is under {threshold}%",
                    parsed.pct(*slot)
                );
                return StatusCode::ClawbackNeeded;
            }
            _ => {
                log::debug!("row {row}: {} missing codes, only one FOR4 slot", moved.len());
                return StatusCode::ClawbackNeeded;
            }
        };

        let Some(code) = parsed.code(slot) else {
            return StatusCode::ClawbackNeeded;
        };
        let weight = parsed.pct(slot);
        log::debug!("row {row}: {code} at {weight}% -> FOR4");
        store.set_code(row, Year::Era2018, Slot::Fourth, Some(code));
        store.set_pct(row, Year::Era2018, Slot::Fourth, Some(weight));
        store.set_clawback_justification(row, justification);

        let mut codes = parsed.codes.clone();
        let mut pcts = parsed.pcts;
        codes[slot.index()] = None;
        pcts[slot.index()] = 0.0;

        if self.config.clawback.rebalance == RebalancePolicy::EvenSplit {
            let remaining: Vec<usize> = (0..3).filter(|&i| codes[i].is_some()).collect();
            let share = weight / remaining.len() as f64;
            for i in remaining {
                pcts[i] += share;
            }
        }

        write_weighted(store, row, &codes, pcts);
        StatusCode::Resolved
    }
}

/// Overwrite the three weighted ERA 2018 slots.
///
/// A percentage is kept for an empty code only when it is non-zero, so the
/// written weights still total 100.
fn write_weighted(store: &mut RecordStore, row: RowIndex, codes: &[Option<CodeValue>; 3], pcts: [f64; 3]) {
    for slot in Slot::WEIGHTED {
        let code = codes[slot.index()].as_ref();
        let pct = pcts[slot.index()];
        store.set_code(row, Year::Era2018, slot, code);
        let pct = if code.is_some() || pct != 0.0 { Some(pct) } else { None };
        store.set_pct(row, Year::Era2018, slot, pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erafix_engine::{CellValue, ColumnNames};

    const HEADERS: [&str; 8] = [
        "AUTHORS",
        "HANDLED",
        "ERA_18_FOR1",
        "ERA_18_FOR2",
        "ERA_18_FOR3",
        "ERA_18_FOR1%",
        "ERA_18_FOR2%",
        "ERA_18_FOR3%",
    ];

    fn store(rows: &[[&str; 8]]) -> RecordStore {
        RecordStore::new(
            "Sheet1",
            HEADERS.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| CellValue::from_input(c)).collect())
                .collect(),
            ColumnNames::default(),
        )
        .unwrap()
    }

    fn row_with(codes: [&str; 3]) -> [&str; 8] {
        ["Gee, A.", "0", codes[0], codes[1], codes[2], "", "", ""]
    }

    fn codes(s: &RecordStore, row: usize) -> Vec<Option<String>> {
        Slot::ALL
            .iter()
            .map(|&slot| s.code(RowIndex(row), Year::Era2018, slot).map(|c| c.to_string()))
            .collect()
    }

    fn pcts(s: &RecordStore, row: usize) -> Vec<Option<f64>> {
        Slot::ALL.iter().map(|&slot| s.pct(RowIndex(row), Year::Era2018, slot)).collect()
    }

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn compatible_codes_resolve() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["02", "", ""])]);
        let report = AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206", None, None)
            .unwrap();
        assert_eq!(report.outcomes[&RowIndex(0)], StatusCode::Resolved);
        assert_eq!(codes(&s, 0), vec![some("0206"), None, None, None]);
        assert_eq!(pcts(&s, 0), vec![Some(100.0), None, None, None]);
        assert_eq!(s.forc_string(RowIndex(0)).as_deref(), Some("0206"));
    }

    #[test]
    fn mismatch_without_justification_is_flagged() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:70,0299:30", None, None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::ClawbackNeeded);
        assert_eq!(codes(&s, 0), vec![some("0206"), None, None, None]);
        assert_eq!(s.forc_string(RowIndex(0)).as_deref(), Some("0206:70,0299:30"));
    }

    #[test]
    fn single_new_code_goes_to_clawback_slot() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "1103", Some("wrong panel"), None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::Resolved);
        assert_eq!(codes(&s, 0), vec![None, None, None, some("1103")]);
        assert_eq!(pcts(&s, 0)[3], Some(100.0));
        assert_eq!(s.clawback_justification(RowIndex(0)).as_deref(), Some("wrong panel"));
    }

    #[test]
    fn heavy_missing_code_moves_and_rebalances() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:34,0299:66", Some("core method"), None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::Resolved);
        assert_eq!(codes(&s, 0), vec![some("0206"), None, None, some("0299")]);
        assert_eq!(pcts(&s, 0), vec![Some(100.0), None, None, Some(66.0)]);
    }

    #[test]
    fn no_adjustment_keeps_parsed_weights() {
        let mut config = ClassifyConfig::default();
        config.clawback.rebalance = RebalancePolicy::NoAdjustment;
        let mut s = store(&[row_with(["0206", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:30,0299:70", Some("core method"), None)
            .unwrap();
        assert_eq!(pcts(&s, 0), vec![Some(30.0), None, None, Some(70.0)]);
    }

    #[test]
    fn light_missing_code_is_flagged() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:35,0299:65", Some("core method"), None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::ClawbackNeeded);
        assert_eq!(codes(&s, 0), vec![some("0206"), None, None, None]);
    }

    #[test]
    fn two_missing_codes_are_flagged() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:10,0299:70,0301:20", Some("x"), None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::ClawbackNeeded);
    }

    #[test]
    fn all_present_but_inconsistent_is_confused() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["", "1103", "0301"])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:40,1103:40,0301:20", Some("x"), None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::Confused);
        assert_eq!(codes(&s, 0), vec![None, some("1103"), some("0301"), None]);
    }

    #[test]
    fn refined_secondary_codes_are_missing() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "11", ""])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206:20,1103:70,0301:10", Some("x"), None)
            .unwrap();
        // 1103 refines 11 but still differs from it; with 0301 that is two
        // codes for the one FOR4 slot.
        assert_eq!(s.status(RowIndex(0)), StatusCode::ClawbackNeeded);
        assert_eq!(codes(&s, 0), vec![some("0206"), some("11"), None, None]);
    }

    #[test]
    fn md_marker_overwrites() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", "MD"])]);
        AllocationEngine::new(&config)
            .apply_code_string(&mut s, "1103:60,1199:40", None, None)
            .unwrap();
        assert_eq!(s.status(RowIndex(0)), StatusCode::Resolved);
        assert_eq!(codes(&s, 0), vec![some("1103"), some("1199"), None, None]);
        assert_eq!(pcts(&s, 0), vec![Some(60.0), Some(40.0), None, None]);
    }

    #[test]
    fn bad_string_touches_nothing() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["0206", "", ""])]);
        let engine = AllocationEngine::new(&config);
        assert!(matches!(
            engine.apply_code_string(&mut s, "02x6", None, None),
            Err(ClassifyError::InvalidFormat(_))
        ));
        assert!(matches!(
            engine.apply_code_string(&mut s, "0206:70,0299:70", None, None),
            Err(ClassifyError::PercentageMismatch { .. })
        ));
        assert_eq!(s.status(RowIndex(0)), StatusCode::Unhandled);
        assert_eq!(s.forc_string(RowIndex(0)), None);
    }

    #[test]
    fn target_limits_candidates() {
        let config = ClassifyConfig::default();
        let mut s = store(&[
            row_with(["", "", ""]),
            ["Lee, B.", "0", "", "", "", "", "", ""],
            ["Gee, A.", "1", "", "", "", "", "", ""],
        ]);
        let authors = SearchField::authors();
        let report = AllocationEngine::new(&config)
            .apply_code_string(&mut s, "0206", None, Some(("gee", &authors)))
            .unwrap();
        assert_eq!(report.touched.len(), 1);
        assert!(report.touched.contains(&RowIndex(0)));
        assert_eq!(s.status(RowIndex(1)), StatusCode::Unhandled);
        assert_eq!(s.forc_string(RowIndex(2)), None);
    }

    #[test]
    fn exempt_discipline_does_not_resolve() {
        let config = ClassifyConfig::default();
        let engine = AllocationEngine::new(&config);
        let mut s = store(&[row_with(["", "", ""])]);
        let report = engine.assign_discipline(&mut s, "Gee", "quantum", &SearchField::authors());
        assert_eq!(report.outcomes[&RowIndex(0)], StatusCode::Unhandled);
        assert_eq!(s.discipline(RowIndex(0)).as_deref(), Some("quantum"));

        let mut s = store(&[row_with(["", "", ""])]);
        engine.assign_discipline(&mut s, "Gee", "chemistry", &SearchField::authors());
        assert_eq!(s.status(RowIndex(0)), StatusCode::Resolved);
    }

    #[test]
    fn blank_discipline_assigns_nothing() {
        let config = ClassifyConfig::default();
        let mut s = store(&[row_with(["", "", ""])]);
        let report = AllocationEngine::new(&config).assign_discipline(&mut s, "Gee", "  ", &SearchField::authors());
        assert!(report.touched.is_empty());
        assert_eq!(s.discipline(RowIndex(0)), None);
    }
}
