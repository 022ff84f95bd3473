// Commands that change classification state: discipline, carry-forward, set-forc

use std::path::Path;

use erafix_classify::{forc, AllocationEngine, AllocationReport};
use erafix_engine::{Field, StatusCode};

use crate::exit_codes::EXIT_FLAGGED;
use crate::{finish, load_config, open_workbook, output_path, CliError, GlobalOpts, OptionalTarget, Target};

pub fn cmd_discipline(file: &Path, target: &Target, discipline: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let (term, search) = target.resolve()?;
    if discipline.trim().is_empty() {
        return Err(CliError::usage("--set needs a non-empty discipline"));
    }

    let config = load_config(global)?;
    let out = output_path(file, global)?;
    let mut book = open_workbook(file, global, &config)?;

    let engine = AllocationEngine::new(&config);
    let report = engine.assign_discipline(&mut book.store, term, discipline, &search);

    if report.summary.touched == 0 {
        eprintln!("No unassigned rows match '{}'", term.trim());
    } else if config.is_exempt(discipline.trim()) {
        eprintln!("'{}' is exempt: matched rows stay unhandled", discipline.trim());
    }
    finish(&book, &out, &report, global)
}

pub fn cmd_carry_forward(file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config(global)?;
    let out = output_path(file, global)?;
    let mut book = open_workbook(file, global, &config)?;

    let engine = AllocationEngine::new(&config);
    let report = engine.carry_forward(&mut book.store);
    finish(&book, &out, &report, global)
}

pub fn cmd_set_forc(
    file: &Path,
    forc_string: &str,
    justify: Option<&str>,
    target: &OptionalTarget,
    strict: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Reject the string before the workbook is read.
    forc::parse(forc_string).map_err(CliError::classify)?;

    let config = load_config(global)?;
    let out = output_path(file, global)?;
    let mut book = open_workbook(file, global, &config)?;

    let engine = AllocationEngine::new(&config);
    let target = target.resolve();
    let report = engine
        .apply_code_string(
            &mut book.store,
            forc_string,
            justify,
            target.as_ref().map(|(term, search)| (*term, search)),
        )
        .map_err(CliError::classify)?;

    finish(&book, &out, &report, global)?;

    let flagged = report.summary.flagged();
    if flagged > 0 {
        let status_column = config.columns.name(Field::Status);
        let detail = follow_up_rows(&report);
        if strict {
            return Err(CliError::new(EXIT_FLAGGED, format!("{} row(s) need follow-up ({})", flagged, detail)).with_hint(
                format!("filter {} for ClawbackNeeded or confused; rerun with --justify to move codes to FOR4", status_column),
            ));
        }
        eprintln!("{} row(s) need follow-up (see {}): {}", flagged, status_column, detail);
    }
    Ok(())
}

/// `clawback_needed: 0, 4; confused: 7`, data rows numbered from 0.
fn follow_up_rows(report: &AllocationReport) -> String {
    StatusCode::ALL
        .into_iter()
        .filter(|status| status.needs_follow_up())
        .filter_map(|status| {
            let rows = report.rows_with(status);
            if rows.is_empty() {
                return None;
            }
            let rows: Vec<String> = rows.iter().map(|row| row.to_string()).collect();
            Some(format!("{}: {}", status, rows.join(", ")))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
