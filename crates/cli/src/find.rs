// Match preview: which rows would a discipline or FORC target hit

use std::path::Path;

use erafix_classify::matcher;
use erafix_engine::{Field, RecordStore, RowIndex, StatusCode};
use serde::Serialize;

use crate::exit_codes::EXIT_ERROR;
use crate::{load_config, open_workbook, CliError, GlobalOpts, Target};

#[derive(Debug, Serialize)]
struct MatchPreview {
    row: RowIndex,
    /// Matched author (title-cased) or the venue.
    name: Option<String>,
    authors: Option<String>,
    title: Option<String>,
    discipline: Option<String>,
    status: StatusCode,
}

#[derive(Debug, Serialize)]
struct FindOutput<'a> {
    term: &'a str,
    column: &'a str,
    total: usize,
    rows: Vec<MatchPreview>,
}

pub fn cmd_find(file: &Path, target: &Target, limit: usize, global: &GlobalOpts) -> Result<(), CliError> {
    let (term, search) = target.resolve()?;
    if global.output.is_some() {
        log::warn!("--output is ignored by find");
    }

    let config = load_config(global)?;
    let book = open_workbook(file, global, &config)?;
    let store = &book.store;

    let rows = matcher::find(store, term, &search, false, false);
    let previews: Vec<MatchPreview> = rows
        .iter()
        .map(|&row| preview(store, row, term, search.field))
        .collect();
    let column = store.names().name(search.field);

    if global.json {
        let output = FindOutput { term, column, total: previews.len(), rows: previews };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if previews.is_empty() {
        eprintln!("No rows match '{}' in {}", term.trim(), column);
        return Ok(());
    }

    eprintln!("{} row(s) match '{}' in {}", previews.len(), term.trim(), column);
    for p in previews.iter().take(limit) {
        println!(
            "  row {:<5} {}  |  {}  |  {}",
            p.row.to_string(),
            p.name.as_deref().unwrap_or("-"),
            p.authors.as_deref().unwrap_or("-"),
            p.title.as_deref().unwrap_or("-"),
        );
    }
    if previews.len() > limit {
        eprintln!("  ... {} more (use --limit or --json)", previews.len() - limit);
    }
    Ok(())
}

fn preview(store: &RecordStore, row: RowIndex, term: &str, field: Field) -> MatchPreview {
    let authors = store.text(row, Field::Authors);
    let name = match field {
        Field::Authors => authors.as_deref().and_then(|list| matcher::full_name(list, term)),
        other => store.text(row, other),
    };
    MatchPreview {
        row,
        name,
        authors,
        title: store.text(row, Field::Title),
        discipline: store.discipline(row),
        status: store.status(row),
    }
}
