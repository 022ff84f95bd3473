use std::path::Path;

use erafix_io::split_by_discipline;

use crate::exit_codes::EXIT_ERROR;
use crate::{load_config, open_workbook, CliError, GlobalOpts};

pub fn cmd_split(file: &Path, prefix: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    if global.output.is_some() {
        log::warn!("--output is ignored by split; files are named from --prefix");
    }

    let config = load_config(global)?;
    let book = open_workbook(file, global, &config)?;
    let written = split_by_discipline(&book.store, prefix).map_err(CliError::from_io)?;

    if global.json {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        let json = serde_json::to_string_pretty(&paths)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
    }

    if written.is_empty() {
        eprintln!("No row has a discipline; nothing written");
    }
    for path in &written {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
