// erafix - ERA research output classification, headless
//
// Every command loads one sheet of a workbook (or a CSV), runs one
// classification pass over it and writes the result back.

mod allocate;
mod exit_codes;
mod find;
mod logging;
mod prompt;
mod split;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use erafix_classify::{AllocationReport, ClassifyConfig, ClassifyError, SearchField};
use erafix_io::{FileFormat, IoError, LoadedWorkbook};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "erafix")]
#[command(about = "Classify research outputs against ERA field-of-research codes")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Classification config (TOML)
    #[arg(long, global = true, env = "ERAFIX_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Sheet to work on (0-based) when the workbook has several
    #[arg(long, global = true, value_name = "N")]
    pub sheet_index: Option<usize>,

    /// Print the result as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Write the result here instead of back to FILE
    #[arg(short, long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Exactly one search field.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Match a name in the author list
    #[arg(long, value_name = "NAME")]
    pub author: Option<String>,

    /// Match the journal or conference title
    #[arg(long, value_name = "TITLE")]
    pub journal: Option<String>,
}

/// At most one search field.
#[derive(Args, Debug, Clone)]
#[group(required = false, multiple = false)]
pub struct OptionalTarget {
    /// Only rows with this author
    #[arg(long, value_name = "NAME")]
    pub author: Option<String>,

    /// Only rows from this journal or conference
    #[arg(long, value_name = "TITLE")]
    pub journal: Option<String>,
}

fn search_for<'a>(author: Option<&'a str>, journal: Option<&'a str>) -> Option<(&'a str, SearchField)> {
    match (author, journal) {
        (Some(term), _) => Some((term, SearchField::authors())),
        (None, Some(term)) => Some((term, SearchField::venue())),
        (None, None) => None,
    }
}

impl Target {
    pub fn resolve(&self) -> Result<(&str, SearchField), CliError> {
        search_for(self.author.as_deref(), self.journal.as_deref())
            .ok_or_else(|| CliError::usage("one of --author or --journal is required"))
    }
}

impl OptionalTarget {
    pub fn resolve(&self) -> Option<(&str, SearchField)> {
        search_for(self.author.as_deref(), self.journal.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Set the discipline of unassigned rows matching an author or journal
    #[command(after_help = "\
Rows are marked handled unless the discipline is exempt (quantum, astro,
photonics, biophotonics by default); exempt rows stay unhandled so their
codes can be set later.

Examples:
  erafix discipline outputs.xlsx --author \"Gee\" --set chemistry
  erafix discipline outputs.xlsx --journal \"Physical Review A\" --set quantum
  erafix discipline outputs.xlsx --sheet-index 1 --author Lee --set astro")]
    Discipline {
        /// Workbook or CSV to update
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Discipline to assign
        #[arg(long = "set", value_name = "DISCIPLINE")]
        discipline: String,
    },

    /// Copy ERA 2015 codes into empty ERA 2018 columns of unhandled rows
    #[command(after_help = "\
Existing ERA 2018 values are never overwritten. Rows with any 2015 code or
percentage are marked carried forward (2).

Examples:
  erafix carry-forward outputs.xlsx
  erafix carry-forward outputs.xlsx --output carried.xlsx")]
    CarryForward {
        /// Workbook or CSV to update
        file: PathBuf,
    },

    /// Reconcile a FORC code string against unhandled rows
    #[command(after_help = "\
FORC is up to three codes with optional percentages, e.g. 0206, 0206:70,0299:30
or 0206:40,0299:40,0301. Missing percentages are filled so the total is 100.

Rows whose existing codes disagree need --justify to move the odd code into
FOR4; otherwise they are marked ClawbackNeeded. With --strict, exit 8 when any
row is left ClawbackNeeded or confused (the file is still written).

Examples:
  erafix set-forc outputs.xlsx 0206:70,0299:30
  erafix set-forc outputs.xlsx 0206 --author Gee --justify \"Reviewed by panel\"
  erafix set-forc outputs.csv 0101 --strict --json")]
    SetForc {
        /// Workbook or CSV to update
        file: PathBuf,

        /// Code string, e.g. 0206:70,0299:30
        forc: String,

        /// Clawback justification written when a code moves to FOR4
        #[arg(long, value_name = "TEXT")]
        justify: Option<String>,

        #[command(flatten)]
        target: OptionalTarget,

        /// Exit 8 if any row needs follow-up
        #[arg(long)]
        strict: bool,
    },

    /// Write one workbook per discipline
    #[command(after_help = "\
Writes <PREFIX>_<discipline>.xlsx for every discipline present. Rows without
a discipline are skipped.

Examples:
  erafix split outputs.xlsx --prefix out/era2018")]
    Split {
        /// Workbook or CSV to read
        file: PathBuf,

        /// Output path prefix
        #[arg(long, value_name = "PREFIX")]
        prefix: PathBuf,
    },

    /// Preview rows matching an author or journal
    #[command(after_help = "\
Examples:
  erafix find outputs.xlsx --author Gee
  erafix find outputs.xlsx --journal Nature --limit 10
  erafix find outputs.xlsx --author Gee --json")]
    Find {
        /// Workbook or CSV to read
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Rows to show
        #[arg(long, default_value_t = 4)]
        limit: usize,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match logging::init_logging(cli.global.verbose) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: {err}");
            None
        }
    };

    let global = &cli.global;
    let result = match cli.command {
        Commands::Discipline { file, target, discipline } => {
            allocate::cmd_discipline(&file, &target, &discipline, global)
        }
        Commands::CarryForward { file } => allocate::cmd_carry_forward(&file, global),
        Commands::SetForc { file, forc, justify, target, strict } => {
            allocate::cmd_set_forc(&file, &forc, justify.as_deref(), &target, strict, global)
        }
        Commands::Split { file, prefix } => split::cmd_split(&file, &prefix, global),
        Commands::Find { file, target, limit } => find::cmd_find(&file, &target, limit, global),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Parser and config errors, with their registry code.
    pub fn classify(err: ClassifyError) -> Self {
        let hint = match &err {
            ClassifyError::InvalidFormat(_) => {
                Some("expected up to three codes, e.g. 0206 or 0206:70,0299:30 (no spaces)".to_string())
            }
            ClassifyError::PercentageMismatch { .. } => {
                Some("percentages must add up to 100".to_string())
            }
            ClassifyError::ConfigParse(_) | ClassifyError::ConfigValidation(_) => None,
        };
        Self { code: exit_code_for_classify(&err), message: err.to_string(), hint }
    }

    /// Reader/Writer errors, with their registry code.
    pub fn from_io(err: IoError) -> Self {
        let hint = match &err {
            IoError::AmbiguousSheet { sheets } => Some(format!(
                "pass --sheet-index N (0-{}) to choose a sheet",
                sheets.len().saturating_sub(1)
            )),
            IoError::SheetIndex { count, .. } => {
                Some(format!("the workbook has {count} sheet(s), numbered from 0"))
            }
            IoError::UnsupportedFormat(_) => {
                Some("supported: .xlsx .xlsm .xls .xlsb .ods .csv".to_string())
            }
            _ => None,
        };
        Self { code: exit_code_for_io(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared command plumbing
// ============================================================================

/// `--config` / `ERAFIX_CONFIG`, or built-in defaults.
pub fn load_config(global: &GlobalOpts) -> Result<ClassifyConfig, CliError> {
    let Some(path) = global.config.as_deref() else {
        return Ok(ClassifyConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {}", path.display(), e)))?;
    let config = ClassifyConfig::from_toml(&text)
        .map_err(|e| CliError::classify(e).with_hint(format!("check {}", path.display())))?;
    log::info!("using config {}", path.display());
    Ok(config)
}

/// Where a mutating command writes. Rejected before any work is done.
pub fn output_path(file: &Path, global: &GlobalOpts) -> Result<PathBuf, CliError> {
    let out = global.output.clone().unwrap_or_else(|| file.to_path_buf());
    let format = FileFormat::from_path(&out).map_err(CliError::from_io)?;
    if !format.is_writable() {
        let err = CliError::usage(format!("cannot write {}: format is read-only", out.display()));
        return Err(if global.output.is_none() {
            err.with_hint("pass --output <file>.xlsx to save the result")
        } else {
            err.with_hint("use an .xlsx or .csv output")
        });
    }
    Ok(out)
}

/// Load `file`, asking for a sheet on a terminal when several exist.
pub fn open_workbook(file: &Path, global: &GlobalOpts, config: &ClassifyConfig) -> Result<LoadedWorkbook, CliError> {
    match erafix_io::load(file, global.sheet_index, &config.columns) {
        Ok(book) => Ok(book),
        Err(IoError::AmbiguousSheet { sheets }) if prompt::is_interactive() => {
            let index = prompt::choose_sheet(&sheets)?;
            eprintln!("Pass --sheet-index={} to avoid this step", index);
            erafix_io::load(file, Some(index), &config.columns).map_err(CliError::from_io)
        }
        Err(err) => Err(CliError::from_io(err)),
    }
}

/// Save, then print the report (human on stderr, JSON on stdout).
pub fn finish(book: &LoadedWorkbook, out: &Path, report: &AllocationReport, global: &GlobalOpts) -> Result<(), CliError> {
    book.save(out).map_err(CliError::from_io)?;

    if global.json {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization failed: {}", e)))?;
        println!("{}", json);
    }

    let s = &report.summary;
    eprintln!(
        "{}: {} row(s): {} resolved, {} carried forward, {} clawback needed, {} confused, {} unhandled",
        report.operation, s.touched, s.resolved, s.carried_forward, s.clawback_needed, s.confused, s.unhandled,
    );
    eprintln!("Saved to {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn discipline_needs_exactly_one_target() {
        let none = Cli::try_parse_from(["erafix", "discipline", "a.xlsx", "--set", "astro"]);
        assert!(none.is_err());

        let both = Cli::try_parse_from([
            "erafix", "discipline", "a.xlsx", "--author", "Gee", "--journal", "Nature", "--set", "astro",
        ]);
        assert!(both.is_err());

        let one = Cli::try_parse_from(["erafix", "discipline", "a.xlsx", "--author", "Gee", "--set", "astro"]);
        assert!(one.is_ok());
    }

    #[test]
    fn justify_only_on_set_forc() {
        let bad = Cli::try_parse_from(["erafix", "carry-forward", "a.xlsx", "--justify", "x"]);
        assert!(bad.is_err());

        let good = Cli::try_parse_from(["erafix", "set-forc", "a.xlsx", "0206", "--justify", "x"]);
        assert!(good.is_ok());
    }

    #[test]
    fn split_needs_prefix() {
        assert!(Cli::try_parse_from(["erafix", "split", "a.xlsx"]).is_err());
        assert!(Cli::try_parse_from(["erafix", "split", "a.xlsx", "--prefix", "era"]).is_ok());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "erafix", "find", "a.xlsx", "--journal", "Nature", "--sheet-index", "2", "--json", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.sheet_index, Some(2));
        assert!(cli.global.json);
        assert_eq!(cli.global.verbose, 2);
        match cli.command {
            Commands::Find { target, limit, .. } => {
                let (term, search) = target.resolve().unwrap();
                assert_eq!(term, "Nature");
                assert_eq!(search, SearchField::venue());
                assert_eq!(limit, 4);
            }
            _ => panic!("expected find"),
        }
    }

    #[test]
    fn read_only_source_needs_output() {
        let global = GlobalOpts::default();
        let err = output_path(Path::new("outputs.ods"), &global).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.unwrap().contains("--output"));

        let global = GlobalOpts { output: Some(PathBuf::from("fixed.xlsx")), ..GlobalOpts::default() };
        assert_eq!(output_path(Path::new("outputs.ods"), &global).unwrap(), PathBuf::from("fixed.xlsx"));
    }
}
