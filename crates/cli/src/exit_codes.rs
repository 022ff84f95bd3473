//! CLI Exit Code Registry
//!
//! Single source of truth for `erafix` exit codes. Batch scripts that run
//! classification passes branch on these, so they are part of the contract.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad arguments, sheet index out of range)    |
//! | 3    | File could not be read or written                        |
//! | 4    | Code string does not match the FORC grammar              |
//! | 5    | Code string percentages do not total 100                 |
//! | 6    | Configuration file invalid                               |
//! | 7    | Workbook has several sheets and none was selected        |
//! | 8    | Rows left needing follow-up (`set-forc --strict` only)   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Update the table above
//! 3. Map the error in `exit_code_for_*`

use erafix_classify::ClassifyError;
use erafix_io::IoError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Files (3)
// =============================================================================

/// Input missing or unreadable, output not writable, unsupported extension.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Classification (4-8)
// =============================================================================

/// FORC string rejected by the grammar. Nothing was loaded or written.
pub const EXIT_INVALID_FORC: u8 = 4;

/// FORC string parsed but its percentages do not total 100.
pub const EXIT_PCT_MISMATCH: u8 = 5;

/// `--config` / `ERAFIX_CONFIG` file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

/// Several sheets, no `--sheet-index`, and stdin is not a terminal.
pub const EXIT_AMBIGUOUS_SHEET: u8 = 7;

/// `--strict` and at least one row ended `ClawbackNeeded` or `confused`.
/// The file is still written.
pub const EXIT_FLAGGED: u8 = 8;

pub fn exit_code_for_classify(err: &ClassifyError) -> u8 {
    match err {
        ClassifyError::InvalidFormat(_) => EXIT_INVALID_FORC,
        ClassifyError::PercentageMismatch { .. } => EXIT_PCT_MISMATCH,
        ClassifyError::ConfigParse(_) | ClassifyError::ConfigValidation(_) => EXIT_CONFIG,
    }
}

pub fn exit_code_for_io(err: &IoError) -> u8 {
    match err {
        IoError::AmbiguousSheet { .. } => EXIT_AMBIGUOUS_SHEET,
        IoError::SheetIndex { .. } => EXIT_USAGE,
        IoError::NotFound(_)
        | IoError::Open { .. }
        | IoError::NoSheets(_)
        | IoError::Read { .. }
        | IoError::Write { .. }
        | IoError::UnsupportedFormat(_)
        | IoError::Store(_) => EXIT_IO,
    }
}
