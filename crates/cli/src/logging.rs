//! Logger bootstrap for the `erafix` binary.
//!
//! Library crates log through the `log` facade; this installs the backend.
//! Diagnostics go to stderr so `--json` output on stdout stays clean.

use flexi_logger::{Logger, LoggerHandle};

/// Environment variable holding a log spec (`debug`, `erafix_classify=debug`, ...).
pub const LOG_ENV: &str = "ERAFIX_LOG";

/// Level for `-v` count when `ERAFIX_LOG` is unset.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Start the stderr logger. The returned handle must outlive every log call.
pub fn init_logging(verbose: u8) -> Result<LoggerHandle, String> {
    let spec = std::env::var(LOG_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| level_for_verbosity(verbose).to_string());

    Logger::try_with_str(&spec)
        .map_err(|err| format!("invalid log spec `{spec}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(1), "info");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "debug");
    }
}
