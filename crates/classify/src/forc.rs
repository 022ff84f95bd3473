//! FORC string parser.
//!
//! Grammar: up to three `code[:pct]` groups, comma separated, e.g.
//! `0206:70,0299:30` or a bare `0206` (implies 100%). Codes are 2-4 digits,
//! percentages exactly 2 digits. Omitted percentages are filled in so the
//! three weights always total 100.

use erafix_engine::{CodeValue, Slot};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::ClassifyError;

static FORC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(\d{2,4})(?::(\d{2}))?,?",
        r"(?:(\d{2,4})(?::(\d{2}))?,?)?",
        r"(?:(\d{2,4})(?::(\d{2}))?,?)?$",
    ))
    .expect("FORC regex is valid")
});

/// Up to three codes with their normalized percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCodes {
    pub codes: [Option<CodeValue>; 3],
    pub pcts: [f64; 3],
}

impl ParsedCodes {
    /// Code in a weighted slot. The clawback slot is never parsed.
    pub fn code(&self, slot: Slot) -> Option<&CodeValue> {
        self.codes.get(slot.index()).and_then(Option::as_ref)
    }

    pub fn pct(&self, slot: Slot) -> f64 {
        self.pcts.get(slot.index()).copied().unwrap_or(0.0)
    }

    /// Number of codes supplied.
    pub fn count(&self) -> usize {
        self.codes.iter().flatten().count()
    }
}

impl std::str::FromStr for ParsedCodes {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

pub fn parse(input: &str) -> Result<ParsedCodes, ClassifyError> {
    let caps = FORC_RE
        .captures(input)
        .ok_or_else(|| ClassifyError::InvalidFormat(input.to_string()))?;

    let code = |i: usize| caps.get(i).map(|m| CodeValue::verbatim(m.as_str()));
    // Two ASCII digits always parse.
    let pct = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let codes = [code(1), code(3), code(5)];
    let [mut pct1, mut pct2, mut pct3] = [pct(2), pct(4), pct(6)];

    if pct1 == 0.0 && pct2 == 0.0 && pct3 == 0.0 {
        pct1 = 100.0;
    } else if pct1 < 100.0 && pct2 == 0.0 && codes[1].is_none() {
        pct2 = 100.0 - pct1;
    }
    if pct1 + pct2 < 100.0 && pct3 == 0.0 {
        pct3 = 100.0 - pct1 - pct2;
    }

    if pct1 + pct2 + pct3 != 100.0 {
        return Err(ClassifyError::PercentageMismatch { pct1, pct2, pct3 });
    }

    log::debug!("parsed FORC '{input}' -> {codes:?} / [{pct1}, {pct2}, {pct3}]");
    Ok(ParsedCodes { codes, pcts: [pct1, pct2, pct3] })
}
