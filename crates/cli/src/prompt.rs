// Interactive sheet selection for multi-sheet workbooks

use std::io::{self, BufRead, Write};

use crate::exit_codes::{EXIT_AMBIGUOUS_SHEET, EXIT_ERROR};
use crate::CliError;

pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// List `sheets` on stderr and read an index from stdin until one is valid.
pub fn choose_sheet(sheets: &[String]) -> Result<usize, CliError> {
    eprintln!("The workbook has {} sheets:", sheets.len());
    for (i, name) in sheets.iter().enumerate() {
        eprintln!("  [{}] {}", i, name);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        eprint!("Sheet index: ");
        io::stderr().flush().ok();

        let mut buf = String::new();
        let read = input
            .read_line(&mut buf)
            .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;
        if read == 0 {
            return Err(CliError::new(EXIT_AMBIGUOUS_SHEET, "no sheet selected")
                .with_hint("pass --sheet-index N"));
        }

        match parse_choice(&buf, sheets.len()) {
            Some(index) => return Ok(index),
            None => eprintln!("Enter a number from 0 to {}", sheets.len() - 1),
        }
    }
}

fn parse_choice(input: &str, count: usize) -> Option<usize> {
    input.trim().parse::<usize>().ok().filter(|&i| i < count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_must_be_in_range() {
        assert_eq!(parse_choice("1\n", 3), Some(1));
        assert_eq!(parse_choice("  0 ", 3), Some(0));
        assert_eq!(parse_choice("3", 3), None);
        assert_eq!(parse_choice("-1", 3), None);
        assert_eq!(parse_choice("Outputs", 3), None);
    }
}
