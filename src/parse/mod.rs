mod error;
mod grammar;
mod parser;

pub use error::{ParseError, ParseErrorKind};

use crate::Rule;

/// Parse rule-file text into its rules, in file order.
///
/// Blank lines, `#` comment lines and inline `#` comments are skipped. The
/// first malformed line aborts the whole parse.
///
/// # Errors
///
/// Returns [`ParseError`] naming the first line that is not a valid rule.
pub fn parse(input: &str) -> Result<Vec<Rule>, ParseError> {
    let mut rules = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        if let Some(rule) = parser::parse_line(idx + 1, line)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Parse one rule line. Returns `Ok(None)` for blank and comment lines.
///
/// # Errors
///
/// Returns [`ParseError`] (reported as line 1) if the line is malformed.
pub fn parse_line(line: &str) -> Result<Option<Rule>, ParseError> {
    parser::parse_line(1, line)
}

pub(crate) use parser::parse_line as parse_numbered_line;
