use std::borrow::Cow;

use tracing::trace;

use crate::Rule;

use super::error::ParseError;
use super::grammar;

/// Cut `line` at its first unescaped `#`. An escaped `\#` is kept as a
/// literal `#`.
pub(crate) fn strip_comment(line: &str) -> Cow<'_, str> {
    if !line.contains('#') {
        return Cow::Borrowed(line);
    }
    if !line.contains("\\#") {
        let end = line.find('#').unwrap_or(line.len());
        return Cow::Borrowed(&line[..end]);
    }

    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Parse a single raw line of a rule file.
///
/// `line_no` is 1-based and only used for error reporting. Returns `Ok(None)`
/// for comment-only and blank lines.
pub(crate) fn parse_line(line_no: usize, raw: &str) -> Result<Option<Rule>, ParseError> {
    if raw.starts_with('#') {
        return Ok(None);
    }
    let stripped = strip_comment(raw);
    let line = stripped.trim();
    if line.is_empty() {
        return Ok(None);
    }

    trace!(line = line_no, text = line, "parsing access transform line");
    let rule = grammar::parse_rule(line).map_err(|kind| ParseError::new(line_no, line, kind))?;
    trace!(
        line = line_no,
        kind = %rule.target().kind(),
        transform = %rule.target(),
        "parsed access transform"
    );
    Ok(Some(rule))
}
