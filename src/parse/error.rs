use std::fmt;

use thiserror::Error;

/// What was wrong with a rejected rule line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid access level '{0}'")]
    InvalidAccessLevel(String),

    #[error("invalid access modifier '{0}'")]
    InvalidModifier(String),

    #[error("invalid access modifier action '{0}', expected '+' or '-'")]
    InvalidModifierAction(char),

    #[error("malformed method descriptor '{0}': '(' without matching ')'")]
    MalformedMethodDescriptor(String),

    #[error("expected 2 or 3 tokens, found {0}")]
    TokenCount(usize),

    #[error("{0}")]
    Syntax(String),
}

/// Errors produced when parsing rule text.
///
/// Carries the 1-based line number and the offending line (after comment
/// stripping) alongside the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    text: String,
    kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, text: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            line,
            text: text.into(),
            kind,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error on line {}: {} in '{}'",
            self.line, self.kind, self.text
        )
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
