use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

use crate::index::RuleIndex;
use crate::parse::{parse_numbered_line, ParseError};

use super::error::TransformError;
use super::rule::Rule;
use super::target::normalize_class_name;
use super::transform_report::TransformReport;

#[derive(Debug, Clone)]
enum Input {
    Source(String),
    Rule(Rule),
}

/// Builder for a [`RuleSet`].
///
/// Rule-file text and programmatic rules are collected in call order and
/// only parsed by [`build()`](Self::build), so several rule files can be
/// layered into one set.
///
/// # Example
///
/// ```
/// use access_transformer::{AccessLevel, Rule, RuleSetBuilder};
///
/// let rules = RuleSetBuilder::new()
///     .source("public eu.mikroskeem.Foo bar\n")
///     .source("# nothing here\n")
///     .rule(Rule::class("eu.mikroskeem.Foo", AccessLevel::Public))
///     .build()
///     .unwrap();
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    inputs: Vec<Input>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the text of one rule file.
    #[must_use]
    pub fn source(mut self, text: impl Into<String>) -> Self {
        self.inputs.push(Input::Source(text.into()));
        self
    }

    /// Add a rule directly.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.inputs.push(Input::Rule(rule));
        self
    }

    /// Add several rules directly.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.inputs.extend(rules.into_iter().map(Input::Rule));
        self
    }

    /// Parse every source and build the immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`]. Line numbers are relative to the
    /// source the error occurred in.
    pub fn build(self) -> Result<RuleSet, ParseError> {
        let mut rules = Vec::new();
        for input in self.inputs {
            match input {
                Input::Source(text) => rules.extend(crate::parse::parse(&text)?),
                Input::Rule(rule) => rules.push(rule),
            }
        }
        Ok(crate::compile::compile(rules))
    }
}

/// An immutable set of access transform rules. Thread-safe and designed to
/// live behind `Arc`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
    /// Dotted class name to indices into `rules`, in load order.
    pub(crate) by_class: HashMap<String, Vec<usize>>,
    /// Dotted class name to the index of its first class-level rule.
    pub(crate) class_rules: HashMap<String, usize>,
}

impl RuleSet {
    /// Parse rule-file text into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessTransformerError::Parse`](crate::AccessTransformerError::Parse)
    /// for the first malformed line.
    pub fn from_text(input: &str) -> Result<Self, crate::AccessTransformerError> {
        let rules = crate::parse::parse(input)?;
        Ok(crate::compile::compile(rules))
    }

    /// Read rule-file text line by line from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessTransformerError`](crate::AccessTransformerError) on
    /// I/O failure or the first malformed line.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, crate::AccessTransformerError> {
        let mut rules = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            if let Some(rule) = parse_numbered_line(idx + 1, &line?)? {
                rules.push(rule);
            }
        }
        Ok(crate::compile::compile(rules))
    }

    /// Read a rule file and parse it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessTransformerError`](crate::AccessTransformerError) on
    /// I/O or parse failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::AccessTransformerError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_text(&input)
    }

    /// Apply the rules to one class file and return the transformed bytes.
    ///
    /// Only access-flag words and rewritten `invokespecial` opcodes differ
    /// from the input. A class no rule mentions comes back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if the class file is malformed. There is no
    /// partial output.
    pub fn transform_class(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        self.transform_class_detailed(bytes)
            .map(TransformReport::into_bytes)
    }

    /// Apply the rules with detailed diagnostics.
    ///
    /// Returns a [`TransformReport`] with the output bytes, every changed
    /// access-flag word, every refused downgrade and every rewritten call
    /// site.
    ///
    /// # Errors
    ///
    /// See [`transform_class()`](Self::transform_class).
    pub fn transform_class_detailed(&self, bytes: &[u8]) -> Result<TransformReport, TransformError> {
        crate::transform::transform(self, bytes)
    }

    /// The rule index for one class. `class_name` may use `/` or `.`.
    #[must_use]
    pub fn index_for(&self, class_name: &str) -> RuleIndex<'_> {
        RuleIndex::build(self, class_name)
    }

    /// All rules in load order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The class-level rule for `class_name`, the first one loaded if there
    /// are several.
    #[must_use]
    pub fn class_rule(&self, class_name: &str) -> Option<&Rule> {
        self.class_rules
            .get(&normalize_class_name(class_name))
            .map(|&idx| &self.rules[idx])
    }

    /// Every rule naming `class_name`, in load order.
    pub fn rules_for_class(&self, class_name: &str) -> impl Iterator<Item = &Rule> {
        let indices = self
            .by_class
            .get(&normalize_class_name(class_name))
            .map_or(&[][..], Vec::as_slice);
        indices.iter().map(|&idx| &self.rules[idx])
    }

    /// Names of all classes at least one rule mentions, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_class.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Serialize back to rule-file text, one canonical line per rule.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            out.push_str(&rule.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this ruleset to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so callers can tell when the rule files changed.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a ruleset produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this ruleset and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file written by [`to_binary_file`](Self::to_binary_file).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} classes, {} class rules)",
            self.rules.len(),
            self.by_class.len(),
            self.class_rules.len(),
        )
    }
}
