use std::fmt;

use super::access::{AccessLevel, EditAction, Modifier, ModifierEdit};
use super::error::MergeError;
use super::target::TransformTarget;

/// One parsed access transform: widen `target` to `level` and apply `edits`.
///
/// Rules are immutable once built. `edits` holds at most one entry per
/// [`Modifier`]; when the same modifier is edited twice the later edit wins.
///
/// # Example
///
/// ```
/// use access_transformer::{AccessLevel, Modifier, ModifierEdit, Rule};
///
/// let rule = Rule::field("eu.mikroskeem.Foo", "bar", AccessLevel::Public)
///     .with_edit(ModifierEdit::remove(Modifier::Final));
/// assert_eq!(rule.to_string(), "public-f eu.mikroskeem.Foo bar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    target: TransformTarget,
    level: AccessLevel,
    edits: Vec<ModifierEdit>,
}

impl Rule {
    pub fn new(
        target: TransformTarget,
        level: AccessLevel,
        edits: impl IntoIterator<Item = ModifierEdit>,
    ) -> Self {
        let mut rule = Self {
            target,
            level,
            edits: Vec::new(),
        };
        for edit in edits {
            rule.put_edit(edit);
        }
        rule
    }

    #[must_use]
    pub fn class(class_name: &str, level: AccessLevel) -> Self {
        Self::new(TransformTarget::class(class_name), level, [])
    }

    #[must_use]
    pub fn field(class_name: &str, name: &str, level: AccessLevel) -> Self {
        Self::new(TransformTarget::field(class_name, name), level, [])
    }

    #[must_use]
    pub fn method(class_name: &str, descriptor: &str, level: AccessLevel) -> Self {
        Self::new(TransformTarget::method(class_name, descriptor), level, [])
    }

    /// Return this rule with one more modifier edit.
    #[must_use]
    pub fn with_edit(mut self, edit: ModifierEdit) -> Self {
        self.put_edit(edit);
        self
    }

    #[must_use]
    pub fn target(&self) -> &TransformTarget {
        &self.target
    }

    #[must_use]
    pub fn level(&self) -> AccessLevel {
        self.level
    }

    #[must_use]
    pub fn edits(&self) -> &[ModifierEdit] {
        &self.edits
    }

    /// The action this rule takes on `modifier`, if any.
    #[must_use]
    pub fn edit_for(&self, modifier: Modifier) -> Option<EditAction> {
        self.edits
            .iter()
            .find(|e| e.modifier == modifier)
            .map(|e| e.action)
    }

    /// Whether two rules address exactly the same class, field or method.
    #[must_use]
    pub fn is_mergeable_with(&self, other: &Rule) -> bool {
        self.target == other.target
    }

    /// Combine two rules for the same target.
    ///
    /// The result takes the more permissive of the two levels. Modifier edits
    /// are unioned by modifier; on a collision `other`'s edit wins.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MismatchedTarget`] if the targets differ in kind,
    /// class or member.
    pub fn merge(&self, other: &Rule) -> Result<Rule, MergeError> {
        if !self.is_mergeable_with(other) {
            return Err(MergeError::mismatched(&self.target, &other.target));
        }
        let mut merged = self.clone();
        merged.level = self.level.max(other.level);
        for &edit in &other.edits {
            merged.put_edit(edit);
        }
        Ok(merged)
    }

    /// Layer a specific rule over this wildcard rule.
    ///
    /// Behaves like [`merge`](Self::merge) but the result addresses
    /// `specific`'s target, so a `*` field rule can be combined with a rule
    /// for one named field of the same class.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MismatchedTarget`] unless `self` is a wildcard
    /// of the same kind and class as `specific`.
    pub fn merge_wildcard(&self, specific: &Rule) -> Result<Rule, MergeError> {
        let compatible = self.target.is_wildcard()
            && self.target.kind() == specific.target.kind()
            && self.target.class_name() == specific.target.class_name();
        if !compatible {
            return Err(MergeError::mismatched(&self.target, &specific.target));
        }
        let retargeted = Rule {
            target: specific.target.clone(),
            level: self.level,
            edits: self.edits.clone(),
        };
        retargeted.merge(specific)
    }

    fn put_edit(&mut self, edit: ModifierEdit) {
        match self.edits.iter_mut().find(|e| e.modifier == edit.modifier) {
            Some(existing) => *existing = edit,
            None => self.edits.push(edit),
        }
    }
}

/// Canonical rule-file text for this rule.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        for edit in &self.edits {
            write!(f, "{edit}")?;
        }
        write!(f, " {}", self.target)
    }
}
