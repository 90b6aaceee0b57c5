use std::fmt;
use std::time::Duration;

use crate::policy::Downgrade;

/// An access-flag bearing element of a class file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Class,
    Field(String),
    /// Method name followed by its descriptor.
    Method(String),
    /// Binary name of the inner class.
    InnerClass(String),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Class => f.write_str("class"),
            Element::Field(name) => write!(f, "field {name}"),
            Element::Method(signature) => write!(f, "method {signature}"),
            Element::InnerClass(name) => write!(f, "inner class {name}"),
        }
    }
}

/// One rewritten access-flag word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagChange {
    pub element: Element,
    pub old_flags: u16,
    pub new_flags: u16,
}

/// A visibility narrowing that was requested and refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedDowngrade {
    pub element: Element,
    pub downgrade: Downgrade,
}

/// An `invokespecial` rewritten to `invokevirtual`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenCall {
    /// Name and descriptor of the method whose body was patched.
    pub method: String,
    /// Offset of the instruction within the method's code array.
    pub pc: usize,
    /// Offset of the opcode byte within the class file.
    pub offset: usize,
}

/// Detailed result of
/// [`RuleSet::transform_class_detailed()`](super::ruleset::RuleSet::transform_class_detailed).
///
/// Holds the transformed bytes together with everything the transform
/// changed or refused to change.
#[derive(Debug, Clone)]
#[must_use]
pub struct TransformReport {
    class_name: String,
    bytes: Vec<u8>,
    changes: Vec<FlagChange>,
    denied: Vec<DeniedDowngrade>,
    rewritten_calls: Vec<RewrittenCall>,
    duration: Duration,
}

impl TransformReport {
    pub(crate) fn new(
        class_name: String,
        bytes: Vec<u8>,
        changes: Vec<FlagChange>,
        denied: Vec<DeniedDowngrade>,
        rewritten_calls: Vec<RewrittenCall>,
        duration: Duration,
    ) -> Self {
        Self {
            class_name,
            bytes,
            changes,
            denied,
            rewritten_calls,
            duration,
        }
    }

    /// Binary name of the transformed class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The transformed class file, same as
    /// [`RuleSet::transform_class()`](super::ruleset::RuleSet::transform_class).
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Access-flag words that changed, in file order.
    #[must_use]
    pub fn changes(&self) -> &[FlagChange] {
        &self.changes
    }

    #[must_use]
    pub fn denied_downgrades(&self) -> &[DeniedDowngrade] {
        &self.denied
    }

    #[must_use]
    pub fn rewritten_calls(&self) -> &[RewrittenCall] {
        &self.rewritten_calls
    }

    /// Whether the output is byte-identical to the input.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty() && self.rewritten_calls.is_empty()
    }

    /// Wall-clock duration of the transform.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for TransformReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.class_name)?;
        let changed: Vec<String> = self
            .changes
            .iter()
            .map(|c| format!("{} {:#06x} -> {:#06x}", c.element, c.old_flags, c.new_flags))
            .collect();
        write!(f, "changed: [{}]", changed.join(", "))?;
        if !self.denied.is_empty() {
            let denied: Vec<String> = self
                .denied
                .iter()
                .map(|d| {
                    format!(
                        "{} {} -> {}",
                        d.element, d.downgrade.current, d.downgrade.requested
                    )
                })
                .collect();
            write!(f, ", denied: [{}]", denied.join(", "))?;
        }
        if !self.rewritten_calls.is_empty() {
            write!(f, ", rewritten calls: {}", self.rewritten_calls.len())?;
        }
        write!(f, ", duration: {:?}", self.duration)
    }
}
