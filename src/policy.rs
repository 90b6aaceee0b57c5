//! The access override policy: given an access-flag word and a rule, compute
//! the new flags.
//!
//! Visibility may only be widened. A rule asking for the current level or a
//! narrower one leaves the visibility bits alone. Modifier edits are applied
//! unconditionally.

use crate::types::VISIBILITY_MASK;
use crate::{AccessLevel, ModifierEdit, Rule};

/// Result of running the policy over one access-flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    pub flags: u16,
    /// Set when the rule asked for a strictly narrower level than the
    /// current one.
    pub denied: Option<Downgrade>,
}

/// A visibility narrowing that the policy refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Downgrade {
    pub current: AccessLevel,
    pub requested: AccessLevel,
}

/// New flags for `flags` under `rule`. `None` leaves the flags unchanged.
#[must_use]
pub fn apply(flags: u16, rule: Option<&Rule>) -> u16 {
    override_access(flags, rule).flags
}

/// Like [`apply`], but also reports a refused downgrade.
#[must_use]
pub fn override_access(flags: u16, rule: Option<&Rule>) -> Override {
    let Some(rule) = rule else {
        return Override {
            flags,
            denied: None,
        };
    };
    let visibility = override_level(flags, rule.level());
    Override {
        flags: apply_edits(visibility.flags, rule.edits()),
        denied: visibility.denied,
    }
}

/// Apply only the visibility half of the policy.
#[must_use]
pub fn override_level(flags: u16, requested: AccessLevel) -> Override {
    let current = AccessLevel::from_flags(flags);
    if requested <= current {
        let denied = (requested < current).then_some(Downgrade { current, requested });
        return Override { flags, denied };
    }
    Override {
        flags: (flags & !VISIBILITY_MASK) | requested.flag(),
        denied: None,
    }
}

/// Apply modifier edits in order.
#[must_use]
pub fn apply_edits(flags: u16, edits: &[ModifierEdit]) -> u16 {
    edits.iter().fold(flags, |flags, edit| edit.apply(flags))
}
