use std::fmt;
use std::str::FromStr;

use crate::classfile::MethodAccess;

// Field, method and inner-class tables share these bit positions.
pub(crate) const ACC_PUBLIC: u16 = MethodAccess::PUBLIC.bits();
pub(crate) const ACC_PRIVATE: u16 = MethodAccess::PRIVATE.bits();
pub(crate) const ACC_PROTECTED: u16 = MethodAccess::PROTECTED.bits();
pub(crate) const ACC_FINAL: u16 = MethodAccess::FINAL.bits();

/// The three visibility bits of an access-flag word.
pub const VISIBILITY_MASK: u16 = ACC_PUBLIC | ACC_PRIVATE | ACC_PROTECTED;

/// Visibility of a class, field or method.
///
/// Variants are ordered from least to most permissive, so `Ord` answers
/// "is this level wider than that one".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessLevel {
    Private,
    PackageLocal,
    Protected,
    Public,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::Private,
        AccessLevel::PackageLocal,
        AccessLevel::Protected,
        AccessLevel::Public,
    ];

    /// The word used for this level in rule files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::PackageLocal => "default",
            AccessLevel::Protected => "protected",
            AccessLevel::Public => "public",
        }
    }

    /// The visibility bit this level sets. Package-local sets none.
    #[must_use]
    pub fn flag(self) -> u16 {
        match self {
            AccessLevel::Private => ACC_PRIVATE,
            AccessLevel::PackageLocal => 0,
            AccessLevel::Protected => ACC_PROTECTED,
            AccessLevel::Public => ACC_PUBLIC,
        }
    }

    /// Read the level encoded in an access-flag word.
    ///
    /// Well-formed class files set at most one visibility bit. If several are
    /// set anyway, the most permissive one is reported.
    #[must_use]
    pub fn from_flags(flags: u16) -> Self {
        if flags & ACC_PUBLIC != 0 {
            AccessLevel::Public
        } else if flags & ACC_PROTECTED != 0 {
            AccessLevel::Protected
        } else if flags & ACC_PRIVATE != 0 {
            AccessLevel::Private
        } else {
            AccessLevel::PackageLocal
        }
    }

    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessLevel::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or(())
    }
}

/// A flag bit that a rule can toggle independently of visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Modifier {
    Final,
}

impl Modifier {
    pub const ALL: [Modifier; 1] = [Modifier::Final];

    /// The short word used after `+`/`-` in an access spec.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Modifier::Final => "f",
        }
    }

    #[must_use]
    pub fn flag(self) -> u16 {
        match self {
            Modifier::Final => ACC_FINAL,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Modifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modifier::ALL
            .into_iter()
            .find(|m| m.symbol() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum EditAction {
    Add,
    Remove,
}

impl EditAction {
    #[must_use]
    pub fn sign(self) -> char {
        match self {
            EditAction::Add => '+',
            EditAction::Remove => '-',
        }
    }

    #[must_use]
    pub fn from_sign(sign: char) -> Option<Self> {
        match sign {
            '+' => Some(EditAction::Add),
            '-' => Some(EditAction::Remove),
            _ => None,
        }
    }
}

/// One `+f` / `-f` entry of an access spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierEdit {
    pub modifier: Modifier,
    pub action: EditAction,
}

impl ModifierEdit {
    #[must_use]
    pub fn add(modifier: Modifier) -> Self {
        Self {
            modifier,
            action: EditAction::Add,
        }
    }

    #[must_use]
    pub fn remove(modifier: Modifier) -> Self {
        Self {
            modifier,
            action: EditAction::Remove,
        }
    }

    /// Apply this edit to an access-flag word.
    #[must_use]
    pub fn apply(self, flags: u16) -> u16 {
        match self.action {
            EditAction::Add => flags | self.modifier.flag(),
            EditAction::Remove => flags & !self.modifier.flag(),
        }
    }
}

impl fmt::Display for ModifierEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action.sign(), self.modifier)
    }
}
