//! Access transformation for compiled JVM classes.
//!
//! A rule file lists classes, fields and methods whose visibility should be
//! widened and whose `final` bit should be added or removed:
//!
//! ```text
//! public eu.mikroskeem.Foo                 # the class itself
//! public-f eu.mikroskeem.Foo bar           # field bar, made public and non-final
//! protected eu.mikroskeem.Foo baz(I)V      # one method
//! public eu.mikroskeem.Foo *()             # every method
//! ```
//!
//! [`RuleSet`] holds the parsed rules and rewrites class files in place:
//! only access-flag words (and `invokespecial` self-calls of methods that
//! stop being private) change. Visibility is never narrowed.

pub mod classfile;
mod compile;
mod error;
mod index;
pub mod parse;
mod patch;
pub mod policy;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod transform;
mod types;

pub use error::AccessTransformerError;
pub use index::RuleIndex;
pub use parse::{ParseError, ParseErrorKind};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    normalize_class_name, AccessLevel, DeniedDowngrade, EditAction, Element, FlagChange,
    MergeError, Modifier, ModifierEdit, RewrittenCall, Rule, RuleSet, RuleSetBuilder, TargetKind,
    TransformError, TransformErrorKind, TransformReport, TransformTarget, FIELD_WILDCARD,
    METHOD_WILDCARD, VISIBILITY_MASK,
};
