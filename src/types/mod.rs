pub(crate) mod access;
mod error;
mod rule;
mod ruleset;
mod target;
mod transform_report;

pub(crate) use access::ACC_PRIVATE;
pub use access::{AccessLevel, EditAction, Modifier, ModifierEdit, VISIBILITY_MASK};
pub use error::{MergeError, TransformError, TransformErrorKind};
pub use rule::Rule;
pub use ruleset::{RuleSet, RuleSetBuilder};
pub use target::{normalize_class_name, TargetKind, TransformTarget, FIELD_WILDCARD, METHOD_WILDCARD};
pub use transform_report::{DeniedDowngrade, Element, FlagChange, RewrittenCall, TransformReport};
