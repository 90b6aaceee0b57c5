use std::fmt;

use thiserror::Error;

use crate::classfile::ClassFileError;

use super::target::TransformTarget;

/// Raised when two rules that do not address the same thing are merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot merge {left_kind} rule for '{left}' with {right_kind} rule for '{right}'")]
    MismatchedTarget {
        left_kind: String,
        left: String,
        right_kind: String,
        right: String,
    },
}

impl MergeError {
    pub(crate) fn mismatched(left: &TransformTarget, right: &TransformTarget) -> Self {
        MergeError::MismatchedTarget {
            left_kind: left.kind().to_string(),
            left: left.to_string(),
            right_kind: right.kind().to_string(),
            right: right.to_string(),
        }
    }
}

/// Why a class could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformErrorKind {
    #[error("malformed class file: {0}")]
    ClassFile(#[from] ClassFileError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// A failed class transform. No partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    class_name: Option<String>,
    kind: TransformErrorKind,
}

impl TransformError {
    pub(crate) fn new(class_name: Option<&str>, kind: impl Into<TransformErrorKind>) -> Self {
        Self {
            class_name: class_name.map(str::to_owned),
            kind: kind.into(),
        }
    }

    /// Binary name of the class, if the header was readable.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &TransformErrorKind {
        &self.kind
    }
}

impl From<ClassFileError> for TransformError {
    fn from(err: ClassFileError) -> Self {
        Self::new(None, err)
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class_name {
            Some(name) => write!(f, "cannot transform class {name}: {}", self.kind),
            None => write!(f, "cannot transform class: {}", self.kind),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_error_names_the_class() {
        let err = TransformError::new(Some("eu/X"), ClassFileError::TrailingBytes(2));
        assert_eq!(
            err.to_string(),
            "cannot transform class eu/X: malformed class file: 2 trailing bytes after the class attributes"
        );
        assert_eq!(err.class_name(), Some("eu/X"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn transform_error_without_class() {
        let err = TransformError::from(ClassFileError::BadMagic(0));
        assert_eq!(err.class_name(), None);
        assert!(matches!(err.kind(), TransformErrorKind::ClassFile(_)));
        assert!(err.to_string().starts_with("cannot transform class: malformed"));
    }

    #[test]
    fn mismatched_target_message() {
        let err = MergeError::mismatched(
            &TransformTarget::field("a.B", "x"),
            &TransformTarget::method("a.B", "x()V"),
        );
        assert_eq!(
            err.to_string(),
            "cannot merge field rule for 'a.B x' with method rule for 'a.B x()V'"
        );
    }

    #[test]
    fn mismatched_class_message() {
        let err = MergeError::mismatched(
            &TransformTarget::class("a.B"),
            &TransformTarget::class("a.C"),
        );
        assert_eq!(
            err.to_string(),
            "cannot merge class rule for 'a.B' with class rule for 'a.C'"
        );
    }
}
