use thiserror::Error;

use crate::parse::ParseError;
use crate::TransformError;

/// Unified error type covering rule loading, class transformation and I/O.
///
/// Returned by convenience methods like
/// [`RuleSet::from_text()`](crate::RuleSet::from_text) and
/// [`RuleSet::from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum AccessTransformerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
