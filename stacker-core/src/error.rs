//! Errors in the library.
use thiserror::Error;

/// Errors raised when reading values back from a [`Record`](crate::record::Record).
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    /// The record has no value for the key.
    #[error("no value recorded for key `{0}`")]
    MissingKey(String),

    /// The value of the key is not of the requested type.
    #[error("value of `{key}` is not {expected}")]
    TypeMismatch {
        /// Key looked up.
        key: String,
        /// Name of the requested value type.
        expected: &'static str,
    },
}
