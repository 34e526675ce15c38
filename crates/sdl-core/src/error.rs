//! Structural errors.
//!
//! Only input that cannot be parsed at all ends up here. Recoverable
//! validation problems (bad numbers, unknown keys, missing fields) are
//! collected as strings in [`crate::directive::ParseResult`] instead.

use thiserror::Error;

/// A hard failure: the containing block is left unparsed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SdlError {
    /// The input does not start with the directive the caller asked for.
    #[error("expected `{expected}` at offset {offset}")]
    MissingDirective { expected: &'static str, offset: usize },

    /// A `--key=(` block was never closed.
    #[error("unbalanced `(` in `--{key}` block: {depth} level(s) still open at offset {offset}")]
    UnbalancedBlock {
        key: String,
        depth: usize,
        offset: usize,
    },

    /// A `)` with no matching open block.
    #[error("unexpected `)` at offset {offset}")]
    UnexpectedClose { offset: usize },

    /// A `!name` token that is not in the directive table.
    #[error("unknown directive `!{name}` at offset {offset}")]
    UnknownDirective { name: String, offset: usize },

    /// A known directive that may not appear inside `--items=(...)`.
    #[error("directive `!{name}` is not allowed inside a section (offset {offset})")]
    NotAllowedInSection { name: String, offset: usize },

    /// The static directive table is inconsistent.
    #[error("invalid schema for `{directive}.{attribute}`: {reason}")]
    Schema {
        directive: &'static str,
        attribute: &'static str,
        reason: String,
    },

    /// An adapter pattern failed to compile.
    #[error("invalid adapter pattern for `!{directive}`: {reason}")]
    Pattern {
        directive: &'static str,
        reason: String,
    },
}

impl SdlError {
    /// Byte offset of the offending token, when the error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            SdlError::MissingDirective { offset, .. }
            | SdlError::UnbalancedBlock { offset, .. }
            | SdlError::UnexpectedClose { offset }
            | SdlError::UnknownDirective { offset, .. }
            | SdlError::NotAllowedInSection { offset, .. } => Some(*offset),
            SdlError::Schema { .. } | SdlError::Pattern { .. } => None,
        }
    }
}

pub type SdlResult<T> = Result<T, SdlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_message_names_depth() {
        let err = SdlError::UnbalancedBlock {
            key: "items".into(),
            depth: 2,
            offset: 17,
        };
        assert_eq!(
            err.to_string(),
            "unbalanced `(` in `--items` block: 2 level(s) still open at offset 17"
        );
        assert_eq!(err.offset(), Some(17));
    }
}
