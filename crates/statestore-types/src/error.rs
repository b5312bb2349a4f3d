use thiserror::Error;

use crate::value::ValueKind;

/// Errors produced while copying or validating state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A value outside the permitted shape was found at `path`.
    #[error("invalid value at '{path}' ({kind}): {reason}")]
    InvalidValue {
        path: String,
        kind: ValueKind,
        reason: String,
    },
}

/// Result alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = StateError::InvalidValue {
            path: "coord.inner".into(),
            kind: ValueKind::Mapping,
            reason: "nesting too deep".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value at 'coord.inner' (mapping): nesting too deep"
        );
    }
}
