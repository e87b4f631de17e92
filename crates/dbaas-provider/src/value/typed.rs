//! The tri-state value container.

use std::fmt;

use super::error::CodecError;

/// State of a [`TypedValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueState {
    Null,
    Unknown,
    Known,
}

impl fmt::Display for ValueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueState::Null => write!(f, "null"),
            ValueState::Unknown => write!(f, "unknown"),
            ValueState::Known => write!(f, "known"),
        }
    }
}

/// A single attribute value that is either absent, not yet resolved, or known.
///
/// Only `Known` carries a payload. Two values are equal when their states are
/// equal and, for two `Known` values, their payloads are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue<T> {
    Null,
    Unknown,
    Known(T),
}

impl<T> TypedValue<T> {
    pub fn null() -> Self {
        TypedValue::Null
    }

    pub fn unknown() -> Self {
        TypedValue::Unknown
    }

    pub fn known(value: T) -> Self {
        TypedValue::Known(value)
    }

    pub fn state(&self) -> ValueState {
        match self {
            TypedValue::Null => ValueState::Null,
            TypedValue::Unknown => ValueState::Unknown,
            TypedValue::Known(_) => ValueState::Known,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypedValue::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, TypedValue::Known(_))
    }

    /// Returns the payload, failing with [`CodecError::TypeMismatch`] when the
    /// value is Null or Unknown.
    pub fn value(&self) -> Result<&T, CodecError> {
        match self {
            TypedValue::Known(value) => Ok(value),
            other => Err(CodecError::TypeMismatch {
                expected: "known value".to_string(),
                found: format!("{} value", other.state()),
            }),
        }
    }

    /// Consumes the value, returning the payload or a [`CodecError::TypeMismatch`].
    pub fn into_value(self) -> Result<T, CodecError> {
        match self {
            TypedValue::Known(value) => Ok(value),
            other => Err(CodecError::TypeMismatch {
                expected: "known value".to_string(),
                found: format!("{} value", other.state()),
            }),
        }
    }

    /// Returns the payload when known; Null and Unknown both map to `None`.
    pub fn as_known(&self) -> Option<&T> {
        match self {
            TypedValue::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> TypedValue<&T> {
        match self {
            TypedValue::Null => TypedValue::Null,
            TypedValue::Unknown => TypedValue::Unknown,
            TypedValue::Known(value) => TypedValue::Known(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> TypedValue<U> {
        match self {
            TypedValue::Null => TypedValue::Null,
            TypedValue::Unknown => TypedValue::Unknown,
            TypedValue::Known(value) => TypedValue::Known(f(value)),
        }
    }

    /// Returns `other` when this value is Unknown, keeping Null and Known as is.
    pub fn or_if_unknown(self, other: TypedValue<T>) -> TypedValue<T> {
        match self {
            TypedValue::Unknown => other,
            value => value,
        }
    }
}

impl<T> Default for TypedValue<T> {
    fn default() -> Self {
        TypedValue::Null
    }
}

impl<T> From<Option<T>> for TypedValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => TypedValue::Known(value),
            None => TypedValue::Null,
        }
    }
}
