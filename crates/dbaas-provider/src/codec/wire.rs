//! The host-side wire tree.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::{CodecError, Result};

/// Type of a wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    String,
    Number,
    Bool,
    List(Box<WireType>),
    Object(BTreeMap<String, WireType>),
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::String => write!(f, "String"),
            WireType::Number => write!(f, "Number"),
            WireType::Bool => write!(f, "Bool"),
            WireType::List(element) => write!(f, "List[{}]", element),
            WireType::Object(fields) => {
                write!(f, "Object[")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\":{}", name, ty)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Payload of a wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum WirePayload {
    Unknown,
    Null,
    String(String),
    Number(i64),
    Bool(bool),
    List(Vec<WireValue>),
    Object(BTreeMap<String, WireValue>),
}

impl WirePayload {
    fn describe(&self) -> &'static str {
        match self {
            WirePayload::Unknown => "unknown",
            WirePayload::Null => "null",
            WirePayload::String(_) => "string",
            WirePayload::Number(_) => "number",
            WirePayload::Bool(_) => "bool",
            WirePayload::List(_) => "list",
            WirePayload::Object(_) => "object",
        }
    }
}

/// A typed value tree as exchanged with the host.
///
/// A tree without a type is the host's representation of "nothing at all"
/// and decodes to Null.
#[derive(Debug, Clone, PartialEq)]
pub struct WireValue {
    ty: Option<WireType>,
    payload: WirePayload,
}

impl WireValue {
    /// Builds a typed tree, checking the payload shape against the type.
    pub fn new(ty: WireType, payload: WirePayload) -> Result<Self> {
        validate(&ty, &payload)?;
        Ok(Self {
            ty: Some(ty),
            payload,
        })
    }

    pub fn null(ty: WireType) -> Self {
        Self {
            ty: Some(ty),
            payload: WirePayload::Null,
        }
    }

    pub fn unknown(ty: WireType) -> Self {
        Self {
            ty: Some(ty),
            payload: WirePayload::Unknown,
        }
    }

    pub fn untyped() -> Self {
        Self {
            ty: None,
            payload: WirePayload::Null,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            ty: Some(WireType::String),
            payload: WirePayload::String(value.into()),
        }
    }

    pub fn number(value: i64) -> Self {
        Self {
            ty: Some(WireType::Number),
            payload: WirePayload::Number(value),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            ty: Some(WireType::Bool),
            payload: WirePayload::Bool(value),
        }
    }

    pub fn ty(&self) -> Option<&WireType> {
        self.ty.as_ref()
    }

    pub fn payload(&self) -> &WirePayload {
        &self.payload
    }

    pub fn is_null(&self) -> bool {
        matches!(self.payload, WirePayload::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.payload, WirePayload::Unknown)
    }

    /// Returns true when no part of the tree is unknown.
    pub fn is_fully_known(&self) -> bool {
        match &self.payload {
            WirePayload::Unknown => false,
            WirePayload::List(items) => items.iter().all(WireValue::is_fully_known),
            WirePayload::Object(fields) => fields.values().all(WireValue::is_fully_known),
            _ => true,
        }
    }
}

fn validate(ty: &WireType, payload: &WirePayload) -> Result<()> {
    match (ty, payload) {
        (_, WirePayload::Unknown | WirePayload::Null) => Ok(()),
        (WireType::String, WirePayload::String(_))
        | (WireType::Number, WirePayload::Number(_))
        | (WireType::Bool, WirePayload::Bool(_)) => Ok(()),
        (WireType::List(element), WirePayload::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                if item.ty() != Some(element.as_ref()) {
                    return Err(CodecError::MalformedTree(format!(
                        "list element {} is not of type {}",
                        i, element
                    )));
                }
            }
            Ok(())
        }
        (WireType::Object(fields), WirePayload::Object(values)) => {
            if let Some(name) = values.keys().find(|k| !fields.contains_key(*k)) {
                return Err(CodecError::MalformedTree(format!(
                    "attribute '{}' is not part of {}",
                    name, ty
                )));
            }
            for (name, field_ty) in fields {
                match values.get(name) {
                    None => {
                        return Err(CodecError::MalformedTree(format!(
                            "attribute '{}' is missing",
                            name
                        )))
                    }
                    Some(value) if value.ty() != Some(field_ty) => {
                        return Err(CodecError::MalformedTree(format!(
                            "attribute '{}' is not of type {}",
                            name, field_ty
                        )))
                    }
                    Some(_) => {}
                }
            }
            Ok(())
        }
        (ty, payload) => Err(CodecError::MalformedTree(format!(
            "{} payload cannot carry type {}",
            payload.describe(),
            ty
        ))),
    }
}
