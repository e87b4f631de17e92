//! Dynamically typed attribute values.

use super::error::{CodecError, Result};
use super::object::ConfigObject;
use super::typed::{TypedValue, ValueState};
use super::types::AttrType;

/// A homogeneous list of values with a declared element type.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    element: AttrType,
    items: TypedValue<Vec<Value>>,
}

impl ListValue {
    /// Builds a known list, checking that every item has the element type.
    pub fn new(element: AttrType, items: Vec<Value>) -> Result<Self> {
        if let Some(bad) = items.iter().find(|v| v.attr_type() != element) {
            return Err(CodecError::mismatch(
                format!("list element {}", element),
                bad.attr_type(),
            ));
        }
        Ok(Self {
            element,
            items: TypedValue::Known(items),
        })
    }

    pub fn null(element: AttrType) -> Self {
        Self {
            element,
            items: TypedValue::Null,
        }
    }

    pub fn unknown(element: AttrType) -> Self {
        Self {
            element,
            items: TypedValue::Unknown,
        }
    }

    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            element: AttrType::String,
            items: TypedValue::Known(items.into_iter().map(Value::string).collect()),
        }
    }

    pub fn element_type(&self) -> &AttrType {
        &self.element
    }

    pub fn items(&self) -> &TypedValue<Vec<Value>> {
        &self.items
    }

    /// Collects a known list of known strings.
    ///
    /// Null and Unknown elements are rejected with a type mismatch.
    pub fn to_strings(&self) -> Result<Vec<String>> {
        self.items
            .value()?
            .iter()
            .map(|item| item.as_string()?.value().cloned())
            .collect()
    }
}

/// A value of any attribute type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(TypedValue<String>),
    Int64(TypedValue<i64>),
    Bool(TypedValue<bool>),
    List(ListValue),
    Object(ConfigObject),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(TypedValue::Known(value.into()))
    }

    pub fn int64(value: i64) -> Self {
        Value::Int64(TypedValue::Known(value))
    }

    pub fn bool(value: bool) -> Self {
        Value::Bool(TypedValue::Known(value))
    }

    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::String(_) => AttrType::String,
            Value::Int64(_) => AttrType::Int64,
            Value::Bool(_) => AttrType::Bool,
            Value::List(list) => AttrType::List(Box::new(list.element_type().clone())),
            Value::Object(object) => AttrType::object(object.schema()),
        }
    }

    pub fn state(&self) -> ValueState {
        match self {
            Value::String(v) => v.state(),
            Value::Int64(v) => v.state(),
            Value::Bool(v) => v.state(),
            Value::List(list) => list.items().state(),
            Value::Object(object) => object.state(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.state() == ValueState::Null
    }

    pub fn is_unknown(&self) -> bool {
        self.state() == ValueState::Unknown
    }

    pub fn is_known(&self) -> bool {
        self.state() == ValueState::Known
    }

    /// Returns true when this value and everything nested in it is Known or Null.
    pub fn is_fully_known(&self) -> bool {
        match self {
            Value::List(list) => match list.items() {
                TypedValue::Unknown => false,
                TypedValue::Null => true,
                TypedValue::Known(items) => items.iter().all(Value::is_fully_known),
            },
            Value::Object(object) => object.is_fully_known(),
            other => !other.is_unknown(),
        }
    }

    pub fn as_string(&self) -> Result<&TypedValue<String>> {
        match self {
            Value::String(v) => Ok(v),
            other => Err(CodecError::mismatch(AttrType::String, other.attr_type())),
        }
    }

    pub fn as_int64(&self) -> Result<&TypedValue<i64>> {
        match self {
            Value::Int64(v) => Ok(v),
            other => Err(CodecError::mismatch(AttrType::Int64, other.attr_type())),
        }
    }

    pub fn as_bool(&self) -> Result<&TypedValue<bool>> {
        match self {
            Value::Bool(v) => Ok(v),
            other => Err(CodecError::mismatch(AttrType::Bool, other.attr_type())),
        }
    }

    pub fn as_list(&self) -> Result<&ListValue> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(CodecError::mismatch("list", other.attr_type())),
        }
    }

    pub fn as_object(&self) -> Result<&ConfigObject> {
        match self {
            Value::Object(object) => Ok(object),
            other => Err(CodecError::mismatch("object", other.attr_type())),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::int64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::bool(value)
    }
}

impl From<TypedValue<String>> for Value {
    fn from(value: TypedValue<String>) -> Self {
        Value::String(value)
    }
}

impl From<TypedValue<i64>> for Value {
    fn from(value: TypedValue<i64>) -> Self {
        Value::Int64(value)
    }
}

impl From<TypedValue<bool>> for Value {
    fn from(value: TypedValue<bool>) -> Self {
        Value::Bool(value)
    }
}

impl From<ListValue> for Value {
    fn from(value: ListValue) -> Self {
        Value::List(value)
    }
}

impl From<ConfigObject> for Value {
    fn from(value: ConfigObject) -> Self {
        Value::Object(value)
    }
}
