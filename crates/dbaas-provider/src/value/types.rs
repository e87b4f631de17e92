//! Attribute types and object schemas.

use std::fmt;
use std::sync::Arc;

use crate::codec::WireType;

use super::dynamic::{ListValue, Value};
use super::object::ConfigObject;
use super::typed::TypedValue;

/// The semantic type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    String,
    Int64,
    Bool,
    List(Box<AttrType>),
    Object(Arc<ObjectSchema>),
}

impl AttrType {
    /// Shorthand for `List(String)`, the only list shape the DBaaS schema uses.
    pub fn string_list() -> Self {
        AttrType::List(Box::new(AttrType::String))
    }

    pub fn object(schema: &Arc<ObjectSchema>) -> Self {
        AttrType::Object(Arc::clone(schema))
    }

    /// Returns the wire-level type this attribute type is transported as.
    pub fn wire_type(&self) -> WireType {
        match self {
            AttrType::String => WireType::String,
            AttrType::Int64 => WireType::Number,
            AttrType::Bool => WireType::Bool,
            AttrType::List(element) => WireType::List(Box::new(element.wire_type())),
            AttrType::Object(schema) => schema.wire_type(),
        }
    }

    /// Returns a Null value of this type.
    pub fn null_value(&self) -> Value {
        match self {
            AttrType::String => Value::String(TypedValue::Null),
            AttrType::Int64 => Value::Int64(TypedValue::Null),
            AttrType::Bool => Value::Bool(TypedValue::Null),
            AttrType::List(element) => Value::List(ListValue::null((**element).clone())),
            AttrType::Object(schema) => Value::Object(ConfigObject::null(schema)),
        }
    }

    /// Returns an Unknown value of this type.
    pub fn unknown_value(&self) -> Value {
        match self {
            AttrType::String => Value::String(TypedValue::Unknown),
            AttrType::Int64 => Value::Int64(TypedValue::Unknown),
            AttrType::Bool => Value::Bool(TypedValue::Unknown),
            AttrType::List(element) => Value::List(ListValue::unknown((**element).clone())),
            AttrType::Object(schema) => Value::Object(ConfigObject::unknown(schema)),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::String => write!(f, "string"),
            AttrType::Int64 => write!(f, "int64"),
            AttrType::Bool => write!(f, "bool"),
            AttrType::List(element) => write!(f, "list({})", element),
            AttrType::Object(schema) => write!(f, "object({})", schema.name()),
        }
    }
}

/// How an attribute is supplied: by the user, by the remote system, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl AttributeMode {
    pub fn is_required(&self) -> bool {
        matches!(self, AttributeMode::Required)
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, AttributeMode::Computed | AttributeMode::OptionalComputed)
    }
}

/// A static default applied to a Null optional attribute during planning.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticDefault {
    String(&'static str),
    Int64(i64),
    Bool(bool),
}

impl StaticDefault {
    pub fn to_value(&self) -> Value {
        match self {
            StaticDefault::String(s) => Value::string(*s),
            StaticDefault::Int64(n) => Value::int64(*n),
            StaticDefault::Bool(b) => Value::bool(*b),
        }
    }
}

/// Declaration of one attribute inside an [`ObjectSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub ty: AttrType,
    pub mode: AttributeMode,
    pub sensitive: bool,
    pub default: Option<StaticDefault>,
}

impl FieldSchema {
    fn with_mode(name: &'static str, ty: AttrType, mode: AttributeMode) -> Self {
        Self {
            name,
            ty,
            mode,
            sensitive: false,
            default: None,
        }
    }

    pub fn required(name: &'static str, ty: AttrType) -> Self {
        Self::with_mode(name, ty, AttributeMode::Required)
    }

    pub fn optional(name: &'static str, ty: AttrType) -> Self {
        Self::with_mode(name, ty, AttributeMode::Optional)
    }

    pub fn computed(name: &'static str, ty: AttrType) -> Self {
        Self::with_mode(name, ty, AttributeMode::Computed)
    }

    pub fn optional_computed(name: &'static str, ty: AttrType) -> Self {
        Self::with_mode(name, ty, AttributeMode::OptionalComputed)
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, default: StaticDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// A named, ordered set of attribute declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    name: &'static str,
    fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSchema>) -> Self {
        Self { name, fields }
    }

    /// Wraps the schema for sharing between nested attribute types.
    pub fn shared(name: &'static str, fields: Vec<FieldSchema>) -> Arc<Self> {
        Arc::new(Self::new(name, fields))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the declared type of a nested object attribute, if any.
    pub fn nested(&self, name: &str) -> Option<&Arc<ObjectSchema>> {
        match self.field(name).map(|f| &f.ty) {
            Some(AttrType::Object(schema)) => Some(schema),
            _ => None,
        }
    }

    pub fn wire_type(&self) -> WireType {
        WireType::Object(
            self.fields
                .iter()
                .map(|f| (f.name.to_string(), f.ty.wire_type()))
                .collect(),
        )
    }
}
