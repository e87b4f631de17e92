//! Schema-bound attribute objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};

use super::dynamic::{ListValue, Value};
use super::error::{CodecError, Result};
use super::typed::{TypedValue, ValueState};
use super::types::ObjectSchema;

/// An object value bound to its schema.
///
/// When Known, the attribute map carries exactly one entry per declared
/// field and each entry has the declared type. Construction enforces this;
/// there is no way to obtain a Known object that violates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigObject {
    schema: Arc<ObjectSchema>,
    attributes: TypedValue<BTreeMap<String, Value>>,
}

impl ConfigObject {
    pub fn null(schema: &Arc<ObjectSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            attributes: TypedValue::Null,
        }
    }

    pub fn unknown(schema: &Arc<ObjectSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            attributes: TypedValue::Unknown,
        }
    }

    /// Strict constructor: fails on a missing, extra or mistyped attribute.
    pub fn new(schema: &Arc<ObjectSchema>, attributes: BTreeMap<String, Value>) -> Result<Self> {
        let diagnostics = check_attributes(schema, &attributes, &AttributePath::root());
        if diagnostics.has_error() {
            return Err(CodecError::InvalidObject {
                object: schema.name().to_string(),
                diagnostics,
            });
        }
        Ok(Self::from_checked(schema, attributes))
    }

    pub(crate) fn from_checked(
        schema: &Arc<ObjectSchema>,
        attributes: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            schema: Arc::clone(schema),
            attributes: TypedValue::Known(attributes),
        }
    }

    /// Starts a builder with every declared attribute set to Null.
    pub fn builder(schema: &Arc<ObjectSchema>) -> ObjectBuilder {
        ObjectBuilder::new(schema)
    }

    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    pub fn state(&self) -> ValueState {
        self.attributes.state()
    }

    pub fn is_null(&self) -> bool {
        self.attributes.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.attributes.is_unknown()
    }

    pub fn is_known(&self) -> bool {
        self.attributes.is_known()
    }

    pub fn attributes(&self) -> &TypedValue<BTreeMap<String, Value>> {
        &self.attributes
    }

    pub fn is_fully_known(&self) -> bool {
        match &self.attributes {
            TypedValue::Unknown => false,
            TypedValue::Null => true,
            TypedValue::Known(attrs) => attrs.values().all(Value::is_fully_known),
        }
    }

    /// Returns the named attribute of a Known object.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.attributes
            .value()?
            .get(name)
            .ok_or_else(|| CodecError::UnknownAttribute {
                object: self.schema.name().to_string(),
                name: name.to_string(),
            })
    }

    pub fn string(&self, name: &str) -> Result<&TypedValue<String>> {
        self.get(name)?.as_string()
    }

    pub fn int64(&self, name: &str) -> Result<&TypedValue<i64>> {
        self.get(name)?.as_int64()
    }

    pub fn bool(&self, name: &str) -> Result<&TypedValue<bool>> {
        self.get(name)?.as_bool()
    }

    pub fn list(&self, name: &str) -> Result<&ListValue> {
        self.get(name)?.as_list()
    }

    pub fn object(&self, name: &str) -> Result<&ConfigObject> {
        self.get(name)?.as_object()
    }

    /// Replaces one attribute of a Known object, keeping the schema invariant.
    pub fn with_attribute(self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| CodecError::UnknownAttribute {
                object: self.schema.name().to_string(),
                name: name.to_string(),
            })?;
        if value.attr_type() != field.ty {
            return Err(CodecError::mismatch(&field.ty, value.attr_type()));
        }

        let schema = self.schema;
        let mut attributes = self.attributes.into_value()?;
        attributes.insert(name.to_string(), value);
        Ok(Self {
            schema,
            attributes: TypedValue::Known(attributes),
        })
    }

    /// Returns the attribute map of a Known object, consuming it.
    pub fn into_attributes(self) -> Result<BTreeMap<String, Value>> {
        self.attributes.into_value()
    }
}

/// Incremental construction of a Known [`ConfigObject`].
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    schema: Arc<ObjectSchema>,
    attributes: BTreeMap<String, Value>,
}

impl ObjectBuilder {
    fn new(schema: &Arc<ObjectSchema>) -> Self {
        let attributes = schema
            .fields()
            .iter()
            .map(|f| (f.name.to_string(), f.ty.null_value()))
            .collect();
        Self {
            schema: Arc::clone(schema),
            attributes,
        }
    }

    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Like [`set`](Self::set), but skips names the schema does not declare.
    pub fn set_if_declared(self, name: &str, value: impl Into<Value>) -> Self {
        if self.schema.contains(name) {
            self.set(name, value)
        } else {
            self
        }
    }

    /// Sets every declared attribute that is still Null to Unknown.
    pub fn unknown_rest(mut self) -> Self {
        for field in self.schema.fields() {
            if let Some(value) = self.attributes.get_mut(field.name) {
                if value.is_null() {
                    *value = field.ty.unknown_value();
                }
            }
        }
        self
    }

    pub fn build(self) -> Result<ConfigObject> {
        ConfigObject::new(&self.schema, self.attributes)
    }
}

/// Checks an attribute map against a schema, collecting every violation.
///
/// A missing attribute is reported without a type check. Undeclared
/// attributes are reported after the declared ones.
pub fn check_attributes(
    schema: &ObjectSchema,
    attributes: &BTreeMap<String, Value>,
    path: &AttributePath,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for field in schema.fields() {
        let field_path = path.child(field.name);
        match attributes.get(field.name) {
            None => diagnostics.add_attribute_error(
                field_path,
                DiagnosticKind::Codec,
                "Missing attribute value",
                format!(
                    "Attribute '{}' of {} has no value; expected {}.",
                    field.name,
                    schema.name(),
                    field.ty
                ),
            ),
            Some(value) if value.attr_type() != field.ty => diagnostics.add_attribute_error(
                field_path,
                DiagnosticKind::Codec,
                "Invalid attribute type",
                format!(
                    "Attribute '{}' of {} expected {}, found {}.",
                    field.name,
                    schema.name(),
                    field.ty,
                    value.attr_type()
                ),
            ),
            Some(_) => {}
        }
    }

    for name in attributes.keys() {
        if !schema.contains(name) {
            diagnostics.add_attribute_error(
                path.child(name),
                DiagnosticKind::Codec,
                "Extra attribute value",
                format!("Attribute '{}' is not declared by {}.", name, schema.name()),
            );
        }
    }

    diagnostics
}
