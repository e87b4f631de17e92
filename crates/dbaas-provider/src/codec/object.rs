//! Conversion between wire trees and schema-bound objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::value::{
    check_attributes, AttrType, CodecError, ConfigObject, ListValue, ObjectSchema, Result,
    TypedValue, Value,
};

use super::wire::{WirePayload, WireType, WireValue};

/// Codec for one object schema.
#[derive(Debug, Clone)]
pub struct ObjectCodec {
    schema: Arc<ObjectSchema>,
}

impl ObjectCodec {
    pub fn new(schema: &Arc<ObjectSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
        }
    }

    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    pub fn wire_type(&self) -> WireType {
        self.schema.wire_type()
    }

    /// Decodes a wire tree into an object of this codec's schema.
    ///
    /// An untyped tree decodes to Null. A typed tree must carry exactly this
    /// schema's wire type. Unknown and Null payloads map to the matching
    /// state; a Known payload is decoded attribute by attribute.
    pub fn decode(&self, tree: &WireValue) -> Result<ConfigObject> {
        let Some(ty) = tree.ty() else {
            return Ok(ConfigObject::null(&self.schema));
        };
        let expected = self.wire_type();
        if *ty != expected {
            return Err(CodecError::SchemaMismatch {
                expected: expected.to_string(),
                found: ty.to_string(),
            });
        }

        match tree.payload() {
            WirePayload::Unknown => Ok(ConfigObject::unknown(&self.schema)),
            WirePayload::Null => Ok(ConfigObject::null(&self.schema)),
            WirePayload::Object(fields) => {
                let mut attributes = BTreeMap::new();
                for (name, subtree) in fields {
                    let field =
                        self.schema
                            .field(name)
                            .ok_or_else(|| CodecError::UnknownAttribute {
                                object: self.schema.name().to_string(),
                                name: name.clone(),
                            })?;
                    attributes.insert(name.clone(), decode_value(&field.ty, subtree)?);
                }
                ConfigObject::new(&self.schema, attributes)
            }
            other => Err(CodecError::MalformedTree(format!(
                "{} expects an object payload, got {:?}",
                self.schema.name(),
                other
            ))),
        }
    }

    /// Encodes an object into a wire tree of this codec's schema.
    ///
    /// Encoding is all-or-nothing: if any attribute fails, no tree is
    /// returned.
    pub fn encode(&self, object: &ConfigObject) -> Result<WireValue> {
        if object.schema() != &self.schema {
            return Err(CodecError::SchemaMismatch {
                expected: self.schema.name().to_string(),
                found: object.schema().name().to_string(),
            });
        }

        let ty = self.wire_type();
        match object.attributes() {
            TypedValue::Null => Ok(WireValue::null(ty)),
            TypedValue::Unknown => Ok(WireValue::unknown(ty)),
            TypedValue::Known(attributes) => {
                let mut fields = BTreeMap::new();
                for field in self.schema.fields() {
                    let value = attributes.get(field.name).ok_or_else(|| {
                        CodecError::MalformedTree(format!(
                            "{} is missing attribute '{}'",
                            self.schema.name(),
                            field.name
                        ))
                    })?;
                    fields.insert(field.name.to_string(), encode_value(value)?);
                }
                WireValue::new(ty, WirePayload::Object(fields))
            }
        }
    }

    /// Builds an object from a loosely typed attribute map.
    ///
    /// Every schema violation becomes a diagnostic; when any is reported the
    /// returned object is Unknown.
    pub fn from_loose_map(&self, attributes: BTreeMap<String, Value>) -> (ConfigObject, Diagnostics) {
        from_loose_map_at(&self.schema, attributes, &AttributePath::root())
    }
}

/// [`ObjectCodec::from_loose_map`] with diagnostics rooted at `path`.
pub fn from_loose_map_at(
    schema: &Arc<ObjectSchema>,
    attributes: BTreeMap<String, Value>,
    path: &AttributePath,
) -> (ConfigObject, Diagnostics) {
    let diagnostics = check_attributes(schema, &attributes, path);
    if diagnostics.has_error() {
        return (ConfigObject::unknown(schema), diagnostics);
    }
    (ConfigObject::from_checked(schema, attributes), diagnostics)
}

/// Decodes a wire tree as a value of `ty`.
pub fn decode_value(ty: &AttrType, tree: &WireValue) -> Result<Value> {
    if let AttrType::Object(schema) = ty {
        return ObjectCodec::new(schema).decode(tree).map(Value::Object);
    }

    let Some(found) = tree.ty() else {
        return Ok(ty.null_value());
    };
    let expected = ty.wire_type();
    if *found != expected {
        return Err(CodecError::SchemaMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }

    match (ty, tree.payload()) {
        (_, WirePayload::Unknown) => Ok(ty.unknown_value()),
        (_, WirePayload::Null) => Ok(ty.null_value()),
        (AttrType::String, WirePayload::String(s)) => Ok(Value::string(s.clone())),
        (AttrType::Int64, WirePayload::Number(n)) => Ok(Value::int64(*n)),
        (AttrType::Bool, WirePayload::Bool(b)) => Ok(Value::bool(*b)),
        (AttrType::List(element), WirePayload::List(items)) => {
            let items = items
                .iter()
                .map(|item| decode_value(element, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(ListValue::new((**element).clone(), items)?))
        }
        (ty, payload) => Err(CodecError::MalformedTree(format!(
            "cannot decode {:?} as {}",
            payload, ty
        ))),
    }
}

/// Encodes a value into a wire tree.
pub fn encode_value(value: &Value) -> Result<WireValue> {
    match value {
        Value::String(v) => scalar(WireType::String, v, |s| WirePayload::String(s.clone())),
        Value::Int64(v) => scalar(WireType::Number, v, |n| WirePayload::Number(*n)),
        Value::Bool(v) => scalar(WireType::Bool, v, |b| WirePayload::Bool(*b)),
        Value::List(list) => {
            let ty = WireType::List(Box::new(list.element_type().wire_type()));
            match list.items() {
                TypedValue::Null => Ok(WireValue::null(ty)),
                TypedValue::Unknown => Ok(WireValue::unknown(ty)),
                TypedValue::Known(items) => {
                    let items = items.iter().map(encode_value).collect::<Result<Vec<_>>>()?;
                    WireValue::new(ty, WirePayload::List(items))
                }
            }
        }
        Value::Object(object) => ObjectCodec::new(object.schema()).encode(object),
    }
}

fn scalar<T>(
    ty: WireType,
    value: &TypedValue<T>,
    payload: impl FnOnce(&T) -> WirePayload,
) -> Result<WireValue> {
    match value {
        TypedValue::Null => Ok(WireValue::null(ty)),
        TypedValue::Unknown => Ok(WireValue::unknown(ty)),
        TypedValue::Known(v) => WireValue::new(ty, payload(v)),
    }
}
