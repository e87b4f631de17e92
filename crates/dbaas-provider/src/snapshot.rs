//! JSON persistence of database state.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::diagnostics::AttributePath;
use crate::error::{ConfigError, Result};
use crate::model::SchemaVersion;
use crate::value::{AttrType, CodecError, ConfigObject, ListValue, ObjectSchema, TypedValue, Value};

/// On-disk form of a persisted state.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: SchemaVersion,
    state: Json,
}

/// Converts a state object into JSON.
///
/// Null becomes `null`. Unknown values cannot be persisted and fail with
/// [`CodecError::UnknownInSnapshot`].
pub fn to_json(object: &ConfigObject) -> std::result::Result<Json, CodecError> {
    object_to_json(object, &AttributePath::root())
}

/// Reads a state object of `schema` back from JSON. Absent keys are Null.
pub fn from_json(schema: &Arc<ObjectSchema>, json: &Json) -> std::result::Result<ConfigObject, CodecError> {
    object_from_json(schema, json, &AttributePath::root())
}

/// Writes a state object to `path` as pretty-printed JSON.
pub fn save(path: &Path, version: SchemaVersion, object: &ConfigObject) -> Result<()> {
    let file = SnapshotFile {
        version,
        state: to_json(object)?,
    };
    let content = serde_json::to_string_pretty(&file).map_err(ConfigError::ParseJson)?;
    fs::write(path, content).map_err(|source| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Reads a state object written by [`save`].
pub fn load(path: &Path) -> Result<(SchemaVersion, ConfigObject)> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SnapshotFile = serde_json::from_str(&content).map_err(ConfigError::ParseJson)?;
    let object = from_json(&file.version.schemas().database, &file.state)?;
    Ok((file.version, object))
}

fn object_to_json(object: &ConfigObject, path: &AttributePath) -> std::result::Result<Json, CodecError> {
    match object.attributes() {
        TypedValue::Null => Ok(Json::Null),
        TypedValue::Unknown => Err(CodecError::UnknownInSnapshot {
            path: path.to_string(),
        }),
        TypedValue::Known(attributes) => {
            let mut map = Map::new();
            for (name, value) in attributes {
                map.insert(name.clone(), value_to_json(value, &path.child(name))?);
            }
            Ok(Json::Object(map))
        }
    }
}

fn value_to_json(value: &Value, path: &AttributePath) -> std::result::Result<Json, CodecError> {
    fn scalar<T>(
        value: &TypedValue<T>,
        path: &AttributePath,
        f: impl FnOnce(&T) -> Json,
    ) -> std::result::Result<Json, CodecError> {
        match value {
            TypedValue::Null => Ok(Json::Null),
            TypedValue::Unknown => Err(CodecError::UnknownInSnapshot {
                path: path.to_string(),
            }),
            TypedValue::Known(v) => Ok(f(v)),
        }
    }

    match value {
        Value::String(v) => scalar(v, path, |s| Json::String(s.clone())),
        Value::Int64(v) => scalar(v, path, |n| Json::from(*n)),
        Value::Bool(v) => scalar(v, path, |b| Json::Bool(*b)),
        Value::List(list) => match list.items() {
            TypedValue::Null => Ok(Json::Null),
            TypedValue::Unknown => Err(CodecError::UnknownInSnapshot {
                path: path.to_string(),
            }),
            TypedValue::Known(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| value_to_json(item, &path.child(&i.to_string())))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Json::Array),
        },
        Value::Object(object) => object_to_json(object, path),
    }
}

fn object_from_json(
    schema: &Arc<ObjectSchema>,
    json: &Json,
    path: &AttributePath,
) -> std::result::Result<ConfigObject, CodecError> {
    let map = match json {
        Json::Null => return Ok(ConfigObject::null(schema)),
        Json::Object(map) => map,
        other => return Err(mismatch(path, &format!("object({})", schema.name()), other)),
    };

    if let Some(name) = map.keys().find(|k| !schema.contains(k)) {
        return Err(CodecError::UnknownAttribute {
            object: schema.name().to_string(),
            name: name.clone(),
        });
    }

    let mut attributes = BTreeMap::new();
    for field in schema.fields() {
        let field_path = path.child(field.name);
        let value = match map.get(field.name) {
            Some(json) => value_from_json(&field.ty, json, &field_path)?,
            None => field.ty.null_value(),
        };
        attributes.insert(field.name.to_string(), value);
    }
    ConfigObject::new(schema, attributes)
}

fn value_from_json(
    ty: &AttrType,
    json: &Json,
    path: &AttributePath,
) -> std::result::Result<Value, CodecError> {
    if json.is_null() {
        return Ok(ty.null_value());
    }
    match ty {
        AttrType::String => json
            .as_str()
            .map(Value::string)
            .ok_or_else(|| mismatch(path, "string", json)),
        AttrType::Int64 => json
            .as_i64()
            .map(Value::int64)
            .ok_or_else(|| mismatch(path, "int64", json)),
        AttrType::Bool => json
            .as_bool()
            .map(Value::bool)
            .ok_or_else(|| mismatch(path, "bool", json)),
        AttrType::List(element) => {
            let items = json.as_array().ok_or_else(|| mismatch(path, "list", json))?;
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| value_from_json(element, item, &path.child(&i.to_string())))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Value::List(ListValue::new((**element).clone(), items)?))
        }
        AttrType::Object(schema) => object_from_json(schema, json, path).map(Value::Object),
    }
}

fn mismatch(path: &AttributePath, expected: &str, found: &Json) -> CodecError {
    CodecError::TypeMismatch {
        expected: format!("{} at {}", expected, path),
        found: json_kind(found).to_string(),
    }
}

pub(crate) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> ConfigObject {
        let set = SchemaVersion::V1.schemas();
        let service = ConfigObject::builder(&set.service_config)
            .set("disksize", 25_i64)
            .set("flavor", "m2c.small")
            .set("region", "dus2")
            .set("type", "database")
            .set("remote_ips", ListValue::strings(["192.0.2.0/24"]))
            .build()
            .unwrap();
        ConfigObject::builder(&set.database)
            .set("name", "orders")
            .set("uuid", "5d0bd1a0")
            .set("application_config", ConfigObject::null(&set.application_config))
            .set("service_config", service)
            .build()
            .unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        let set = SchemaVersion::V1.schemas();
        let json = to_json(&state()).unwrap();
        assert_eq!(json["service_config"]["remote_ips"], json!(["192.0.2.0/24"]));
        assert_eq!(json["application_config"], Json::Null);
        assert_eq!(from_json(&set.database, &json).unwrap(), state());
    }

    #[test]
    fn test_unknown_cannot_be_persisted() {
        let obj = state().with_attribute("status", TypedValue::<String>::Unknown).unwrap();
        let err = to_json(&obj).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownInSnapshot {
                path: "status".to_string()
            }
        );
    }

    #[test]
    fn test_from_json_rejects_wrong_types_and_extra_keys() {
        let set = SchemaVersion::V1.schemas();
        assert!(matches!(
            from_json(&set.database, &json!({"name": 3})),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            from_json(&set.database, &json!({"nickname": "x"})),
            Err(CodecError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        save(&path, SchemaVersion::V1, &state()).unwrap();
        let (version, loaded) = load(&path).unwrap();
        assert_eq!(version, SchemaVersion::V1);
        assert_eq!(loaded, state());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
