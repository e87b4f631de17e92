//! Loading a declared database from a YAML or JSON document.
//!
//! The document is a mapping of attribute names to values, laid out like the
//! resource schema:
//!
//! ```yaml
//! name: orders
//! service_config:
//!   disksize: 25
//!   flavor: m2c.small
//!   region: dus2
//! application_config:
//!   type: postgresql
//!   version: "16.2"
//!   instances: 1
//! ```
//!
//! Attributes left out of the document are Null.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde_json::Value as Json;

use crate::codec::{ObjectCodec, WirePayload, WireValue};
use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::error::{ConfigError, Result};
use crate::model::SchemaVersion;
use crate::snapshot::json_kind;
use crate::value::{AttrType, ConfigObject};

/// Reads and decodes a declaration file.
pub fn load_declaration(path: &Path, version: SchemaVersion) -> Result<ConfigObject> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loading {} declaration from {}", version, path.display());
    from_yaml_str(&content, version)
}

/// Decodes a declaration from YAML (or JSON) text.
///
/// Every type error and unexpected key is collected before failing with
/// [`ConfigError::Declaration`].
pub fn from_yaml_str(content: &str, version: SchemaVersion) -> Result<ConfigObject> {
    let document: Json = serde_yaml::from_str(content).map_err(ConfigError::ParseYaml)?;
    let schema = &version.schemas().database;

    let mut diagnostics = Diagnostics::new();
    if !document.is_object() {
        diagnostics.add_error(
            DiagnosticKind::Config,
            "Invalid declaration",
            format!("Expected a mapping at the top level, found {}.", json_kind(&document)),
        );
        return Err(ConfigError::Declaration(diagnostics).into());
    }

    let tree = to_wire(
        &AttrType::object(schema),
        Some(&document),
        &AttributePath::root(),
        &mut diagnostics,
    );
    if diagnostics.has_error() {
        return Err(ConfigError::Declaration(diagnostics).into());
    }

    Ok(ObjectCodec::new(schema).decode(&tree)?)
}

fn to_wire(
    ty: &AttrType,
    json: Option<&Json>,
    path: &AttributePath,
    diagnostics: &mut Diagnostics,
) -> WireValue {
    let wire_type = ty.wire_type();
    let json = match json {
        None | Some(Json::Null) => return WireValue::null(wire_type),
        Some(json) => json,
    };

    let payload = match (ty, json) {
        (AttrType::String, Json::String(s)) => Some(WirePayload::String(s.clone())),
        (AttrType::Int64, Json::Number(n)) => n.as_i64().map(WirePayload::Number),
        (AttrType::Bool, Json::Bool(b)) => Some(WirePayload::Bool(*b)),
        (AttrType::List(element), Json::Array(items)) => Some(WirePayload::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_wire(element, Some(item), &path.child(&i.to_string()), diagnostics))
                .collect(),
        )),
        (AttrType::Object(schema), Json::Object(map)) => {
            for key in map.keys().filter(|k| !schema.contains(k)) {
                diagnostics.add_attribute_error(
                    path.child(key),
                    DiagnosticKind::Config,
                    "Unexpected attribute",
                    format!("{} has no attribute named '{}'.", schema.name(), key),
                );
            }
            let fields: BTreeMap<String, WireValue> = schema
                .fields()
                .iter()
                .map(|field| {
                    let value = to_wire(
                        &field.ty,
                        map.get(field.name),
                        &path.child(field.name),
                        diagnostics,
                    );
                    (field.name.to_string(), value)
                })
                .collect();
            Some(WirePayload::Object(fields))
        }
        _ => None,
    };

    let Some(payload) = payload else {
        diagnostics.add_attribute_error(
            path.clone(),
            DiagnosticKind::Config,
            "Invalid attribute type",
            format!("Expected {}, found {}.", ty, json_kind(json)),
        );
        return WireValue::null(wire_type);
    };

    match WireValue::new(wire_type.clone(), payload) {
        Ok(tree) => tree,
        Err(e) => {
            diagnostics.add_attribute_error(
                path.clone(),
                DiagnosticKind::Codec,
                "Invalid attribute value",
                e.to_string(),
            );
            WireValue::null(wire_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::value::TypedValue;

    const DECLARATION: &str = r#"
name: orders
description: order store
service_config:
  disksize: 25
  flavor: m2c.small
  region: dus2
application_config:
  type: postgresql
  version: "16.2"
  instances: 1
  password: a-long-enough-secret
  private_networking:
    allowed_cidrs:
      - 10.0.0.0/8
"#;

    #[test]
    fn test_from_yaml_str() {
        let db = from_yaml_str(DECLARATION, SchemaVersion::V2).unwrap();
        assert_eq!(db.string("name").unwrap(), &TypedValue::Known("orders".to_string()));
        assert!(db.string("uuid").unwrap().is_null());

        let app = db.object("application_config").unwrap();
        assert_eq!(app.int64("instances").unwrap(), &TypedValue::Known(1));
        let private = app.object("private_networking").unwrap();
        assert_eq!(
            private.list("allowed_cidrs").unwrap().to_strings().unwrap(),
            vec!["10.0.0.0/8"]
        );
        assert!(private.bool("enabled").unwrap().is_null());
    }

    #[test]
    fn test_json_is_accepted() {
        let db = from_yaml_str(
            r#"{"name": "orders", "service_config": {"disksize": 5}}"#,
            SchemaVersion::V1,
        )
        .unwrap();
        assert_eq!(
            db.object("service_config").unwrap().int64("disksize").unwrap(),
            &TypedValue::Known(5)
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let content = r#"
name: 42
nickname: ord
service_config:
  disksize: large
  remote_ips: [1, "10.0.0.0/8"]
"#;
        let err = from_yaml_str(content, SchemaVersion::V2).unwrap_err();
        let ProviderError::Config(ConfigError::Declaration(diags)) = err else {
            panic!("unexpected error: {}", err);
        };
        // name type, unexpected nickname, disksize type, remote_ips unknown in v2
        assert_eq!(diags.len(), 4, "got: {}", diags);
        let rendered = diags.to_string();
        assert!(rendered.contains("nickname"));
        assert!(rendered.contains("service_config.disksize"));
        assert!(rendered.contains("service_config.remote_ips"));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = from_yaml_str("- a\n- b\n", SchemaVersion::V2).unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn test_load_declaration_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.yaml");
        std::fs::write(&path, DECLARATION).unwrap();

        let db = load_declaration(&path, SchemaVersion::V2).unwrap();
        assert!(db.is_known());
    }
}
