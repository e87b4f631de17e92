//! Planning: turning a declared object into the proposed new state.

use std::collections::BTreeMap;

use crate::value::{ConfigObject, FieldSchema, Result, Value};

/// Proposes the state a declared object will have after it is applied.
///
/// For every Known object, recursively:
/// - a Null attribute with a static default takes the default;
/// - a Null computed attribute becomes Unknown, since the remote side will
///   fill it in;
/// - a computed attribute that is Unknown reuses the prior state's value,
///   when a prior state is given and that value is not itself Unknown.
pub fn propose(declared: &ConfigObject, prior: Option<&ConfigObject>) -> Result<ConfigObject> {
    let Some(attributes) = declared.attributes().as_known() else {
        return Ok(declared.clone());
    };
    let prior_attributes = prior.and_then(|p| p.attributes().as_known());

    let mut proposed = BTreeMap::new();
    for field in declared.schema().fields() {
        let value = attributes
            .get(field.name)
            .cloned()
            .unwrap_or_else(|| field.ty.null_value());
        let prior_value = prior_attributes.and_then(|p| p.get(field.name));
        proposed.insert(
            field.name.to_string(),
            propose_value(field, value, prior_value)?,
        );
    }

    ConfigObject::new(declared.schema(), proposed)
}

fn propose_value(field: &FieldSchema, value: Value, prior: Option<&Value>) -> Result<Value> {
    let value = match value {
        Value::Object(nested) if nested.is_known() => {
            let prior_nested = match prior {
                Some(Value::Object(p)) => Some(p),
                _ => None,
            };
            Value::Object(propose(&nested, prior_nested)?)
        }
        v if v.is_null() => match (&field.default, field.mode.is_computed()) {
            (Some(default), _) => default.to_value(),
            (None, true) => field.ty.unknown_value(),
            (None, false) => v,
        },
        v => v,
    };

    if value.is_unknown() && field.mode.is_computed() {
        if let Some(prior) = prior.filter(|p| !p.is_unknown()) {
            return Ok(prior.clone());
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaVersion;
    use crate::value::TypedValue;

    fn declared() -> ConfigObject {
        let set = SchemaVersion::V2.schemas();
        let backups = ConfigObject::builder(&set.scheduled_backups).build().unwrap();
        let app = ConfigObject::builder(&set.application_config)
            .set("instances", 1_i64)
            .set("password", "a-long-enough-secret")
            .set("type", "postgresql")
            .set("version", "16.2")
            .set("scheduled_backups", backups)
            .build()
            .unwrap();
        let service = ConfigObject::builder(&set.service_config)
            .set("disksize", 25_i64)
            .set("flavor", "m2c.small")
            .set("region", "dus2")
            .build()
            .unwrap();
        ConfigObject::builder(&set.database)
            .set("name", "orders")
            .set("application_config", app)
            .set("service_config", service)
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_and_computed_marking() {
        let plan = propose(&declared(), None).unwrap();

        assert_eq!(
            plan.string("description").unwrap(),
            &TypedValue::Known(String::new())
        );
        assert!(plan.string("uuid").unwrap().is_unknown());
        assert!(plan.string("status").unwrap().is_unknown());

        let service = plan.object("service_config").unwrap();
        assert_eq!(
            service.string("type").unwrap(),
            &TypedValue::Known("database".to_string())
        );
        assert!(service.object("maintenance_window").unwrap().is_unknown());

        let backups = plan
            .object("application_config")
            .unwrap()
            .object("scheduled_backups")
            .unwrap();
        assert_eq!(backups.int64("retention").unwrap(), &TypedValue::Known(7));
        assert!(backups.object("schedule").unwrap().is_unknown());
    }

    #[test]
    fn test_optional_attribute_without_default_stays_null() {
        let plan = propose(&declared(), None).unwrap();
        let app = plan.object("application_config").unwrap();
        assert!(app.object("recovery").unwrap().is_null());
    }

    #[test]
    fn test_prior_state_fills_unknown_computed_values() {
        let first = propose(&declared(), None).unwrap();
        let prior = first
            .with_attribute("uuid", "5d0bd1a0")
            .unwrap()
            .with_attribute("status", "Ready")
            .unwrap();

        let plan = propose(&declared(), Some(&prior)).unwrap();
        assert_eq!(
            plan.string("uuid").unwrap(),
            &TypedValue::Known("5d0bd1a0".to_string())
        );
        assert_eq!(
            plan.string("status").unwrap(),
            &TypedValue::Known("Ready".to_string())
        );
        // Still unknown in the prior state, so still unknown.
        assert!(plan.string("created_at").unwrap().is_unknown());
    }

    #[test]
    fn test_unknown_declaration_is_returned_as_is() {
        let set = SchemaVersion::V1.schemas();
        let plan = propose(&ConfigObject::unknown(&set.database), None).unwrap();
        assert!(plan.is_unknown());
    }
}
