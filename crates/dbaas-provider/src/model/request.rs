//! Building API requests from a planned database object.

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::api::{
    ApplicationConfigRequest, CreateDatabaseRequest, DatabaseRequest, MaintenanceWindow,
    PrivateNetworkConfig, PublicNetworkConfig, Recovery, Schedule, ScheduledBackups,
    ServiceConfigRequest, UpdateDatabaseRequest,
};
use crate::value::{CodecError, ConfigObject, Result, TypedValue, Value};

/// Which call a request is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Create,
    Update,
}

/// Builds the body of a create call from a planned database object.
pub fn create_request(plan: &ConfigObject) -> Result<CreateDatabaseRequest> {
    build(plan, RequestKind::Create)
}

/// Builds the body of an update call.
///
/// Region and application type cannot change after creation and are left
/// out, as is the recovery block.
pub fn update_request(plan: &ConfigObject) -> Result<UpdateDatabaseRequest> {
    build(plan, RequestKind::Update)
}

fn build(plan: &ConfigObject, kind: RequestKind) -> Result<DatabaseRequest> {
    let service = plan.object("service_config")?;
    let application = plan.object("application_config")?;
    let create = kind == RequestKind::Create;

    let service_config = ServiceConfigRequest {
        disksize: int(service, "disksize")?,
        service_type: text(service, "type")?,
        flavor: text(service, "flavor")?,
        region: if create { string(service, "region")? } else { None },
        maintenance_window: known_object(service, "maintenance_window")?
            .map(maintenance_window)
            .transpose()?,
        remote_ips: strings(service, "remote_ips")?,
    };

    let application_config = ApplicationConfigRequest {
        application_type: if create { string(application, "type")? } else { None },
        password: string(application, "password")?.map(SecretString::from),
        instances: int(application, "instances")?,
        version: text(application, "version")?,
        scheduled_backups: known_object(application, "scheduled_backups")?
            .map(scheduled_backups)
            .transpose()?,
        recovery: if create {
            known_object(application, "recovery")?
                .map(recovery)
                .transpose()?
        } else {
            None
        },
        private_networking: known_object(application, "private_networking")?
            .map(private_networking)
            .transpose()?,
        public_networking: known_object(application, "public_networking")?
            .map(public_networking)
            .transpose()?,
    };

    Ok(DatabaseRequest {
        name: text(plan, "name")?,
        description: text(plan, "description")?,
        service_config,
        application_config,
    })
}

fn maintenance_window(obj: &ConfigObject) -> Result<MaintenanceWindow> {
    Ok(MaintenanceWindow {
        day_of_week: int(obj, "day_of_week")?,
        start_hour: int(obj, "start_hour")?,
        start_minute: int(obj, "start_minute")?,
    })
}

fn scheduled_backups(obj: &ConfigObject) -> Result<ScheduledBackups> {
    let schedule = match known_object(obj, "schedule")? {
        Some(schedule) => Some(Schedule {
            hour: int(schedule, "hour")?,
            minute: int(schedule, "minute")?,
        }),
        None => None,
    };
    Ok(ScheduledBackups {
        retention: int(obj, "retention")?,
        schedule,
    })
}

fn recovery(obj: &ConfigObject) -> Result<Recovery> {
    let target_time = match string(obj, "target_time")? {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| CodecError::mismatch("RFC 3339 timestamp", format!("'{}' ({})", raw, e)))?
                .with_timezone(&Utc),
        ),
        None => None,
    };
    Ok(Recovery {
        exclusive: flag(obj, "exclusive")?.unwrap_or(false),
        source: text(obj, "source")?,
        target_lsn: string(obj, "target_lsn")?,
        target_name: string(obj, "target_name")?,
        target_time,
        target_xid: string(obj, "target_xid")?,
    })
}

fn private_networking(obj: &ConfigObject) -> Result<PrivateNetworkConfig> {
    Ok(PrivateNetworkConfig {
        enabled: flag(obj, "enabled")?.unwrap_or(true),
        allowed_cidrs: strings(obj, "allowed_cidrs")?.unwrap_or_default(),
        shared_subnet_cidr: string(obj, "shared_subnet_cidr")?,
        ..Default::default()
    })
}

fn public_networking(obj: &ConfigObject) -> Result<PublicNetworkConfig> {
    Ok(PublicNetworkConfig {
        enabled: flag(obj, "enabled")?.unwrap_or(false),
        allowed_cidrs: strings(obj, "allowed_cidrs")?.unwrap_or_default(),
        ..Default::default()
    })
}

/// Returns the attribute when the schema declares it, `None` otherwise.
fn declared<'a>(obj: &'a ConfigObject, name: &str) -> Result<Option<&'a Value>> {
    if !obj.schema().contains(name) {
        return Ok(None);
    }
    obj.get(name).map(Some)
}

fn string(obj: &ConfigObject, name: &str) -> Result<Option<String>> {
    match declared(obj, name)? {
        Some(value) => Ok(value.as_string()?.as_known().cloned()),
        None => Ok(None),
    }
}

/// A string attribute, empty when not known.
fn text(obj: &ConfigObject, name: &str) -> Result<String> {
    Ok(string(obj, name)?.unwrap_or_default())
}

fn int(obj: &ConfigObject, name: &str) -> Result<Option<i64>> {
    match declared(obj, name)? {
        Some(value) => Ok(value.as_int64()?.as_known().copied()),
        None => Ok(None),
    }
}

fn flag(obj: &ConfigObject, name: &str) -> Result<Option<bool>> {
    match declared(obj, name)? {
        Some(value) => Ok(value.as_bool()?.as_known().copied()),
        None => Ok(None),
    }
}

fn strings(obj: &ConfigObject, name: &str) -> Result<Option<Vec<String>>> {
    match declared(obj, name)? {
        Some(value) => {
            let list = value.as_list()?;
            match list.items() {
                TypedValue::Known(_) => list.to_strings().map(Some),
                _ => Ok(None),
            }
        }
        None => Ok(None),
    }
}

/// A nested object attribute, only when it is Known.
fn known_object<'a>(obj: &'a ConfigObject, name: &str) -> Result<Option<&'a ConfigObject>> {
    match declared(obj, name)? {
        Some(value) => {
            let nested = value.as_object()?;
            Ok(nested.is_known().then_some(nested))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaVersion;
    use crate::value::ListValue;

    fn plan(version: SchemaVersion, with_recovery: bool) -> ConfigObject {
        let set = version.schemas();
        let schedule = ConfigObject::builder(&set.schedule)
            .set("hour", 2_i64)
            .set("minute", 30_i64)
            .build()
            .unwrap();
        let backups = ConfigObject::builder(&set.scheduled_backups)
            .set("retention", 14_i64)
            .set("schedule", schedule)
            .build()
            .unwrap();
        let recovery = if with_recovery {
            ConfigObject::builder(&set.recovery)
                .set("exclusive", true)
                .set("source", "0b6cd3a4")
                .set("target_time", "2024-05-01T12:00:00+02:00")
                .build()
                .unwrap()
        } else {
            ConfigObject::null(&set.recovery)
        };

        let mut app = ConfigObject::builder(&set.application_config)
            .set("instances", 3_i64)
            .set("password", "a-long-enough-secret")
            .set("type", "postgresql")
            .set("version", "16.2")
            .set("scheduled_backups", backups)
            .set("recovery", recovery);
        if let Some(private) = &set.private_networking {
            app = app.set(
                "private_networking",
                ConfigObject::builder(private)
                    .set("enabled", true)
                    .set("allowed_cidrs", ListValue::strings(["10.0.0.0/8"]))
                    .set("shared_subnet_cidr", "10.240.0.0/24")
                    .unknown_rest()
                    .build()
                    .unwrap(),
            );
        }
        if let Some(public) = &set.public_networking {
            app = app.set("public_networking", ConfigObject::unknown(public));
        }

        let service = ConfigObject::builder(&set.service_config)
            .set("disksize", 25_i64)
            .set("flavor", "m2c.medium")
            .set("region", "dus2")
            .set("type", "database")
            .set("maintenance_window", ConfigObject::unknown(&set.maintenance_window))
            .set_if_declared("remote_ips", ListValue::strings(["192.0.2.0/24"]));

        ConfigObject::builder(&set.database)
            .set("name", "orders")
            .set("description", "order store")
            .set("application_config", app.build().unwrap())
            .set("service_config", service.build().unwrap())
            .unknown_rest()
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_request_v2() {
        let req = create_request(&plan(SchemaVersion::V2, true)).unwrap();
        assert_eq!(req.name, "orders");
        assert_eq!(req.service_config.region.as_deref(), Some("dus2"));
        assert!(req.service_config.maintenance_window.is_none());
        assert!(req.service_config.remote_ips.is_none());
        assert_eq!(req.application_config.application_type.as_deref(), Some("postgresql"));
        assert_eq!(req.application_config.instances, Some(3));

        let backups = req.application_config.scheduled_backups.unwrap();
        assert_eq!(backups.retention, Some(14));
        assert_eq!(backups.schedule.unwrap().hour, Some(2));

        let private = req.application_config.private_networking.unwrap();
        assert!(private.enabled);
        assert_eq!(private.allowed_cidrs, vec!["10.0.0.0/8"]);
        assert!(private.hostname.is_none());
        assert!(req.application_config.public_networking.is_none());
    }

    #[test]
    fn test_create_request_normalizes_recovery_time_to_utc() {
        let req = create_request(&plan(SchemaVersion::V2, true)).unwrap();
        let recovery = req.application_config.recovery.unwrap();
        assert!(recovery.exclusive);
        assert_eq!(recovery.source, "0b6cd3a4");
        assert_eq!(
            recovery.target_time.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_update_request_omits_immutable_fields() {
        let req = update_request(&plan(SchemaVersion::V2, true)).unwrap();
        assert!(req.service_config.region.is_none());
        assert!(req.application_config.application_type.is_none());
        assert!(req.application_config.recovery.is_none());
        assert_eq!(req.service_config.service_type, "database");
    }

    #[test]
    fn test_v1_request_carries_remote_ips() {
        let req = create_request(&plan(SchemaVersion::V1, false)).unwrap();
        assert_eq!(
            req.service_config.remote_ips,
            Some(vec!["192.0.2.0/24".to_string()])
        );
        assert!(req.application_config.private_networking.is_none());
        assert!(req.application_config.recovery.is_none());
    }

    #[test]
    fn test_unknown_plan_is_rejected() {
        let set = SchemaVersion::V2.schemas();
        let err = create_request(&ConfigObject::unknown(&set.database)).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }
}
