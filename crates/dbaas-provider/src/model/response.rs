//! Turning API responses into database state objects.

use std::sync::Arc;

use chrono::SecondsFormat;

use crate::api::{
    ApplicationConfigResponse, DatabaseResponse, MaintenanceWindow, PrivateNetworkConfig,
    PublicNetworkConfig, Recovery, ScheduledBackups, ServiceConfigResponse,
};
use crate::value::{AttrType, ConfigObject, ListValue, ObjectSchema, Result, TypedValue};

use super::schema::{SchemaSet, SchemaVersion};

/// Decodes a response into a database state object of the given revision.
///
/// The API never returns the admin password, so the caller supplies it:
/// a Known password is kept, anything else is stored as Null.
pub fn response_to_state(
    response: &DatabaseResponse,
    version: SchemaVersion,
    password: &TypedValue<String>,
) -> Result<ConfigObject> {
    let set = version.schemas();
    let password = match password {
        TypedValue::Known(p) => TypedValue::Known(p.clone()),
        _ => TypedValue::Null,
    };

    let application = match &response.application_config {
        Some(app) => application_config(set, app, password)?,
        None => ConfigObject::null(&set.application_config),
    };
    let service = match &response.service_config {
        Some(svc) => service_config(set, svc)?,
        None => ConfigObject::null(&set.service_config),
    };

    ConfigObject::builder(&set.database)
        .set("application_config", application)
        .set("created_at", response.created_at.as_str())
        .set("created_by", response.created_by.as_str())
        .set("description", response.description.as_str())
        .set("last_modified_at", response.last_modified_at.as_str())
        .set("last_modified_by", response.last_modified_by.as_str())
        .set("name", response.name.as_str())
        .set("service_config", service)
        .set("status", response.status.as_str())
        .set("phase", response.phase.as_str())
        .set("resource_status", response.resource_status.as_str())
        .set("uuid", response.uuid.as_str())
        .build()
}

fn service_config(set: &SchemaSet, svc: &ServiceConfigResponse) -> Result<ConfigObject> {
    let window = match &svc.maintenance_window {
        Some(mw) => maintenance_window(set, mw)?,
        None => ConfigObject::null(&set.maintenance_window),
    };
    let remote_ips = match &svc.remote_ips {
        Some(ips) => ListValue::strings(ips.iter().cloned()),
        None => ListValue::null(AttrType::String),
    };

    ConfigObject::builder(&set.service_config)
        .set("disksize", TypedValue::from(svc.disksize))
        .set("flavor", svc.flavor.as_str())
        .set("maintenance_window", window)
        .set("region", svc.region.as_str())
        .set_if_declared("remote_ips", remote_ips)
        .set("type", svc.service_type.as_str())
        .build()
}

fn maintenance_window(set: &SchemaSet, mw: &MaintenanceWindow) -> Result<ConfigObject> {
    ConfigObject::builder(&set.maintenance_window)
        .set("day_of_week", TypedValue::from(mw.day_of_week))
        .set("start_hour", TypedValue::from(mw.start_hour))
        .set("start_minute", TypedValue::from(mw.start_minute))
        .build()
}

fn application_config(
    set: &SchemaSet,
    app: &ApplicationConfigResponse,
    password: TypedValue<String>,
) -> Result<ConfigObject> {
    let backups = match &app.scheduled_backups {
        Some(sb) => scheduled_backups(set, sb)?,
        None => ConfigObject::null(&set.scheduled_backups),
    };
    let recovery = match &app.recovery {
        Some(rec) => recovery(set, rec)?,
        None => ConfigObject::null(&set.recovery),
    };

    let mut builder = ConfigObject::builder(&set.application_config)
        .set_if_declared("hostname", TypedValue::from(app.hostname.clone()))
        .set("instances", TypedValue::from(app.instances))
        .set_if_declared("ip_address", TypedValue::from(app.ip_address.clone()))
        .set("password", password)
        .set("recovery", recovery)
        .set("scheduled_backups", backups)
        .set("type", app.application_type.as_str())
        .set("version", app.version.as_str());

    if let Some(schema) = &set.private_networking {
        let private = match &app.private_networking {
            Some(pn) => private_networking(schema, pn)?,
            None => ConfigObject::null(schema),
        };
        builder = builder.set("private_networking", private);
    }
    if let Some(schema) = &set.public_networking {
        let public = match &app.public_networking {
            Some(pn) => public_networking(schema, pn)?,
            None => ConfigObject::null(schema),
        };
        builder = builder.set("public_networking", public);
    }

    builder.build()
}

fn scheduled_backups(set: &SchemaSet, sb: &ScheduledBackups) -> Result<ConfigObject> {
    let schedule = match &sb.schedule {
        Some(s) => ConfigObject::builder(&set.schedule)
            .set("hour", TypedValue::from(s.hour))
            .set("minute", TypedValue::from(s.minute))
            .build()?,
        None => ConfigObject::null(&set.schedule),
    };
    ConfigObject::builder(&set.scheduled_backups)
        .set("retention", TypedValue::from(sb.retention))
        .set("schedule", schedule)
        .build()
}

fn recovery(set: &SchemaSet, rec: &Recovery) -> Result<ConfigObject> {
    let target_time = rec
        .target_time
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
    ConfigObject::builder(&set.recovery)
        .set("exclusive", rec.exclusive)
        .set("source", rec.source.as_str())
        .set("target_lsn", TypedValue::from(rec.target_lsn.clone()))
        .set("target_name", TypedValue::from(rec.target_name.clone()))
        .set("target_time", TypedValue::from(target_time))
        .set("target_xid", TypedValue::from(rec.target_xid.clone()))
        .build()
}

fn private_networking(
    schema: &Arc<ObjectSchema>,
    pn: &PrivateNetworkConfig,
) -> Result<ConfigObject> {
    ConfigObject::builder(schema)
        .set("enabled", pn.enabled)
        .set("allowed_cidrs", ListValue::strings(pn.allowed_cidrs.iter().cloned()))
        .set("hostname", TypedValue::from(pn.hostname.clone()))
        .set("ip_address", TypedValue::from(pn.ip_address.clone()))
        .set("shared_subnet_cidr", TypedValue::from(pn.shared_subnet_cidr.clone()))
        .set("shared_subnet_id", TypedValue::from(pn.shared_subnet_id.clone()))
        .set("shared_network_id", TypedValue::from(pn.shared_network_id.clone()))
        .build()
}

fn public_networking(
    schema: &Arc<ObjectSchema>,
    pn: &PublicNetworkConfig,
) -> Result<ConfigObject> {
    ConfigObject::builder(schema)
        .set("enabled", pn.enabled)
        .set("allowed_cidrs", ListValue::strings(pn.allowed_cidrs.iter().cloned()))
        .set("hostname", TypedValue::from(pn.hostname.clone()))
        .set("ip_address", TypedValue::from(pn.ip_address.clone()))
        .build()
}
