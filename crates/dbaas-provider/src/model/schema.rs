//! Attribute schemas of the database resource, per API revision.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::value::{AttrType, FieldSchema, ObjectSchema, StaticDefault};

/// Revision of the remote API and of the resource schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    #[default]
    V2,
}

impl SchemaVersion {
    /// Path segment used by the remote API for this revision.
    pub fn path_segment(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
        }
    }

    pub fn schemas(&self) -> &'static SchemaSet {
        match self {
            SchemaVersion::V1 => &V1,
            SchemaVersion::V2 => &V2,
        }
    }

    pub fn all() -> &'static [SchemaVersion] {
        &[SchemaVersion::V1, SchemaVersion::V2]
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(SchemaVersion::V1),
            "v2" => Ok(SchemaVersion::V2),
            other => Err(format!("Unknown schema version: {}", other)),
        }
    }
}

/// Every object schema that makes up one revision of the database resource.
#[derive(Debug)]
pub struct SchemaSet {
    pub version: SchemaVersion,
    pub database: Arc<ObjectSchema>,
    pub application_config: Arc<ObjectSchema>,
    pub service_config: Arc<ObjectSchema>,
    pub scheduled_backups: Arc<ObjectSchema>,
    pub schedule: Arc<ObjectSchema>,
    pub recovery: Arc<ObjectSchema>,
    pub maintenance_window: Arc<ObjectSchema>,
    /// Only present in revisions with split network configuration.
    pub private_networking: Option<Arc<ObjectSchema>>,
    pub public_networking: Option<Arc<ObjectSchema>>,
}

impl SchemaSet {
    /// Iterates over every schema in the set, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ObjectSchema>> {
        [
            Some(&self.database),
            Some(&self.application_config),
            Some(&self.service_config),
            Some(&self.scheduled_backups),
            Some(&self.schedule),
            Some(&self.recovery),
            Some(&self.maintenance_window),
            self.private_networking.as_ref(),
            self.public_networking.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

fn oc(name: &'static str, ty: AttrType) -> FieldSchema {
    FieldSchema::optional_computed(name, ty)
}

fn schedule() -> Arc<ObjectSchema> {
    ObjectSchema::shared(
        "Schedule",
        vec![oc("hour", AttrType::Int64), oc("minute", AttrType::Int64)],
    )
}

fn scheduled_backups(schedule: &Arc<ObjectSchema>) -> Arc<ObjectSchema> {
    ObjectSchema::shared(
        "ScheduledBackups",
        vec![
            oc("retention", AttrType::Int64).with_default(StaticDefault::Int64(7)),
            oc("schedule", AttrType::object(schedule)),
        ],
    )
}

fn recovery() -> Arc<ObjectSchema> {
    ObjectSchema::shared(
        "Recovery",
        vec![
            oc("exclusive", AttrType::Bool).with_default(StaticDefault::Bool(false)),
            oc("source", AttrType::String),
            oc("target_lsn", AttrType::String),
            oc("target_name", AttrType::String),
            oc("target_time", AttrType::String),
            oc("target_xid", AttrType::String),
        ],
    )
}

fn maintenance_window() -> Arc<ObjectSchema> {
    ObjectSchema::shared(
        "MaintenanceWindow",
        vec![
            oc("day_of_week", AttrType::Int64),
            oc("start_hour", AttrType::Int64),
            oc("start_minute", AttrType::Int64),
        ],
    )
}

fn database(application: &Arc<ObjectSchema>, service: &Arc<ObjectSchema>) -> Arc<ObjectSchema> {
    ObjectSchema::shared(
        "Database",
        vec![
            FieldSchema::required("application_config", AttrType::object(application)),
            FieldSchema::computed("created_at", AttrType::String),
            FieldSchema::computed("created_by", AttrType::String),
            oc("description", AttrType::String).with_default(StaticDefault::String("")),
            FieldSchema::computed("last_modified_at", AttrType::String),
            FieldSchema::computed("last_modified_by", AttrType::String),
            FieldSchema::required("name", AttrType::String),
            FieldSchema::required("service_config", AttrType::object(service)),
            FieldSchema::computed("status", AttrType::String),
            FieldSchema::computed("phase", AttrType::String),
            FieldSchema::computed("resource_status", AttrType::String),
            FieldSchema::computed("uuid", AttrType::String),
        ],
    )
}

/// Revision 1: flat public hostname/IP and a remote IP allow-list.
pub static V1: LazyLock<SchemaSet> = LazyLock::new(|| {
    let schedule = schedule();
    let scheduled_backups = scheduled_backups(&schedule);
    let recovery = recovery();
    let maintenance_window = maintenance_window();

    let application_config = ObjectSchema::shared(
        "ApplicationConfig",
        vec![
            FieldSchema::computed("hostname", AttrType::String),
            FieldSchema::required("instances", AttrType::Int64),
            FieldSchema::computed("ip_address", AttrType::String),
            oc("password", AttrType::String).sensitive(),
            FieldSchema::optional("recovery", AttrType::object(&recovery)),
            oc("scheduled_backups", AttrType::object(&scheduled_backups)),
            FieldSchema::required("type", AttrType::String),
            FieldSchema::required("version", AttrType::String),
        ],
    );

    let service_config = ObjectSchema::shared(
        "ServiceConfig",
        vec![
            FieldSchema::required("disksize", AttrType::Int64),
            FieldSchema::required("flavor", AttrType::String),
            oc("maintenance_window", AttrType::object(&maintenance_window)),
            FieldSchema::required("region", AttrType::String),
            oc("remote_ips", AttrType::string_list()),
            FieldSchema::required("type", AttrType::String),
        ],
    );

    SchemaSet {
        version: SchemaVersion::V1,
        database: database(&application_config, &service_config),
        application_config,
        service_config,
        scheduled_backups,
        schedule,
        recovery,
        maintenance_window,
        private_networking: None,
        public_networking: None,
    }
});

/// Revision 2: separate private and public networking blocks.
pub static V2: LazyLock<SchemaSet> = LazyLock::new(|| {
    let schedule = schedule();
    let scheduled_backups = scheduled_backups(&schedule);
    let recovery = recovery();
    let maintenance_window = maintenance_window();

    let private_networking = ObjectSchema::shared(
        "PrivateNetworkConfig",
        vec![
            oc("enabled", AttrType::Bool).with_default(StaticDefault::Bool(true)),
            oc("allowed_cidrs", AttrType::string_list()),
            FieldSchema::computed("hostname", AttrType::String),
            FieldSchema::computed("ip_address", AttrType::String),
            oc("shared_subnet_cidr", AttrType::String)
                .with_default(StaticDefault::String("10.240.0.0/24")),
            FieldSchema::computed("shared_subnet_id", AttrType::String),
            FieldSchema::computed("shared_network_id", AttrType::String),
        ],
    );

    let public_networking = ObjectSchema::shared(
        "PublicNetworkConfig",
        vec![
            oc("enabled", AttrType::Bool).with_default(StaticDefault::Bool(false)),
            oc("allowed_cidrs", AttrType::string_list()),
            FieldSchema::computed("hostname", AttrType::String),
            FieldSchema::computed("ip_address", AttrType::String),
        ],
    );

    let application_config = ObjectSchema::shared(
        "ApplicationConfig",
        vec![
            FieldSchema::required("instances", AttrType::Int64),
            oc("password", AttrType::String).sensitive(),
            FieldSchema::optional("recovery", AttrType::object(&recovery)),
            oc("scheduled_backups", AttrType::object(&scheduled_backups)),
            FieldSchema::required("type", AttrType::String),
            FieldSchema::required("version", AttrType::String),
            oc("private_networking", AttrType::object(&private_networking)),
            oc("public_networking", AttrType::object(&public_networking)),
        ],
    );

    let service_config = ObjectSchema::shared(
        "ServiceConfig",
        vec![
            FieldSchema::required("disksize", AttrType::Int64),
            FieldSchema::required("flavor", AttrType::String),
            oc("maintenance_window", AttrType::object(&maintenance_window)),
            FieldSchema::required("region", AttrType::String),
            oc("type", AttrType::String).with_default(StaticDefault::String("database")),
        ],
    );

    SchemaSet {
        version: SchemaVersion::V2,
        database: database(&application_config, &service_config),
        application_config,
        service_config,
        scheduled_backups,
        schedule,
        recovery,
        maintenance_window,
        private_networking: Some(private_networking),
        public_networking: Some(public_networking),
    }
});
