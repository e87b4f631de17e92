//! Builders for plans and API responses.

#![allow(dead_code)]

use dbaas_provider::api::{
    ApplicationConfigResponse, DatabaseResponse, MaintenanceWindow, PrivateNetworkConfig,
    PublicNetworkConfig, Schedule, ScheduledBackups, ServiceConfigResponse,
};
use dbaas_provider::{ConfigObject, ListValue, SchemaVersion, TypedValue};

pub const UUID: &str = "5d0bd1a0-2c4e-4b0a-9d51-0d7ad0f1c2e3";
pub const PASSWORD: &str = "correct-horse-battery-staple";

/// Builder for declared database objects.
pub struct PlanBuilder {
    version: SchemaVersion,
    name: String,
    password: Option<String>,
    instances: i64,
    disksize: i64,
    retention: i64,
}

impl PlanBuilder {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            name: "orders".to_string(),
            password: Some(PASSWORD.to_string()),
            instances: 1,
            disksize: 25,
            retention: 7,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn password(mut self, password: Option<&str>) -> Self {
        self.password = password.map(str::to_string);
        self
    }

    pub fn instances(mut self, instances: i64) -> Self {
        self.instances = instances;
        self
    }

    pub fn disksize(mut self, disksize: i64) -> Self {
        self.disksize = disksize;
        self
    }

    pub fn retention(mut self, retention: i64) -> Self {
        self.retention = retention;
        self
    }

    pub fn build(self) -> ConfigObject {
        let set = self.version.schemas();

        let window = ConfigObject::builder(&set.maintenance_window)
            .set("day_of_week", 2_i64)
            .set("start_hour", 3_i64)
            .set("start_minute", 30_i64)
            .build()
            .unwrap();
        let service = ConfigObject::builder(&set.service_config)
            .set("disksize", self.disksize)
            .set("flavor", "m2c.small")
            .set("region", "dus2")
            .set("type", "database")
            .set("maintenance_window", window)
            .set_if_declared("remote_ips", ListValue::strings(["10.0.0.0/8"]))
            .build()
            .unwrap();

        let schedule = ConfigObject::builder(&set.schedule)
            .set("hour", 4_i64)
            .set("minute", 15_i64)
            .build()
            .unwrap();
        let backups = ConfigObject::builder(&set.scheduled_backups)
            .set("retention", self.retention)
            .set("schedule", schedule)
            .build()
            .unwrap();

        let mut app = ConfigObject::builder(&set.application_config)
            .set("instances", self.instances)
            .set("type", "postgresql")
            .set("version", "16.2")
            .set("scheduled_backups", backups)
            .set("password", TypedValue::from(self.password));
        if let Some(schema) = &set.private_networking {
            let private = ConfigObject::builder(schema)
                .set("enabled", true)
                .set("allowed_cidrs", ListValue::strings(["10.0.0.0/8"]))
                .build()
                .unwrap();
            app = app.set("private_networking", private);
        }
        if let Some(schema) = &set.public_networking {
            let public = ConfigObject::builder(schema)
                .set("enabled", false)
                .set("allowed_cidrs", ListValue::strings(Vec::<String>::new()))
                .build()
                .unwrap();
            app = app.set("public_networking", public);
        }

        ConfigObject::builder(&set.database)
            .set("name", self.name.as_str())
            .set("description", "order store")
            .set("application_config", app.build().unwrap())
            .set("service_config", service)
            .build()
            .unwrap()
    }
}

/// A valid plan with default settings.
pub fn plan(version: SchemaVersion) -> ConfigObject {
    PlanBuilder::new(version).build()
}

/// A response the API would send for the default plan.
pub fn response(version: SchemaVersion, status: &str) -> DatabaseResponse {
    let v2 = version == SchemaVersion::V2;
    DatabaseResponse {
        uuid: UUID.to_string(),
        name: "orders".to_string(),
        description: "order store".to_string(),
        status: status.to_string(),
        phase: "Running".to_string(),
        resource_status: "Healthy".to_string(),
        created_by: "ci@example.test".to_string(),
        created_at: "2024-05-06T07:08:09Z".to_string(),
        last_modified_by: "ci@example.test".to_string(),
        last_modified_at: "2024-05-06T07:08:09Z".to_string(),
        service_config: Some(ServiceConfigResponse {
            disksize: Some(25),
            service_type: "database".to_string(),
            flavor: "m2c.small".to_string(),
            region: "dus2".to_string(),
            maintenance_window: Some(MaintenanceWindow {
                day_of_week: Some(2),
                start_hour: Some(3),
                start_minute: Some(30),
            }),
            remote_ips: (!v2).then(|| vec!["10.0.0.0/8".to_string()]),
        }),
        application_config: Some(ApplicationConfigResponse {
            application_type: "postgresql".to_string(),
            instances: Some(1),
            version: "16.2".to_string(),
            hostname: (!v2).then(|| "orders.dbaas.example.test".to_string()),
            ip_address: (!v2).then(|| "192.0.2.10".to_string()),
            scheduled_backups: Some(ScheduledBackups {
                retention: Some(7),
                schedule: Some(Schedule {
                    hour: Some(4),
                    minute: Some(15),
                }),
            }),
            recovery: None,
            private_networking: v2.then(|| PrivateNetworkConfig {
                enabled: true,
                allowed_cidrs: vec!["10.0.0.0/8".to_string()],
                hostname: Some("orders.private.example.test".to_string()),
                ip_address: Some("10.240.0.12".to_string()),
                shared_subnet_cidr: Some("10.240.0.0/24".to_string()),
                shared_subnet_id: Some("subnet-1".to_string()),
                shared_network_id: Some("network-1".to_string()),
            }),
            public_networking: v2.then(PublicNetworkConfig::default),
        }),
    }
}

/// A persisted state for the default plan, as the API last reported it.
pub fn persisted_state(version: SchemaVersion, password: Option<&str>) -> ConfigObject {
    let password = TypedValue::from(password.map(str::to_string));
    dbaas_provider::model::response_to_state(&response(version, "Ready"), version, &password)
        .unwrap()
}
