//! Request and response payloads of the DBaaS API.
//!
//! One set of structs serves both API revisions. Members that only exist in
//! one revision are optional and left out of the JSON when unset, so each
//! revision keeps its own wire shape.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// Status reported by the API once a database has finished converging.
pub const READY_STATUS: &str = "Ready";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_hour: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_minute: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledBackups {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

/// Point-in-time recovery settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recovery {
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_xid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateNetworkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_subnet_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_network_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicNetworkConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfigRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disksize: Option<i64>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub flavor: String,
    /// Not accepted on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationConfigRequest {
    /// Not accepted on update.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub application_type: Option<String>,
    #[serde(
        serialize_with = "serialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<i64>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_backups: Option<ScheduledBackups>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Recovery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_networking: Option<PrivateNetworkConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_networking: Option<PublicNetworkConfig>,
}

/// Body of a create or update call.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseRequest {
    pub name: String,
    pub description: String,
    pub service_config: ServiceConfigRequest,
    pub application_config: ApplicationConfigRequest,
}

pub type CreateDatabaseRequest = DatabaseRequest;
pub type UpdateDatabaseRequest = DatabaseRequest;

impl DatabaseRequest {
    /// Renders the request as JSON with the password replaced, for logging.
    pub fn redacted_json(&self) -> String {
        match serde_json::to_value(self) {
            Ok(mut value) => {
                if let Some(password) = value
                    .get_mut("application_config")
                    .and_then(|app| app.get_mut("password"))
                {
                    *password = serde_json::Value::String("[REDACTED]".to_string());
                }
                value.to_string()
            }
            Err(e) => format!("<unserializable request: {}>", e),
        }
    }
}

fn serialize_secret<S>(secret: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(secret) => serializer.serialize_str(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfigResponse {
    #[serde(default)]
    pub disksize: Option<i64>,
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfigResponse {
    #[serde(rename = "type", default)]
    pub application_type: String,
    #[serde(default)]
    pub instances: Option<i64>,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub scheduled_backups: Option<ScheduledBackups>,
    #[serde(default)]
    pub recovery: Option<Recovery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_networking: Option<PrivateNetworkConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_networking: Option<PublicNetworkConfig>,
}

/// A database as returned by create and get calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseResponse {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub resource_status: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_modified_by: String,
    #[serde(default)]
    pub last_modified_at: String,
    #[serde(default)]
    pub service_config: Option<ServiceConfigResponse>,
    #[serde(default)]
    pub application_config: Option<ApplicationConfigResponse>,
}

impl DatabaseResponse {
    pub fn is_ready(&self) -> bool {
        self.status == READY_STATUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DatabaseRequest {
        DatabaseRequest {
            name: "orders".to_string(),
            description: String::new(),
            service_config: ServiceConfigRequest {
                disksize: Some(25),
                service_type: "database".to_string(),
                flavor: "m2c.small".to_string(),
                region: None,
                maintenance_window: None,
                remote_ips: None,
            },
            application_config: ApplicationConfigRequest {
                application_type: None,
                password: Some(SecretString::from("correct-horse-battery")),
                instances: Some(1),
                version: "16.2".to_string(),
                scheduled_backups: None,
                recovery: None,
                private_networking: None,
                public_networking: None,
            },
        }
    }

    #[test]
    fn test_request_omits_unset_members() {
        let json = serde_json::to_value(request()).unwrap();
        let service = &json["service_config"];
        assert!(service.get("region").is_none());
        assert!(service.get("remote_ips").is_none());
        assert_eq!(service["type"], "database");
        assert!(json["application_config"].get("type").is_none());
    }

    #[test]
    fn test_password_is_serialized_but_redacted_in_logs() {
        let req = request();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["application_config"]["password"], "correct-horse-battery");

        let logged = req.redacted_json();
        assert!(!logged.contains("correct-horse-battery"));
        assert!(logged.contains("[REDACTED]"));
        assert!(!format!("{:?}", req).contains("correct-horse-battery"));
    }

    #[test]
    fn test_response_tolerates_missing_members() {
        let resp: DatabaseResponse =
            serde_json::from_str(r#"{"uuid":"abc","status":"Ready"}"#).unwrap();
        assert!(resp.is_ready());
        assert!(resp.service_config.is_none());
        assert!(resp.application_config.is_none());
    }

    #[test]
    fn test_recovery_target_time_parses_rfc3339() {
        let rec: Recovery = serde_json::from_str(
            r#"{"exclusive":true,"source":"db-1","target_time":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            rec.target_time.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }
}
