//! Attribute validation for a declared database.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::value::{ConfigObject, TypedValue, Value};

static RE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").unwrap()
});

const NAME_MAX_LENGTH: usize = 64;
const DESCRIPTION_MAX_LENGTH: usize = 128;
const INSTANCES_MAX: i64 = 5;
const PASSWORD_MIN_LENGTH: usize = 16;
const RETENTION_RANGE: (i64, i64) = (7, 90);
const HOUR_RANGE: (i64, i64) = (0, 23);
const MINUTE_RANGE: (i64, i64) = (0, 59);
const DISKSIZE_RANGE: (i64, i64) = (5, 500);

const RECOVERY_TARGETS: &[&str] = &["target_lsn", "target_name", "target_time", "target_xid"];

/// Validator for a declared database object.
///
/// Collects every violation instead of stopping at the first one. Unknown
/// values are skipped; they are checked once they become known.
pub struct ResourceValidator {
    diagnostics: Diagnostics,
}

impl ResourceValidator {
    pub fn new() -> Self {
        Self {
            diagnostics: Diagnostics::new(),
        }
    }

    /// Validates a database object and returns the collected diagnostics.
    pub fn validate(&mut self, database: &ConfigObject) -> Diagnostics {
        self.diagnostics = Diagnostics::new();

        let root = AttributePath::root();
        self.validate_required(database, &root);

        if database.is_known() {
            self.validate_database(database);
        }

        std::mem::take(&mut self.diagnostics)
    }

    /// Reports Null values of required attributes, recursing into Known objects.
    fn validate_required(&mut self, object: &ConfigObject, path: &AttributePath) {
        let TypedValue::Known(attributes) = object.attributes() else {
            return;
        };
        for field in object.schema().fields() {
            let field_path = path.child(field.name);
            match attributes.get(field.name) {
                Some(value) if value.is_null() && field.mode.is_required() => {
                    self.error(
                        field_path,
                        "Missing required attribute",
                        format!("The attribute '{}' is required.", field.name),
                    );
                }
                Some(Value::Object(nested)) => self.validate_required(nested, &field_path),
                _ => {}
            }
        }
    }

    fn validate_database(&mut self, database: &ConfigObject) {
        if let Some(name) = known_string(database, "name") {
            let path = AttributePath::new("name");
            let len = name.chars().count();
            if len == 0 || len > NAME_MAX_LENGTH {
                self.error(
                    path.clone(),
                    "Invalid attribute length",
                    format!(
                        "name must be between 1 and {} characters, got {}.",
                        NAME_MAX_LENGTH, len
                    ),
                );
            }
            if !RE_NAME.is_match(name) {
                self.error(
                    path,
                    "Invalid attribute value",
                    format!(
                        "name '{}' must start and end with a letter or digit and contain only letters, digits, '-', '_' and '.'.",
                        name
                    ),
                );
            }
        }

        if let Some(description) = known_string(database, "description") {
            let len = description.chars().count();
            if len > DESCRIPTION_MAX_LENGTH {
                self.error(
                    AttributePath::new("description"),
                    "Invalid attribute length",
                    format!(
                        "description must be at most {} characters, got {}.",
                        DESCRIPTION_MAX_LENGTH, len
                    ),
                );
            }
        }

        if let Some(service) = known_object(database, "service_config") {
            let path = AttributePath::new("service_config");
            self.validate_range(service, "disksize", DISKSIZE_RANGE, &path);
        }

        if let Some(application) = known_object(database, "application_config") {
            self.validate_application(application);
        }
    }

    fn validate_application(&mut self, application: &ConfigObject) {
        let path = AttributePath::new("application_config");

        if let Some(instances) = known_int(application, "instances") {
            if instances > INSTANCES_MAX {
                self.error(
                    path.child("instances"),
                    "Invalid attribute value",
                    format!("instances must be at most {}, got {}.", INSTANCES_MAX, instances),
                );
            }
        }

        if let Some(password) = known_string(application, "password") {
            let len = password.chars().count();
            if len < PASSWORD_MIN_LENGTH {
                self.error(
                    path.child("password"),
                    "Invalid attribute length",
                    format!(
                        "password must be at least {} characters, got {}.",
                        PASSWORD_MIN_LENGTH, len
                    ),
                );
            }
        }

        if let Some(backups) = known_object(application, "scheduled_backups") {
            let backups_path = path.child("scheduled_backups");
            self.validate_range(backups, "retention", RETENTION_RANGE, &backups_path);
            if let Some(schedule) = known_object(backups, "schedule") {
                let schedule_path = backups_path.child("schedule");
                self.validate_range(schedule, "hour", HOUR_RANGE, &schedule_path);
                self.validate_range(schedule, "minute", MINUTE_RANGE, &schedule_path);
            }
        }

        if let Some(recovery) = known_object(application, "recovery") {
            self.validate_recovery(recovery, &path.child("recovery"));
        }
    }

    fn validate_recovery(&mut self, recovery: &ConfigObject, path: &AttributePath) {
        let targets: Vec<&str> = RECOVERY_TARGETS
            .iter()
            .copied()
            .filter(|name| known_string(recovery, name).is_some())
            .collect();
        if targets.len() > 1 {
            self.error(
                path.clone(),
                "Conflicting recovery targets",
                format!(
                    "At most one recovery target may be set, got {}.",
                    targets.join(", ")
                ),
            );
        }

        if let Some(raw) = known_string(recovery, "target_time") {
            if let Err(e) = DateTime::parse_from_rfc3339(raw) {
                self.error(
                    path.child("target_time"),
                    "Invalid attribute value",
                    format!("target_time '{}' is not an RFC 3339 timestamp: {}.", raw, e),
                );
            }
        }
    }

    fn validate_range(
        &mut self,
        object: &ConfigObject,
        name: &str,
        (min, max): (i64, i64),
        path: &AttributePath,
    ) {
        if let Some(value) = known_int(object, name) {
            if value < min || value > max {
                self.error(
                    path.child(name),
                    "Invalid attribute value",
                    format!("{} must be between {} and {}, got {}.", name, min, max, value),
                );
            }
        }
    }

    fn error(&mut self, path: AttributePath, summary: &str, detail: String) {
        self.diagnostics
            .add_attribute_error(path, DiagnosticKind::Validation, summary, detail);
    }
}

impl Default for ResourceValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a database object with a fresh [`ResourceValidator`].
pub fn validate_database(database: &ConfigObject) -> Diagnostics {
    ResourceValidator::new().validate(database)
}

fn known_string<'a>(object: &'a ConfigObject, name: &str) -> Option<&'a str> {
    object
        .string(name)
        .ok()
        .and_then(|v| v.as_known())
        .map(String::as_str)
}

fn known_int(object: &ConfigObject, name: &str) -> Option<i64> {
    object.int64(name).ok().and_then(|v| v.as_known()).copied()
}

fn known_object<'a>(object: &'a ConfigObject, name: &str) -> Option<&'a ConfigObject> {
    object.object(name).ok().filter(|o| o.is_known())
}
