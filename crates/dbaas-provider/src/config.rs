//! Provider configuration: API endpoint, credentials and target project.
//!
//! Each value is taken from the provider configuration object when set there,
//! otherwise from the environment, otherwise from a built-in default.
//!
//! | Attribute           | Environment variable           | Default                           |
//! |---------------------|--------------------------------|-----------------------------------|
//! | `url`               | `SYS11DBAAS_URL`               | `https://dbaas.apis.syseleven.de` |
//! | `api_key`           | `SYS11DBAAS_API_KEY`           |                                   |
//! | `organization`      | `SYS11DBAAS_ORGANIZATION`      |                                   |
//! | `project`           | `SYS11DBAAS_PROJECT`           |                                   |
//! | `wait_for_creation` | `SYS11DBAAS_WAIT_FOR_CREATION` | `true`                            |

use std::fmt;
use std::sync::{Arc, LazyLock};

use secrecy::SecretString;

use crate::api::ProjectRef;
use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::error::ConfigError;
use crate::model::SchemaVersion;
use crate::value::{AttrType, ConfigObject, FieldSchema, ObjectSchema, TypedValue};

pub const ENV_URL: &str = "SYS11DBAAS_URL";
pub const ENV_API_KEY: &str = "SYS11DBAAS_API_KEY";
pub const ENV_ORGANIZATION: &str = "SYS11DBAAS_ORGANIZATION";
pub const ENV_PROJECT: &str = "SYS11DBAAS_PROJECT";
pub const ENV_WAIT_FOR_CREATION: &str = "SYS11DBAAS_WAIT_FOR_CREATION";

pub const DEFAULT_URL: &str = "https://dbaas.apis.syseleven.de";

/// Schema of the provider configuration object.
pub static PROVIDER_SCHEMA: LazyLock<Arc<ObjectSchema>> = LazyLock::new(|| {
    ObjectSchema::shared(
        "Provider",
        vec![
            FieldSchema::optional("url", AttrType::String),
            FieldSchema::optional("api_key", AttrType::String).sensitive(),
            FieldSchema::optional("organization", AttrType::String),
            FieldSchema::optional("project", AttrType::String),
            FieldSchema::optional("wait_for_creation", AttrType::Bool),
        ],
    )
});

/// Resolved provider configuration.
#[derive(Clone)]
pub struct ProviderConfig {
    pub url: String,
    pub api_key: SecretString,
    pub organization: String,
    pub project: String,
    pub wait_for_creation: bool,
    pub schema_version: SchemaVersion,
}

impl ProviderConfig {
    pub fn project_ref(&self) -> ProjectRef {
        ProjectRef::new(&self.organization, &self.project)
    }

    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("wait_for_creation", &self.wait_for_creation)
            .field("schema_version", &self.schema_version)
            .finish()
    }
}

/// Resolves the provider configuration against the process environment.
pub fn resolve(config: &ConfigObject) -> Result<ProviderConfig, ConfigError> {
    resolve_with(config, |name| std::env::var(name).ok())
}

/// Resolves the provider configuration with a custom environment lookup.
///
/// Unknown values and missing required values are all reported together.
pub fn resolve_with<F>(config: &ConfigObject, lookup: F) -> Result<ProviderConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut diagnostics = Diagnostics::new();

    let url = explicit_string(config, "url", &mut diagnostics);
    let api_key = explicit_string(config, "api_key", &mut diagnostics);
    let organization = explicit_string(config, "organization", &mut diagnostics);
    let project = explicit_string(config, "project", &mut diagnostics);
    let wait_for_creation = explicit_bool(config, "wait_for_creation", &mut diagnostics);

    if diagnostics.has_error() {
        return Err(ConfigError::Provider(diagnostics));
    }

    let url = url
        .or_else(|| lookup(ENV_URL))
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let api_key = api_key.or_else(|| lookup(ENV_API_KEY)).unwrap_or_default();
    let organization = organization
        .or_else(|| lookup(ENV_ORGANIZATION))
        .unwrap_or_default();
    let project = project.or_else(|| lookup(ENV_PROJECT)).unwrap_or_default();
    let wait_for_creation = wait_for_creation.unwrap_or_else(|| {
        lookup(ENV_WAIT_FOR_CREATION)
            .map(|raw| parse_bool(&raw).unwrap_or(false))
            .unwrap_or(true)
    });

    for (name, value, env) in [
        ("url", &url, ENV_URL),
        ("api_key", &api_key, ENV_API_KEY),
        ("organization", &organization, ENV_ORGANIZATION),
        ("project", &project, ENV_PROJECT),
    ] {
        if value.is_empty() {
            diagnostics.add_attribute_error(
                AttributePath::new(name),
                DiagnosticKind::Config,
                format!("Missing DBaaS {}", name),
                format!(
                    "The provider cannot create the DBaaS API client as there is a missing or empty value for {}. \
                     Set the {} value in the configuration or use the {} environment variable.",
                    name, name, env
                ),
            );
        }
    }

    if diagnostics.has_error() {
        return Err(ConfigError::Provider(diagnostics));
    }

    Ok(ProviderConfig {
        url,
        api_key: SecretString::from(api_key),
        organization,
        project,
        wait_for_creation,
        schema_version: SchemaVersion::default(),
    })
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn attribute<'a, T>(
    config: &'a ConfigObject,
    name: &str,
    get: impl Fn(&'a ConfigObject, &str) -> crate::value::Result<&'a TypedValue<T>>,
    diagnostics: &mut Diagnostics,
) -> Option<&'a T> {
    match config.attributes() {
        TypedValue::Null => return None,
        TypedValue::Unknown => {
            unknown_value(name, diagnostics);
            return None;
        }
        TypedValue::Known(_) => {}
    }
    match get(config, name) {
        Ok(TypedValue::Known(v)) => Some(v),
        Ok(TypedValue::Null) => None,
        Ok(TypedValue::Unknown) => {
            unknown_value(name, diagnostics);
            None
        }
        Err(e) => {
            diagnostics.add_attribute_error(
                AttributePath::new(name),
                DiagnosticKind::Config,
                "Invalid provider configuration",
                e.to_string(),
            );
            None
        }
    }
}

fn explicit_string(config: &ConfigObject, name: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    attribute(config, name, ConfigObject::string, diagnostics).cloned()
}

fn explicit_bool(config: &ConfigObject, name: &str, diagnostics: &mut Diagnostics) -> Option<bool> {
    attribute(config, name, ConfigObject::bool, diagnostics).copied()
}

fn unknown_value(name: &str, diagnostics: &mut Diagnostics) {
    diagnostics.add_attribute_error(
        AttributePath::new(name),
        DiagnosticKind::Config,
        format!("Unknown DBaaS {}", name),
        format!(
            "The provider cannot create the DBaaS API client as there is an unknown configuration value for {}. \
             Either apply the source of the value first or set the value statically in the configuration.",
            name
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env(&[
            (ENV_API_KEY, "env-key"),
            (ENV_ORGANIZATION, "env-org"),
            (ENV_PROJECT, "env-project"),
        ])
    }

    #[test]
    fn test_environment_fallback_and_defaults() {
        let config = resolve_with(&ConfigObject::null(&PROVIDER_SCHEMA), full_env()).unwrap();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.api_key.expose_secret(), "env-key");
        assert_eq!(config.organization, "env-org");
        assert!(config.wait_for_creation);
        assert_eq!(config.project_ref().to_string(), "env-org/env-project");
    }

    #[test]
    fn test_explicit_values_override_environment() {
        let obj = ConfigObject::builder(&PROVIDER_SCHEMA)
            .set("url", "http://localhost:9000")
            .set("project", "explicit-project")
            .set("wait_for_creation", false)
            .build()
            .unwrap();
        let config = resolve_with(&obj, full_env()).unwrap();
        assert_eq!(config.url, "http://localhost:9000");
        assert_eq!(config.project, "explicit-project");
        assert_eq!(config.organization, "env-org");
        assert!(!config.wait_for_creation);
    }

    #[test]
    fn test_unparsable_wait_flag_is_false() {
        let lookup = env(&[
            (ENV_API_KEY, "k"),
            (ENV_ORGANIZATION, "o"),
            (ENV_PROJECT, "p"),
            (ENV_WAIT_FOR_CREATION, "sometimes"),
        ]);
        let config = resolve_with(&ConfigObject::null(&PROVIDER_SCHEMA), lookup).unwrap();
        assert!(!config.wait_for_creation);
    }

    #[test]
    fn test_missing_values_are_batched() {
        let err = resolve_with(&ConfigObject::null(&PROVIDER_SCHEMA), env(&[])).unwrap_err();
        let diags = err.diagnostics().unwrap();
        assert_eq!(diags.len(), 3, "got: {}", diags);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::Config));
    }

    #[test]
    fn test_empty_url_from_environment_is_missing() {
        let lookup = env(&[
            (ENV_URL, ""),
            (ENV_API_KEY, "k"),
            (ENV_ORGANIZATION, "o"),
            (ENV_PROJECT, "p"),
        ]);
        let err = resolve_with(&ConfigObject::null(&PROVIDER_SCHEMA), lookup).unwrap_err();
        assert_eq!(err.diagnostics().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_values_are_batched() {
        let obj = ConfigObject::builder(&PROVIDER_SCHEMA)
            .set("api_key", TypedValue::<String>::Unknown)
            .set("organization", TypedValue::<String>::Unknown)
            .build()
            .unwrap();
        let err = resolve_with(&obj, full_env()).unwrap_err();
        assert_eq!(err.diagnostics().unwrap().len(), 2);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = resolve_with(&ConfigObject::null(&PROVIDER_SCHEMA), full_env()).unwrap();
        assert!(!format!("{:?}", config).contains("env-key"));
    }
}
