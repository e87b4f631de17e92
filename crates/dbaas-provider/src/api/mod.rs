//! The remote DBaaS control-plane API.

mod client;
mod error;
mod types;

use std::fmt;

use async_trait::async_trait;

use crate::model::SchemaVersion;

pub use client::{HttpDbaasClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ApiError, Result};
pub use types::*;

/// Organization and project a database belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    pub organization: String,
    pub project: String,
}

impl ProjectRef {
    pub fn new(organization: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
        }
    }

    pub fn database(&self, uuid: impl Into<String>) -> ResourceRef {
        ResourceRef {
            project: self.clone(),
            uuid: uuid.into(),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.project)
    }
}

/// A single database within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub project: ProjectRef,
    pub uuid: String,
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.uuid)
    }
}

/// Operations the reconciler needs from the remote API.
///
/// Implementations must be safe to share between tasks; the reconciler
/// never issues two calls for the same operation concurrently.
#[async_trait]
pub trait DbaasApi: Send + Sync {
    async fn create(
        &self,
        version: SchemaVersion,
        project: &ProjectRef,
        request: &CreateDatabaseRequest,
    ) -> Result<DatabaseResponse>;

    async fn get(&self, version: SchemaVersion, database: &ResourceRef)
        -> Result<DatabaseResponse>;

    async fn update(
        &self,
        version: SchemaVersion,
        database: &ResourceRef,
        request: &UpdateDatabaseRequest,
    ) -> Result<()>;

    async fn delete(&self, version: SchemaVersion, database: &ResourceRef) -> Result<()>;
}
