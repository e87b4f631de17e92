//! HTTP implementation of [`DbaasApi`].

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::error::{ApiError, Result};
use super::types::{CreateDatabaseRequest, DatabaseResponse, UpdateDatabaseRequest};
use super::{DbaasApi, ProjectRef, ResourceRef};
use crate::config::ProviderConfig;
use crate::model::SchemaVersion;

/// Default connect timeout for API requests.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for API requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum length of an error body kept in errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const API_KEY_HEADER: &str = "X-API-Key";

fn sanitize_error_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Client for the DBaaS REST API.
#[derive(Debug, Clone)]
pub struct HttpDbaasClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl HttpDbaasClient {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self> {
        Self::with_timeouts(
            base_url,
            api_key,
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        api_key: SecretString,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(base_url.to_string()));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(concat!("dbaas-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                timeout: false,
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(&config.url, config.api_key.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn databases_url(&self, version: SchemaVersion, project: &ProjectRef) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([
                version.path_segment(),
                "organizations",
                project.organization.as_str(),
                "projects",
                project.project.as_str(),
                "databases",
            ]);
        Ok(url)
    }

    fn database_url(&self, version: SchemaVersion, database: &ResourceRef) -> Result<Url> {
        let mut url = self.databases_url(version, &database.project)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.base_url.to_string()))?
            .push(&database.uuid);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    async fn check(response: Response, what: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        let body = sanitize_error_body(&body);
        warn!("DBaaS API returned {} for {}: {}", status, what, body);
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DbaasApi for HttpDbaasClient {
    async fn create(
        &self,
        version: SchemaVersion,
        project: &ProjectRef,
        request: &CreateDatabaseRequest,
    ) -> Result<DatabaseResponse> {
        let url = self.databases_url(version, project)?;
        debug!("POST {} {}", url, request.redacted_json());

        let response = self
            .authorized(self.client.post(url))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response, &request.name).await?;
        Self::json(response).await
    }

    async fn get(&self, version: SchemaVersion, database: &ResourceRef) -> Result<DatabaseResponse> {
        let url = self.database_url(version, database)?;
        debug!("GET {}", url);

        let response = self.authorized(self.client.get(url)).send().await?;
        let response = Self::check(response, &database.uuid).await?;
        Self::json(response).await
    }

    async fn update(
        &self,
        version: SchemaVersion,
        database: &ResourceRef,
        request: &UpdateDatabaseRequest,
    ) -> Result<()> {
        let url = self.database_url(version, database)?;
        debug!("PUT {} {}", url, request.redacted_json());

        let response = self
            .authorized(self.client.put(url))
            .json(request)
            .send()
            .await?;
        Self::check(response, &database.uuid).await?;
        Ok(())
    }

    async fn delete(&self, version: SchemaVersion, database: &ResourceRef) -> Result<()> {
        let url = self.database_url(version, database)?;
        debug!("DELETE {}", url);

        let response = self.authorized(self.client.delete(url)).send().await?;
        Self::check(response, &database.uuid).await?;
        Ok(())
    }
}
