//! Drives database create, read, update and delete calls against the API.
//!
//! Operations never return `Err`. Every failure ends up as a diagnostic in
//! the returned outcome, together with whatever state is known at that point:
//!
//! ```text
//! Pending -> InFlight -> Ready
//!               |  ^
//!               v  |
//!            Polling{n} -> Failed
//! ```

mod retry;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::api::{ApiError, DbaasApi, ProjectRef, ResourceRef};
use crate::config::ProviderConfig;
use crate::diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics};
use crate::model::{
    create_request, password_of, response_to_state, update_request, uuid_of, SchemaVersion,
};
use crate::validation::validate_database;
use crate::value::{CodecError, ConfigObject, TypedValue};

pub use retry::{CancellationFlag, FailureBudget, PollSettings};

/// Where an operation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Pending,
    InFlight,
    Polling { iteration: u32 },
    Ready,
    Failed,
}

/// Result of a create, read or update.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// State to persist. `None` means the previously persisted state stays.
    pub state: Option<ConfigObject>,
    pub diagnostics: Diagnostics,
    pub phase: OperationPhase,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !self.diagnostics.has_error()
    }
}

/// Result of a delete.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub diagnostics: Diagnostics,
    /// The persisted state should be dropped.
    pub remove_state: bool,
}

/// Target project and behaviour shared by all operations of a reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerContext {
    pub project: ProjectRef,
    pub wait_for_creation: bool,
    pub version: SchemaVersion,
}

impl ReconcilerContext {
    pub fn new(project: ProjectRef, version: SchemaVersion) -> Self {
        Self {
            project,
            wait_for_creation: true,
            version,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            project: config.project_ref(),
            wait_for_creation: config.wait_for_creation,
            version: config.schema_version,
        }
    }

    pub fn with_wait_for_creation(mut self, wait: bool) -> Self {
        self.wait_for_creation = wait;
        self
    }
}

pub struct Reconciler {
    api: Arc<dyn DbaasApi>,
    context: ReconcilerContext,
    settings: PollSettings,
    cancellation: CancellationFlag,
}

impl Reconciler {
    pub fn new(api: Arc<dyn DbaasApi>, context: ReconcilerContext) -> Self {
        Self {
            api,
            context,
            settings: PollSettings::default(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn context(&self) -> &ReconcilerContext {
        &self.context
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// A handle that cancels the operation currently running, if any.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Creates the planned database.
    ///
    /// The create call itself is not retried. When waiting for creation is
    /// enabled, the database is read every `create_interval` until its status
    /// is ready or the time budget runs out.
    pub async fn create(&self, plan: &ConfigObject) -> Outcome {
        let span = info_span!(
            "reconciler.create",
            version = %self.context.version,
            project = %self.context.project,
        );
        self.run_create(plan).instrument(span).await
    }

    /// Refreshes a persisted database. Failed reads are retried immediately.
    pub async fn read(&self, previous: &ConfigObject) -> Outcome {
        let span = info_span!(
            "reconciler.read",
            version = %self.context.version,
            project = %self.context.project,
        );
        self.run_read(previous).instrument(span).await
    }

    /// Applies a plan to an existing database, then reads it back for a fixed
    /// number of iterations while the change propagates.
    ///
    /// Every successful propagation read replaces the result. Failed reads
    /// below the failure limit keep the previous result.
    pub async fn update(&self, plan: &ConfigObject, previous: &ConfigObject) -> Outcome {
        let span = info_span!(
            "reconciler.update",
            version = %self.context.version,
            project = %self.context.project,
        );
        self.run_update(plan, previous).instrument(span).await
    }

    /// Deletes a persisted database. The delete call is not retried.
    pub async fn delete(&self, previous: &ConfigObject) -> DeleteOutcome {
        let span = info_span!(
            "reconciler.delete",
            version = %self.context.version,
            project = %self.context.project,
        );
        self.run_delete(previous).instrument(span).await
    }

    async fn run_create(&self, plan: &ConfigObject) -> Outcome {
        let mut op = Operation::new("create");
        let version = self.context.version;
        let label = DatabaseLabel::planned(&self.context.project, plan);

        let diagnostics = self.check_plan(plan);
        if diagnostics.has_error() {
            return op.fail(None, diagnostics);
        }

        let request = match create_request(plan) {
            Ok(request) => request,
            Err(e) => return op.fail(None, codec_failure("create", &label, e)),
        };
        let password = match password_of(plan) {
            Ok(password) => password,
            Err(e) => return op.fail(None, codec_failure("create", &label, e)),
        };
        debug!(request = %request.redacted_json(), "Creating database");

        op.advance(OperationPhase::InFlight);
        let response = match self.api.create(version, &self.context.project, &request).await {
            Ok(response) => response,
            Err(e) => {
                return op.fail(
                    None,
                    Diagnostic::error(
                        DiagnosticKind::Api,
                        "Error creating database",
                        format!(
                            "Could not create database {}, unexpected error: {}",
                            label, e
                        ),
                    ),
                )
            }
        };

        let resource = self.context.project.database(&response.uuid);
        let mut state = match response_to_state(&response, version, &password) {
            Ok(state) => state,
            Err(e) => return op.fail(None, codec_failure("create", &resource, e)),
        };
        info!(uuid = %response.uuid, status = %response.status, "Database created");
        let mut ready = response.is_ready();

        if !self.context.wait_for_creation {
            return op.succeed(state);
        }

        let limit = self.settings.create_poll_limit();
        let mut polls = 0;
        let mut failures = FailureBudget::new(self.settings.max_consecutive_failures);
        while !ready {
            if polls == limit {
                return op.fail(
                    Some(state),
                    Diagnostic::error(
                        DiagnosticKind::RetryLimitExceeded,
                        "RetryLimit reached during wait_for_creation",
                        format!(
                            "The retry limit of {}s was reached while waiting for creation of database {}",
                            self.settings.create_timeout.as_secs(),
                            resource
                        ),
                    ),
                );
            }

            op.advance(OperationPhase::Polling {
                iteration: polls + 1,
            });
            if let Err(diagnostic) = self
                .pause(self.settings.create_interval, "wait for creation", &resource)
                .await
            {
                return op.fail(Some(state), diagnostic);
            }

            match self.api.get(version, &resource).await {
                Ok(response) => {
                    failures.reset();
                    state = match response_to_state(&response, version, &password) {
                        Ok(state) => state,
                        Err(e) => {
                            return op.fail(
                                Some(state),
                                codec_failure("wait for creation", &resource, e),
                            )
                        }
                    };
                    ready = response.is_ready();
                    polls += 1;
                    debug!(status = %response.status, poll = polls, "Current creation state");
                }
                Err(e) => {
                    if failures.record_failure() {
                        return op.fail(
                            Some(state),
                            read_exhausted("wait for creation", &resource, &failures, &e),
                        );
                    }
                    warn!(
                        error = %e,
                        consecutive = failures.consecutive(),
                        "Error reading database during wait, retrying"
                    );
                }
            }
        }

        op.succeed(state)
    }

    async fn run_read(&self, previous: &ConfigObject) -> Outcome {
        let mut op = Operation::new("read");
        let version = self.context.version;

        let resource = match self.resource_of(previous, "read") {
            Ok(resource) => resource,
            Err(diagnostic) => return op.fail(None, diagnostic),
        };
        let password = match password_of(previous) {
            Ok(password) => password,
            Err(e) => return op.fail(None, codec_failure("read", &resource, e)),
        };

        op.advance(OperationPhase::InFlight);
        let mut failures = FailureBudget::new(self.settings.max_consecutive_failures);
        let response = loop {
            if let Err(diagnostic) = self.ensure_active("read", &resource) {
                return op.fail(None, diagnostic);
            }
            match self.api.get(version, &resource).await {
                Ok(response) => {
                    failures.reset();
                    break response;
                }
                Err(e) => {
                    if failures.record_failure() {
                        return op.fail(None, read_exhausted("read", &resource, &failures, &e));
                    }
                    warn!(
                        error = %e,
                        consecutive = failures.consecutive(),
                        "Error reading database, retrying"
                    );
                }
            }
        };

        match response_to_state(&response, version, &password) {
            Ok(state) => {
                debug!(status = %response.status, "Read database");
                op.succeed(state)
            }
            Err(e) => op.fail(None, codec_failure("read", &resource, e)),
        }
    }

    async fn run_update(&self, plan: &ConfigObject, previous: &ConfigObject) -> Outcome {
        let mut op = Operation::new("update");
        let version = self.context.version;

        let resource = match self.resource_of(previous, "update") {
            Ok(resource) => resource,
            Err(diagnostic) => return op.fail(None, diagnostic),
        };
        let diagnostics = self.check_plan(plan);
        if diagnostics.has_error() {
            return op.fail(None, diagnostics);
        }

        let request = match update_request(plan) {
            Ok(request) => request,
            Err(e) => return op.fail(None, codec_failure("update", &resource, e)),
        };
        let password = match password_of(plan) {
            Ok(password) => password,
            Err(e) => return op.fail(None, codec_failure("update", &resource, e)),
        };
        debug!(request = %request.redacted_json(), "Updating database");

        op.advance(OperationPhase::InFlight);
        if let Err(e) = self.api.update(version, &resource, &request).await {
            return op.fail(
                None,
                Diagnostic::error(
                    DiagnosticKind::Api,
                    "Error updating database",
                    format!("Could not update database {}, unexpected error: {}", resource, e),
                ),
            );
        }

        let mut latest: Option<ConfigObject> = None;
        let mut failures = FailureBudget::new(self.settings.max_consecutive_failures);
        for iteration in 1..=self.settings.update_iterations {
            op.advance(OperationPhase::Polling { iteration });
            if let Err(diagnostic) = self
                .pause(self.settings.update_delay, "update propagation", &resource)
                .await
            {
                return op.fail(latest, diagnostic);
            }

            match self.api.get(version, &resource).await {
                Ok(response) => {
                    failures.reset();
                    match response_to_state(&response, version, &password) {
                        Ok(state) => latest = Some(state),
                        Err(e) => {
                            return op.fail(latest, codec_failure("update propagation", &resource, e))
                        }
                    }
                    debug!(status = %response.status, iteration, "Updated state");
                }
                Err(e) => {
                    if failures.record_failure() {
                        return op.fail(
                            latest,
                            read_exhausted("update propagation", &resource, &failures, &e),
                        );
                    }
                    warn!(
                        error = %e,
                        consecutive = failures.consecutive(),
                        "Error reading updated database, retrying"
                    );
                }
            }
        }

        match latest {
            Some(state) => op.succeed(state),
            None => op.fail(
                None,
                Diagnostic::error(
                    DiagnosticKind::Api,
                    "Error reading updated database",
                    format!(
                        "No propagation read of database {} succeeded after the update",
                        resource
                    ),
                ),
            ),
        }
    }

    async fn run_delete(&self, previous: &ConfigObject) -> DeleteOutcome {
        let resource = match self.resource_of(previous, "delete") {
            Ok(resource) => resource,
            Err(diagnostic) => {
                error!(%diagnostic, "delete failed");
                return DeleteOutcome {
                    diagnostics: diagnostic.into(),
                    remove_state: false,
                };
            }
        };

        match self.api.delete(self.context.version, &resource).await {
            Ok(()) => {
                info!(database = %resource, "Database deleted");
                DeleteOutcome {
                    diagnostics: Diagnostics::new(),
                    remove_state: true,
                }
            }
            Err(e) => {
                let diagnostic = Diagnostic::error(
                    DiagnosticKind::Api,
                    "Unable to Delete Database",
                    format!("Could not delete database {}: {}", resource, e),
                );
                error!(%diagnostic, "delete failed");
                DeleteOutcome {
                    diagnostics: diagnostic.into(),
                    remove_state: false,
                }
            }
        }
    }

    /// Validates a plan against the configured revision.
    fn check_plan(&self, plan: &ConfigObject) -> Diagnostics {
        if let Err(diagnostic) = self.check_revision(plan, "plan") {
            return diagnostic.into();
        }
        validate_database(plan)
    }

    fn check_revision(&self, object: &ConfigObject, what: &str) -> Result<(), Diagnostic> {
        let expected = &self.context.version.schemas().database;
        if object.schema().as_ref() != expected.as_ref() {
            return Err(Diagnostic::error(
                DiagnosticKind::Codec,
                "Schema revision mismatch",
                format!(
                    "The {} does not use the {} database schema configured for this provider",
                    what, self.context.version
                ),
            ));
        }
        Ok(())
    }

    fn resource_of(&self, state: &ConfigObject, stage: &str) -> Result<ResourceRef, Diagnostic> {
        self.check_revision(state, "persisted state")?;
        match uuid_of(state) {
            Ok(Some(uuid)) if !uuid.is_empty() => Ok(self.context.project.database(uuid)),
            Ok(_) => Err(Diagnostic::error(
                DiagnosticKind::Validation,
                "Missing database UUID",
                format!(
                    "Cannot {} a database in {} without a known UUID in the persisted state",
                    stage, self.context.project
                ),
            )
            .with_path(AttributePath::new("uuid"))),
            Err(e) => Err(codec_failure(stage, &self.context.project, e)),
        }
    }

    fn ensure_active(&self, stage: &str, resource: &dyn fmt::Display) -> Result<(), Diagnostic> {
        if self.cancellation.is_cancelled() {
            return Err(Diagnostic::error(
                DiagnosticKind::Cancelled,
                "Operation cancelled",
                format!("The {} of database {} was cancelled", stage, resource),
            ));
        }
        Ok(())
    }

    /// Sleeps between polls, checking for cancellation on both sides.
    async fn pause(
        &self,
        delay: Duration,
        stage: &str,
        resource: &dyn fmt::Display,
    ) -> Result<(), Diagnostic> {
        self.ensure_active(stage, resource)?;
        tokio::time::sleep(delay).await;
        self.ensure_active(stage, resource)
    }
}

/// Phase tracking for one running operation.
struct Operation {
    name: &'static str,
    phase: OperationPhase,
}

impl Operation {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            phase: OperationPhase::Pending,
        }
    }

    fn advance(&mut self, next: OperationPhase) {
        debug!(operation = self.name, from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }

    fn succeed(mut self, state: ConfigObject) -> Outcome {
        self.advance(OperationPhase::Ready);
        Outcome {
            state: Some(state),
            diagnostics: Diagnostics::new(),
            phase: self.phase,
        }
    }

    fn fail(mut self, state: Option<ConfigObject>, diagnostics: impl Into<Diagnostics>) -> Outcome {
        let diagnostics = diagnostics.into();
        for diagnostic in diagnostics.errors() {
            error!(operation = self.name, %diagnostic, "operation failed");
        }
        self.advance(OperationPhase::Failed);
        Outcome {
            state,
            diagnostics,
            phase: self.phase,
        }
    }
}

/// Names a database that may not have a UUID yet.
struct DatabaseLabel {
    project: ProjectRef,
    name: String,
}

impl DatabaseLabel {
    fn planned(project: &ProjectRef, plan: &ConfigObject) -> Self {
        let name = match plan.string("name") {
            Ok(TypedValue::Known(name)) => name.clone(),
            _ => "<unnamed>".to_string(),
        };
        Self {
            project: project.clone(),
            name,
        }
    }
}

impl fmt::Display for DatabaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' in {}", self.name, self.project)
    }
}

fn codec_failure(stage: &str, resource: &dyn fmt::Display, error: CodecError) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::Codec,
        format!("Unable to map database during {}", stage),
        format!("Database {}: {}", resource, error),
    )
}

fn read_exhausted(
    stage: &str,
    resource: &ResourceRef,
    failures: &FailureBudget,
    error: &ApiError,
) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::TransientExhausted,
        format!("Unable to read database during {}", stage),
        format!(
            "Could not read database {} after {} consecutive failures, unexpected error: {}",
            resource,
            failures.consecutive(),
            error
        ),
    )
}
