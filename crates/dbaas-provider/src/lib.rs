pub mod api;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod plan;
pub mod reconciler;
pub mod snapshot;
pub mod validation;
pub mod value;

pub use api::{ApiError, DbaasApi, HttpDbaasClient, ProjectRef, ResourceRef};
pub use codec::{ObjectCodec, WireType, WireValue};
pub use config::{resolve, resolve_with, ProviderConfig};
pub use diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ConfigError, ProviderError, Result};
pub use logging::{init_logging, try_init_logging, LogFormat};
pub use model::SchemaVersion;
pub use reconciler::{
    CancellationFlag, DeleteOutcome, OperationPhase, Outcome, PollSettings, Reconciler,
    ReconcilerContext,
};
pub use value::{AttrType, CodecError, ConfigObject, ListValue, ObjectSchema, TypedValue, Value};
