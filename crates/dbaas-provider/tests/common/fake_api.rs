//! A scripted `DbaasApi` that records every call.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use dbaas_provider::api::{
    self, ApiError, CreateDatabaseRequest, DatabaseResponse, DbaasApi, ProjectRef, ResourceRef,
    UpdateDatabaseRequest,
};
use dbaas_provider::SchemaVersion;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(DatabaseResponse),
    Fail,
}

impl Reply {
    fn into_result(self) -> api::Result<DatabaseResponse> {
        match self {
            Reply::Ok(response) => Ok(response),
            Reply::Fail => Err(transient_error()),
        }
    }
}

/// A recorded call.
#[derive(Debug, Clone)]
pub enum Call {
    Create {
        version: SchemaVersion,
        request: CreateDatabaseRequest,
    },
    Get {
        version: SchemaVersion,
        uuid: String,
    },
    Update {
        version: SchemaVersion,
        uuid: String,
        request: UpdateDatabaseRequest,
    },
    Delete {
        version: SchemaVersion,
        uuid: String,
    },
}

fn transient_error() -> ApiError {
    ApiError::Http {
        message: "connection reset by peer".to_string(),
        timeout: false,
    }
}

/// Answers get calls from a queue, then repeats the fallback forever.
pub struct ScriptedApi {
    create: Mutex<Option<Reply>>,
    gets: Mutex<VecDeque<Reply>>,
    fallback_get: Reply,
    fail_update: bool,
    fail_delete: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new(create: Reply, fallback_get: Reply) -> Self {
        Self {
            create: Mutex::new(Some(create)),
            gets: Mutex::new(VecDeque::new()),
            fallback_get,
            fail_update: false,
            fail_delete: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An API whose reads always return `response`.
    pub fn returning(response: DatabaseResponse) -> Self {
        Self::new(Reply::Ok(response.clone()), Reply::Ok(response))
    }

    pub fn with_gets(self, gets: impl IntoIterator<Item = Reply>) -> Self {
        *self.gets.lock().unwrap() = gets.into_iter().collect();
        self
    }

    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get { .. }))
            .count()
    }

    pub fn last_update(&self) -> Option<UpdateDatabaseRequest> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Update { request, .. } => Some(request),
            _ => None,
        })
    }

    pub fn last_create(&self) -> Option<CreateDatabaseRequest> {
        self.calls().into_iter().rev().find_map(|c| match c {
            Call::Create { request, .. } => Some(request),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DbaasApi for ScriptedApi {
    async fn create(
        &self,
        version: SchemaVersion,
        _project: &ProjectRef,
        request: &CreateDatabaseRequest,
    ) -> api::Result<DatabaseResponse> {
        self.record(Call::Create {
            version,
            request: request.clone(),
        });
        let reply = self.create.lock().unwrap().take().unwrap_or(Reply::Fail);
        reply.into_result()
    }

    async fn get(&self, version: SchemaVersion, database: &ResourceRef) -> api::Result<DatabaseResponse> {
        self.record(Call::Get {
            version,
            uuid: database.uuid.clone(),
        });
        let reply = self
            .gets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback_get.clone());
        reply.into_result()
    }

    async fn update(
        &self,
        version: SchemaVersion,
        database: &ResourceRef,
        request: &UpdateDatabaseRequest,
    ) -> api::Result<()> {
        self.record(Call::Update {
            version,
            uuid: database.uuid.clone(),
            request: request.clone(),
        });
        if self.fail_update {
            return Err(ApiError::Status {
                status: 409,
                body: "database is being modified".to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, version: SchemaVersion, database: &ResourceRef) -> api::Result<()> {
        self.record(Call::Delete {
            version,
            uuid: database.uuid.clone(),
        });
        if self.fail_delete {
            return Err(transient_error());
        }
        Ok(())
    }
}
