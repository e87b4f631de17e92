//! Shared helpers for dbaas-provider integration tests.
//!
//! - `builders` creates plans and API responses for both schema revisions
//! - `fake_api` is a scripted, call-recording `DbaasApi`

pub mod builders;
pub mod fake_api;

#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use fake_api::{Call, Reply, ScriptedApi};
