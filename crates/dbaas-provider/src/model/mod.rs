//! The database resource model and its mapping onto the remote API.

mod request;
mod response;
mod schema;

pub use request::{create_request, update_request};
pub use response::response_to_state;
pub use schema::{SchemaSet, SchemaVersion, V1, V2};

use crate::value::{ConfigObject, Result, TypedValue};

/// The UUID of a database object, when known.
pub fn uuid_of(database: &ConfigObject) -> Result<Option<String>> {
    Ok(database.string("uuid")?.as_known().cloned())
}

/// The status of a database object, when known.
pub fn status_of(database: &ConfigObject) -> Result<Option<String>> {
    Ok(database.string("status")?.as_known().cloned())
}

/// The admin password of a database object.
///
/// A Null or Unknown application config yields a Null password.
pub fn password_of(database: &ConfigObject) -> Result<TypedValue<String>> {
    let application = database.object("application_config")?;
    if !application.is_known() {
        return Ok(TypedValue::Null);
    }
    Ok(application.string("password")?.clone())
}
