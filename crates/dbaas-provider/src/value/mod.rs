//! Tri-state typed values and schema-bound objects.

mod dynamic;
mod error;
mod object;
mod typed;
mod types;

pub use dynamic::{ListValue, Value};
pub use error::{CodecError, Result};
pub use object::{check_attributes, ConfigObject, ObjectBuilder};
pub use typed::{TypedValue, ValueState};
pub use types::{AttrType, AttributeMode, FieldSchema, ObjectSchema, StaticDefault};
