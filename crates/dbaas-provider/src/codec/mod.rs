//! Wire-tree codec.

mod object;
mod wire;

pub use object::{decode_value, encode_value, from_loose_map_at, ObjectCodec};
pub use wire::{WirePayload, WireType, WireValue};
