//! Codec for fields stored on the wire as a `[name, arguments]` pair.
//!
//! `BUILD_MANAGER` and every `DISTRIBUTED_STORAGE_CONFIG` entry use this
//! shape. In memory the pair becomes a named structure; on write it is
//! emitted as the same two-element sequence again.

use crate::error::{ConstructError, ConstructResult};
use crate::value::{Mapping, Value};

/// Split a tuple-encoded value into its name and argument mapping.
pub fn decode_tuple<'a>(
    field: &str,
    value: &'a Value,
) -> ConstructResult<(&'a str, &'a Mapping)> {
    let malformed = |reason: String| ConstructError::malformed_tuple(field, reason);
    let items = value
        .as_list()
        .ok_or_else(|| malformed(format!("expected a sequence, found {}", value.kind())))?;
    match items {
        [name, args] => {
            let name = name
                .as_str()
                .ok_or_else(|| malformed(format!("name must be a string, found {}", name.kind())))?;
            let args = args.as_map().ok_or_else(|| {
                malformed(format!("arguments must be an object, found {}", args.kind()))
            })?;
            Ok((name, args))
        }
        _ => Err(ConstructError::malformed_tuple(
            field,
            format!("expected 2 elements, found {}", items.len()),
        )),
    }
}

/// Build the two-element wire form.
pub fn encode_tuple(name: &str, args: Mapping) -> Value {
    Value::List(vec![Value::Text(name.to_string()), Value::Map(args)])
}
