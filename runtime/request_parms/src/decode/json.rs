use serde::de::{Error as _, Unexpected};
use serde_json::{Map, Value};

use super::{BoxError, JsonUnmarshaler, Target};

#[derive(Debug, Clone, Copy, Default)]
/// The default [`JsonUnmarshaler`], built on top of [`serde_json`].
///
/// # Behaviour
///
/// - A top-level object is merged, recursively, onto the current state of the target:
///   keys that are absent from the document leave the corresponding fields untouched.
/// - A top-level `null` leaves the target untouched.
/// - Any other top-level value (string, number, array, ...) is rejected if the target
///   is represented as a JSON object.
///   Targets with a different representation are decoded from the document as-is.
/// - Type mismatches are reported as [`serde_path_to_error::Error`]s, so the name of the
///   offending field can be recovered via
///   [`Introspector::parameters_from_err`](crate::Introspector::parameters_from_err).
///   Syntax errors are reported as plain [`serde_json::Error`]s.
///
/// # Limitations
///
/// If the target can't be serialized, its current state is lost: it's decoded
/// from the document alone.
pub struct SerdeJsonUnmarshaler;

impl JsonUnmarshaler for SerdeJsonUnmarshaler {
    fn unmarshal<T: Target>(&self, data: &[u8], target: &mut T) -> Result<(), BoxError> {
        let document: Value = serde_json::from_slice(data)?;
        let merged = match (document, current_state(target)) {
            (Value::Null, _) => return Ok(()),
            (Value::Object(patch), Some(Value::Object(mut current))) => {
                merge(&mut current, patch);
                Value::Object(current)
            }
            (Value::Object(patch), _) => Value::Object(patch),
            (other, Some(Value::Object(_))) => {
                return Err(
                    serde_json::Error::invalid_type(unexpected(&other), &"a JSON object").into(),
                );
            }
            (other, _) => other,
        };
        *target = serde_path_to_error::deserialize(merged)?;
        Ok(())
    }
}

/// The current state of `target`, if it can be serialized.
fn current_state<T: Target>(target: &T) -> Option<Value> {
    match serde_json::to_value(target) {
        Ok(current) => Some(current),
        Err(e) => {
            tracing::trace!(
                error.msg = %e,
                "The target can't be serialized, its current state won't be preserved"
            );
            None
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

/// Apply `patch` on top of `current`.
///
/// Nested objects are merged key by key, every other value is overwritten.
fn merge(current: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match current.get_mut(&key) {
            Some(Value::Object(existing)) if value.is_object() => {
                if let Value::Object(nested) = value {
                    merge(existing, nested);
                }
            }
            _ => {
                current.insert(key, value);
            }
        }
    }
}
