use serde_json::{Map, Value};

use crate::FormValues;

use super::form_deserializer::FormDeserializer;
use super::{BoxError, FormDecoder, Target};

/// The process-wide [`HtmlFormDecoder`].
///
/// It holds no state, so it's safe to share across threads.
/// [`Parser::with_default_decoders`](crate::Parser::with_default_decoders) uses it.
pub static DEFAULT_FORM_DECODER: HtmlFormDecoder = HtmlFormDecoder::new();

#[derive(Debug, Clone, Copy, Default)]
/// A [`FormDecoder`] built on top of `serde`.
///
/// # Behaviour
///
/// - Parameters that don't match any field of the target are ignored, unless the target
///   opts into `#[serde(deny_unknown_fields)]`.
/// - Fields without a matching parameter keep their current value.
/// - A field that expects a sequence (e.g. a `Vec`) collects every value for its key, in order.
///   Any other field takes the **first** value for its key.
/// - An empty value for an `Option` field is treated as a missing one.
/// - No parameters at all leave the target untouched.
/// - Decoding failures are reported as [`serde_path_to_error::Error`]s, so the name
///   of the offending parameter can be recovered via
///   [`Introspector::parameters_from_err`](crate::Introspector::parameters_from_err).
///
/// # Limitations
///
/// To preserve the current value of fields that are not mentioned in the incoming
/// parameters, the target is first serialized with [`serde_json`]. If that fails,
/// or if the target isn't serialized as a JSON object, the target is decoded from the
/// incoming parameters alone.
pub struct HtmlFormDecoder {
    _priv: (),
}

impl HtmlFormDecoder {
    /// Create a new [`HtmlFormDecoder`].
    pub const fn new() -> Self {
        Self { _priv: () }
    }
}

impl FormDecoder for HtmlFormDecoder {
    fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError> {
        if values.is_empty() {
            return Ok(());
        }
        let current = current_state(target);
        let deserializer = FormDeserializer::new(values, current.as_ref());
        *target = serde_path_to_error::deserialize(deserializer)?;
        Ok(())
    }
}

/// The current state of `target`, field by field.
fn current_state<T: Target>(target: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(target) {
        Ok(Value::Object(fields)) => Some(fields),
        Ok(_) => {
            tracing::trace!(
                "The target isn't represented as a map, its current state won't be preserved"
            );
            None
        }
        Err(e) => {
            tracing::trace!(
                error.msg = %e,
                "The target can't be serialized, its current state won't be preserved"
            );
            None
        }
    }
}
