use std::collections::{BTreeMap, HashMap};

use crate::decode::BoxError;

/// Types that can check their own state after being decoded.
///
/// The [`Parser`](crate::Parser) invokes [`Validate::validate`] once per call,
/// after every decoding step has succeeded.
/// The error you return is handed back to the caller **as is**, wrapped in
/// [`ParseError::Validation`](crate::ParseError::Validation): you control its shape,
/// including whether it points at the offending parameters (see [`InvalidParameter`]).
///
/// Types without validation rules can rely on the default implementation:
///
/// ```rust
/// use request_parms::Validate;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// pub struct Search {
///     q: String,
/// }
///
/// impl Validate for Search {}
/// ```
///
/// [`InvalidParameter`]: crate::introspect::InvalidParameter
pub trait Validate {
    /// Check that `self` holds acceptable values.
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<K, V, S> Validate for HashMap<K, V, S> {}

impl<K, V> Validate for BTreeMap<K, V> {}

impl Validate for serde_json::Value {}
