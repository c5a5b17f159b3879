//! Pluggable strategies to decode request parameters into a target type.
//!
//! The [`Parser`](crate::Parser) doesn't know how to map parameters onto your types:
//! it delegates to a [`FormDecoder`] for query strings and urlencoded bodies, and to a
//! [`JsonUnmarshaler`] for JSON bodies.
//!
//! Both strategies decode **into** an existing value: parameters that are absent from the
//! source leave the corresponding fields untouched. That's what allows
//! [`Parser::parse_query_json`](crate::Parser::parse_query_json) to apply the query first and
//! let the body override it.
//!
//! This crate ships with serde-based implementations of both:
//! [`HtmlFormDecoder`] and [`SerdeJsonUnmarshaler`].
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::FormValues;

pub use html_form::{DEFAULT_FORM_DECODER, HtmlFormDecoder};
pub use json::SerdeJsonUnmarshaler;

mod form_deserializer;
mod html_form;
mod json;

/// A type-erased error returned by decoding strategies and validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type that request parameters can be decoded into.
///
/// It's implemented for every type that can be both serialized and deserialized with `serde`.
/// Use `serde` attributes (e.g. `#[serde(rename = ":q")]`) to control the external name
/// of each field.
///
/// Serialization is needed to merge the incoming parameters with the current state of the
/// target.
pub trait Target: Serialize + DeserializeOwned {}

impl<T> Target for T where T: Serialize + DeserializeOwned {}

/// Decode multi-valued form parameters (from a query string or an urlencoded body) into a target.
///
/// Implementations must leave fields untouched when the corresponding parameter is absent
/// from `values`.
///
/// If you share a [`Parser`](crate::Parser) across threads, your decoder must be safe to invoke
/// concurrently.
pub trait FormDecoder {
    /// Decode `values` into `target`.
    ///
    /// The returned error is wrapped in a [`DecodeError`](crate::errors::DecodeError) by the parser.
    fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError>;
}

/// Unmarshal a JSON document into a target.
///
/// Implementations must leave fields untouched when the corresponding key is absent
/// from the document.
pub trait JsonUnmarshaler {
    /// Unmarshal `data` into `target`.
    ///
    /// `data` is never empty: the parser skips this step for empty bodies.
    fn unmarshal<T: Target>(&self, data: &[u8], target: &mut T) -> Result<(), BoxError>;
}

impl<D: FormDecoder> FormDecoder for &D {
    fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError> {
        (**self).decode(target, values)
    }
}

impl<D: FormDecoder> FormDecoder for Box<D> {
    fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError> {
        (**self).decode(target, values)
    }
}

impl<D: FormDecoder> FormDecoder for Arc<D> {
    fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError> {
        (**self).decode(target, values)
    }
}

impl<U: JsonUnmarshaler> JsonUnmarshaler for &U {
    fn unmarshal<T: Target>(&self, data: &[u8], target: &mut T) -> Result<(), BoxError> {
        (**self).unmarshal(data, target)
    }
}

impl<U: JsonUnmarshaler> JsonUnmarshaler for Box<U> {
    fn unmarshal<T: Target>(&self, data: &[u8], target: &mut T) -> Result<(), BoxError> {
        (**self).unmarshal(data, target)
    }
}

impl<U: JsonUnmarshaler> JsonUnmarshaler for Arc<U> {
    fn unmarshal<T: Target>(&self, data: &[u8], target: &mut T) -> Result<(), BoxError> {
        (**self).unmarshal(data, target)
    }
}
