//! Read the body of incoming requests.
//!
//! # Overview
//!
//! 1. [`BufferedBody`] drives an [`http_body::Body`] to completion and buffers it in memory,
//!    while enforcing a [`BodySizeLimit`] to avoid resource exhaustion attacks.
//! 2. [`form_values`] builds on top of [`BufferedBody`] to read the parameters
//!    of an `application/x-www-form-urlencoded` body.
//!
//! JSON bodies are handed over, as bytes, to the [`JsonUnmarshaler`](crate::decode::JsonUnmarshaler)
//! configured on the [`Parser`](crate::Parser).

pub use buffered_body::BufferedBody;
pub use limit::BodySizeLimit;
pub use url_encoded::form_values;

mod buffered_body;
pub mod errors;
mod limit;
mod url_encoded;
