//! Extract raw parameters from incoming HTTP requests.
//!
//! Nothing in this module knows about your target types: it turns the URL query
//! and the request body into [`FormValues`](crate::FormValues) or raw bytes.
//! Decoding those into a struct is the job of the [`Parser`](crate::Parser).
pub use request_head::RequestHead;

pub mod body;
pub mod query;
mod request_head;
