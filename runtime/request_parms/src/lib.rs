//! Decode the parameters of an HTTP request into your own types, validate them and,
//! when something goes wrong, find out which parameters were at fault.
//!
//! # Overview
//!
//! A [`Parser`] reads parameters from one or more sources of an incoming request:
//!
//! - the URL query ([`Parser::parse_query`])
//! - the URL query and an `application/x-www-form-urlencoded` body ([`Parser::parse_query_form`])
//! - a JSON body ([`Parser::parse_json`])
//! - the URL query, then a JSON body ([`Parser::parse_query_json`])
//!
//! The parameters are decoded **into** a target you own, via pluggable
//! [decoding strategies](decode), and the target is then given a chance to reject
//! them via [`Validate`].
//!
//! When parsing fails, the [`Introspector`] walks the returned error to recover the
//! names of the parameters involved, so that you can point your API users at the fields
//! they need to fix.
//!
//! ```rust
//! use request_parms::{Parser, Validate, decode::BoxError, introspect::InvalidParameter};
//! use request_parms::request::RequestHead;
//!
//! #[derive(Default, serde::Serialize, serde::Deserialize)]
//! pub struct Page {
//!     size: u32,
//! }
//!
//! impl Validate for Page {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if self.size > 100 {
//!             return Err(InvalidParameter::new("size", "it can't be larger than 100").into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let parser = Parser::with_default_decoders();
//! let (head, _) = RequestHead::split(http::Request::get("/?size=200").body(()).unwrap());
//!
//! let mut page = Page::default();
//! let err = parser.parse_query(&head, &mut page).unwrap_err();
//! assert_eq!(err.status_code(), http::StatusCode::UNPROCESSABLE_ENTITY);
//! assert_eq!(parser.parameters_from_err(&err), vec!["size".to_string()]);
//! ```
pub use config::ParserConfig;
pub use errors::ParseError;
pub use form_values::FormValues;
pub use introspect::Introspector;
pub use parser::{Parser, ParserBuilder};
pub use validate::Validate;

mod config;
pub mod decode;
pub mod errors;
mod form_values;
pub mod introspect;
mod parser;
pub mod request;
mod validate;
