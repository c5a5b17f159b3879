//! Errors that can happen when parsing a request into a target type.
use std::fmt;

use http::StatusCode;

use crate::decode::BoxError;
use crate::request::body::errors::{ExtractBufferedBodyError, ExtractFormBodyError};

/// The error returned by the [`Parser`](crate::Parser) operations.
///
/// Use [`ParseError::status_code`] and [`ParseError::response_body`] to build a response
/// for the caller, and [`Introspector::parameters_from_err`] to find out which
/// parameters were at fault.
///
/// A failed parse leaves the target in an unspecified, partially populated state.
/// Don't trust its contents.
///
/// [`Introspector::parameters_from_err`]: crate::Introspector::parameters_from_err
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error(transparent)]
    /// See [`NoFormDecoderConfigured`] for details.
    NoFormDecoder(#[from] NoFormDecoderConfigured),
    #[error(transparent)]
    /// The urlencoded body couldn't be read.
    FormBody(#[from] ExtractFormBodyError),
    #[error(transparent)]
    /// The JSON body couldn't be read.
    Body(#[from] ExtractBufferedBodyError),
    #[error(transparent)]
    /// See [`DecodeError`] for details.
    Decode(#[from] DecodeError),
    #[error(transparent)]
    /// The target rejected the decoded values.
    ///
    /// This is the error returned by [`Validate::validate`](crate::Validate::validate), unchanged.
    Validation(BoxError),
}

impl ParseError {
    /// The status code that best describes this failure to the caller.
    ///
    /// - `500 Internal Server Error` for a parser without a form decoder, or an unexpected
    ///   failure while reading the body
    /// - `413 Payload Too Large` if the body exceeds the configured limit
    /// - `400 Bad Request` for malformed bodies and decoding failures
    /// - `422 Unprocessable Entity` if the target rejected the decoded values
    pub fn status_code(&self) -> StatusCode {
        match self {
            ParseError::NoFormDecoder(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ParseError::FormBody(e) => e.status_code(),
            ParseError::Body(e) => e.status_code(),
            ParseError::Decode(_) => StatusCode::BAD_REQUEST,
            ParseError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Write a description of the failure that is suitable for the caller.
    ///
    /// Server-side misconfigurations are not described in detail.
    pub fn response_body<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        match self {
            ParseError::NoFormDecoder(_) => {
                write!(writer, "Something went wrong while processing the request.")
            }
            ParseError::FormBody(e) => e.response_body(writer),
            ParseError::Body(e) => e.response_body(writer),
            ParseError::Decode(e) => write!(writer, "{e}"),
            ParseError::Validation(e) => write!(writer, "Invalid request parameters. {e}"),
        }
    }

    /// The error that caused this failure.
    ///
    /// Unlike [`std::error::Error::source`], it doesn't skip over the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + 'static) {
        match self {
            ParseError::NoFormDecoder(e) => e,
            ParseError::FormBody(e) => e,
            ParseError::Body(e) => e,
            ParseError::Decode(e) => e,
            ParseError::Validation(e) => &**e,
        }
    }

    /// Returns the error produced by [`Validate::validate`](crate::Validate::validate),
    /// if that's why parsing failed.
    pub fn into_validation_error(self) -> Result<BoxError, Self> {
        match self {
            ParseError::Validation(e) => Ok(e),
            other => Err(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("No form decoder has been configured on this parser.")]
#[non_exhaustive]
/// The operation needs a [`FormDecoder`](crate::decode::FormDecoder), but the
/// [`Parser`](crate::Parser) was built without one.
///
/// This is a wiring mistake: retrying won't help.
pub struct NoFormDecoderConfigured;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where the parameters that failed to decode came from.
pub enum DecodeOrigin {
    /// The URL query.
    Query,
    /// The URL query merged with an urlencoded body.
    Form,
    /// A JSON body.
    JsonBody,
}

impl fmt::Display for DecodeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeOrigin::Query => write!(f, "query parameters"),
            DecodeOrigin::Form => write!(f, "form parameters"),
            DecodeOrigin::JsonBody => write!(f, "JSON body"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to decode the {origin}.\n{source}")]
#[non_exhaustive]
/// The configured decoding strategy could not map the request parameters onto the target.
///
/// The strategy's own error is available via [`std::error::Error::source`].
pub struct DecodeError {
    /// Where the parameters came from.
    pub origin: DecodeOrigin,
    #[source]
    pub(crate) source: BoxError,
}

impl DecodeError {
    pub(crate) fn new(origin: DecodeOrigin, source: BoxError) -> Self {
        Self { origin, source }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{DecodeError, DecodeOrigin, NoFormDecoderConfigured, ParseError};
    use crate::introspect::InvalidParameter;

    #[test]
    fn decode_error_keeps_the_strategy_error_as_source() {
        let e = ParseError::from(DecodeError::new(
            DecodeOrigin::Query,
            "invalid digit found in string".into(),
        ));
        insta::assert_snapshot!(e, @r###"
        Failed to decode the query parameters.
        invalid digit found in string
        "###);
        assert_eq!(e.status_code(), http::StatusCode::BAD_REQUEST);
        let source = e.inner().source().unwrap();
        assert_eq!(source.to_string(), "invalid digit found in string");
    }

    #[test]
    fn validation_errors_are_returned_unchanged() {
        let e = ParseError::Validation(InvalidParameter::new("i", "too big").into());
        assert_eq!(e.status_code(), http::StatusCode::UNPROCESSABLE_ENTITY);
        insta::assert_snapshot!(e, @"Invalid value for `i`: too big");

        let inner = e.into_validation_error().unwrap();
        assert!(inner.downcast_ref::<InvalidParameter>().is_some());
    }

    #[test]
    fn configuration_errors_are_not_leaked_to_callers() {
        let e = ParseError::from(NoFormDecoderConfigured);
        assert_eq!(e.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = String::new();
        e.response_body(&mut body).unwrap();
        insta::assert_snapshot!(body, @"Something went wrong while processing the request.");
    }
}
