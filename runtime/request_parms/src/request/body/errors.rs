//! Errors that can occur while reading information from the request body.
use http::StatusCode;
use ubyte::ByteUnit;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`BufferedBody::extract`] when the body can't be buffered.
///
/// [`BufferedBody::extract`]: crate::request::body::BufferedBody::extract
pub enum ExtractBufferedBodyError {
    #[error(transparent)]
    /// See [`SizeLimitExceeded`] for details.
    SizeLimitExceeded(#[from] SizeLimitExceeded),
    #[error(transparent)]
    /// See [`UnexpectedBufferError`] for details.
    UnexpectedBufferError(#[from] UnexpectedBufferError),
}

impl ExtractBufferedBodyError {
    /// The status code that best describes this failure to the caller.
    ///
    /// `413 Payload Too Large` if the body is too big, `500 Internal Server Error` otherwise.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractBufferedBodyError::SizeLimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractBufferedBodyError::UnexpectedBufferError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub(crate) fn response_body<W: std::fmt::Write>(&self, writer: &mut W) -> std::fmt::Result {
        write!(writer, "{self}")
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned by [`form_values`] when the form body can't be parsed.
///
/// [`form_values`]: crate::request::body::form_values
pub enum ExtractFormBodyError {
    #[error(transparent)]
    /// See [`InvalidFormContentType`] for details.
    InvalidContentType(#[from] InvalidFormContentType),
    #[error(transparent)]
    /// See [`ExtractBufferedBodyError`] for details.
    Buffer(#[from] ExtractBufferedBodyError),
    #[error(transparent)]
    /// See [`MalformedUrlEncodedBody`] for details.
    Malformed(#[from] MalformedUrlEncodedBody),
}

impl ExtractFormBodyError {
    /// The status code that best describes this failure to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractFormBodyError::InvalidContentType(_) | ExtractFormBodyError::Malformed(_) => {
                StatusCode::BAD_REQUEST
            }
            ExtractFormBodyError::Buffer(e) => e.status_code(),
        }
    }

    pub(crate) fn response_body<W: std::fmt::Write>(&self, writer: &mut W) -> std::fmt::Result {
        match self {
            ExtractFormBodyError::Buffer(e) => e.response_body(writer),
            _ => write!(writer, "{self}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("The request body is larger than the maximum size limit enforced by this server.")]
#[non_exhaustive]
/// The request body is larger than the maximum size limit enforced by this server.
pub struct SizeLimitExceeded {
    /// The maximum size limit enforced by this server.
    pub max_size: ByteUnit,
    /// The value of the `Content-Length` header for the request that breached the body
    /// size limit.
    ///
    /// It's set to `None` if the `Content-Length` header was missing or invalid.
    /// If it's set to `Some(n)` and `n` is smaller than `max_size`, then the request
    /// lied about the size of its body in the `Content-Length` header.
    pub content_length: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
#[error("Something went wrong while reading the request body.")]
#[non_exhaustive]
/// Something went wrong while reading the request body, but we don't know what specifically.
pub struct UnexpectedBufferError {
    #[source]
    pub(super) source: Box<dyn std::error::Error + Send + Sync>,
}

#[derive(Debug, thiserror::Error)]
#[error("The `Content-Type` header was set to `{actual}`, which is not a valid MIME type.")]
#[non_exhaustive]
/// The `Content-Type` header could not be parsed as a MIME type.
pub struct InvalidFormContentType {
    /// The actual value of the `Content-Type` header for this request.
    pub actual: String,
}

#[derive(Debug, thiserror::Error)]
#[error("The request body is not a valid urlencoded form: invalid percent-encoded sequence at byte {offset}.")]
#[non_exhaustive]
/// The `application/x-www-form-urlencoded` body contains a `%` that is not followed
/// by two hexadecimal digits.
pub struct MalformedUrlEncodedBody {
    /// The position of the offending `%` in the body.
    pub offset: usize,
}
