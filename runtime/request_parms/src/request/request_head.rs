use http::{HeaderMap, Method, Uri, Version};

#[derive(Debug, Clone)]
/// All the information that is transmitted as part of an HTTP request ahead of the body.
///
/// It includes the [method](Method), the [target](Uri),
/// the [HTTP version](Version), and the [headers](HeaderMap).
///
/// [`Parser::parse_query`](crate::Parser::parse_query) only needs a [`RequestHead`],
/// the body-aware operations take the body alongside it.
pub struct RequestHead {
    /// The HTTP method of the request.
    pub method: Method,
    /// The [target](https://datatracker.ietf.org/doc/html/rfc7230#section-5.3) of the request.
    pub target: Uri,
    /// The HTTP version used by the request.
    pub version: Version,
    /// The headers attached to the request.
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Split an [`http::Request`] into its [`RequestHead`] and its body.
    pub fn split<B>(request: http::Request<B>) -> (Self, B) {
        let (parts, body) = request.into_parts();
        (parts.into(), body)
    }

    /// The raw query string, without the leading `?`.
    ///
    /// It's empty if the request target has no query.
    pub fn query(&self) -> &str {
        self.target.query().unwrap_or_default()
    }
}

impl From<http::request::Parts> for RequestHead {
    fn from(parts: http::request::Parts) -> Self {
        Self {
            method: parts.method,
            target: parts.uri,
            version: parts.version,
            headers: parts.headers,
        }
    }
}
