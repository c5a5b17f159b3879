use http::{HeaderMap, Method};
use http_body::Body;

use crate::FormValues;
use crate::request::RequestHead;

use super::{
    BodySizeLimit, BufferedBody,
    errors::{ExtractFormBodyError, InvalidFormContentType, MalformedUrlEncodedBody},
};

/// Read the parameters carried by an `application/x-www-form-urlencoded` request body.
///
/// The body is only considered for `POST`, `PUT` and `PATCH` requests whose
/// `Content-Type` is `application/x-www-form-urlencoded`. In every other case
/// the body is left unread and an empty [`FormValues`] is returned:
///
/// - a missing `Content-Type` is treated as `application/octet-stream`
/// - `multipart/form-data` and any other media type are ignored
///
/// A `Content-Type` that is not a valid MIME type is rejected, as is a body
/// containing a malformed percent-encoded sequence.
pub async fn form_values<B>(
    request_head: &RequestHead,
    body: B,
    body_size_limit: BodySizeLimit,
) -> Result<FormValues, ExtractFormBodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if !carries_form(&request_head.method) || !is_urlencoded(&request_head.headers)? {
        return Ok(FormValues::new());
    }
    let buffered = BufferedBody::extract(request_head, body, body_size_limit).await?;
    parse(buffered.bytes.as_ref())
}

fn carries_form(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

/// Check if the `Content-Type` header is set to `application/x-www-form-urlencoded`.
///
/// A missing header is not an error, an unparsable one is.
fn is_urlencoded(headers: &HeaderMap) -> Result<bool, ExtractFormBodyError> {
    let Some(content_type) = headers.get(http::header::CONTENT_TYPE) else {
        return Ok(false);
    };
    let Ok(content_type) = content_type.to_str() else {
        return Err(InvalidFormContentType {
            actual: String::from_utf8_lossy(content_type.as_bytes()).into_owned(),
        }
        .into());
    };
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return Err(InvalidFormContentType {
            actual: content_type.to_string(),
        }
        .into());
    };
    Ok(mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED)
}

/// Parse bytes into [`FormValues`], rejecting malformed percent-encoded sequences.
fn parse(bytes: &[u8]) -> Result<FormValues, ExtractFormBodyError> {
    check_percent_encoding(bytes)?;
    Ok(FormValues::parse(bytes))
}

fn check_percent_encoding(bytes: &[u8]) -> Result<(), MalformedUrlEncodedBody> {
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let is_valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !is_valid {
                return Err(MalformedUrlEncodedBody { offset: i });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::Full;

    use crate::request::RequestHead;
    use crate::request::body::BodySizeLimit;

    use super::form_values;

    fn request_head(method: http::Method, content_type: Option<&str>) -> RequestHead {
        let mut headers = http::HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(http::header::CONTENT_TYPE, content_type.parse().unwrap());
        }
        RequestHead {
            method,
            target: "/".parse().unwrap(),
            version: http::Version::HTTP_11,
            headers,
        }
    }

    fn body(s: &'static str) -> Full<Bytes> {
        Full::new(Bytes::from_static(s.as_bytes()))
    }

    #[tokio::test]
    async fn urlencoded_post_body_is_parsed() {
        let head = request_head(
            http::Method::POST,
            Some("application/x-www-form-urlencoded; charset=utf-8"),
        );
        let values = form_values(&head, body("s=X&i=-1&%3Aq=q"), BodySizeLimit::default())
            .await
            .unwrap();
        assert_eq!(values.get("s"), Some("X"));
        assert_eq!(values.get("i"), Some("-1"));
        assert_eq!(values.get(":q"), Some("q"));
    }

    #[tokio::test]
    async fn get_body_is_ignored() {
        let head = request_head(http::Method::GET, Some("application/x-www-form-urlencoded"));
        let values = form_values(&head, body("s=X"), BodySizeLimit::default())
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_is_ignored() {
        let head = request_head(http::Method::POST, None);
        let values = form_values(&head, body("s=X"), BodySizeLimit::default())
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn other_media_types_are_ignored() {
        for content_type in ["application/json", "multipart/form-data; boundary=x"] {
            let head = request_head(http::Method::PUT, Some(content_type));
            let values = form_values(&head, body("s=X"), BodySizeLimit::default())
                .await
                .unwrap();
            assert!(values.is_empty(), "{content_type}");
        }
    }

    #[tokio::test]
    async fn content_type_is_not_valid_mime() {
        let head = request_head(http::Method::POST, Some("hello world"));
        let err = form_values(&head, body("s=X"), BodySizeLimit::default())
            .await
            .unwrap_err();
        insta::assert_snapshot!(err, @"The `Content-Type` header was set to `hello world`, which is not a valid MIME type.");
        insta::assert_debug_snapshot!(err, @r###"
        InvalidContentType(
            InvalidFormContentType {
                actual: "hello world",
            },
        )
        "###);
    }

    #[tokio::test]
    async fn malformed_escape_is_rejected() {
        let head = request_head(http::Method::PATCH, Some("application/x-www-form-urlencoded"));
        let err = form_values(&head, body("s=a%2&i=1"), BodySizeLimit::default())
            .await
            .unwrap_err();
        insta::assert_snapshot!(err, @"The request body is not a valid urlencoded form: invalid percent-encoded sequence at byte 3.");
    }

    #[test]
    fn percent_encoding_checks() {
        assert!(super::check_percent_encoding(b"a=%20&b=%3A").is_ok());
        assert!(super::check_percent_encoding(b"").is_ok());
        assert_eq!(super::check_percent_encoding(b"a=%").unwrap_err().offset, 2);
        assert_eq!(super::check_percent_encoding(b"a=%zz").unwrap_err().offset, 2);
    }
}
