use crate::request::body::BodySizeLimit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
/// The knobs to customize the behaviour of a [`Parser`](crate::Parser).
///
/// It can be deserialized from your application configuration:
///
/// ```rust
/// use request_parms::ParserConfig;
///
/// let config: ParserConfig = serde_json::from_str(
///     r#"{ "body_size_limit": { "mode": "enabled", "max_size": "1 MiB" } }"#
/// ).unwrap();
/// ```
pub struct ParserConfig {
    /// The maximum size of the request bodies the parser is willing to buffer.
    ///
    /// It defaults to 10 MiB.
    pub body_size_limit: BodySizeLimit,
}
