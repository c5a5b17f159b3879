use std::error::Error;

use http_body::Body;
use tracing_log_error::log_error;

use crate::config::ParserConfig;
use crate::decode::{
    BoxError, DEFAULT_FORM_DECODER, FormDecoder, HtmlFormDecoder, JsonUnmarshaler,
    SerdeJsonUnmarshaler, Target,
};
use crate::errors::{DecodeError, DecodeOrigin, NoFormDecoderConfigured, ParseError};
use crate::introspect::Introspector;
use crate::request::RequestHead;
use crate::request::body::{BodySizeLimit, BufferedBody, form_values};
use crate::request::query::query_values;
use crate::validate::Validate;

/// Decode request parameters into a target type, then validate it.
///
/// # Decoding strategies
///
/// The parser delegates decoding to a [`FormDecoder`] (for query strings and urlencoded
/// bodies) and to a [`JsonUnmarshaler`] (for JSON bodies).
///
/// - [`Parser::new`] has **no** form decoder: [`Parser::parse_query`],
///   [`Parser::parse_query_form`] and [`Parser::parse_query_json`] fail with
///   [`NoFormDecoderConfigured`]. Use it if you only care about JSON bodies.
/// - [`Parser::with_default_decoders`] uses the process-wide [`DEFAULT_FORM_DECODER`] and
///   [`SerdeJsonUnmarshaler`].
/// - [`Parser::builder`] lets you plug in your own strategies.
///
/// # Validation
///
/// Every operation invokes [`Validate::validate`] on the target **once**, after all
/// decoding steps have succeeded. If decoding fails, validation is skipped.
///
/// # Concurrency
///
/// A parser holds no mutable state: share it across request handlers (e.g. behind an `Arc`)
/// as long as its decoding strategies are safe to invoke concurrently.
///
/// # Example
///
/// ```rust
/// use request_parms::{Parser, Validate, request::RequestHead};
///
/// #[derive(Default, serde::Serialize, serde::Deserialize)]
/// pub struct Search {
///     q: String,
///     page: u32,
/// }
///
/// impl Validate for Search {}
///
/// let request = http::Request::get("/search?q=rust&page=2").body(()).unwrap();
/// let (head, _) = RequestHead::split(request);
///
/// let mut search = Search::default();
/// Parser::with_default_decoders().parse_query(&head, &mut search).unwrap();
/// assert_eq!(search.q, "rust");
/// assert_eq!(search.page, 2);
/// ```
#[derive(Debug, Clone)]
pub struct Parser<F = &'static HtmlFormDecoder, J = SerdeJsonUnmarshaler> {
    form_decoder: Option<F>,
    json_unmarshaler: J,
    introspector: Introspector,
    config: ParserConfig,
}

impl Parser {
    /// A parser without a form decoder, using [`SerdeJsonUnmarshaler`] for JSON bodies.
    pub fn new() -> Self {
        ParserBuilder::new().build()
    }

    /// A parser using [`DEFAULT_FORM_DECODER`] and [`SerdeJsonUnmarshaler`].
    pub fn with_default_decoders() -> Self {
        ParserBuilder::new()
            .form_decoder(&DEFAULT_FORM_DECODER)
            .build()
    }

    /// Start building a parser with custom settings.
    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, J> Parser<F, J>
where
    F: FormDecoder,
    J: JsonUnmarshaler,
{
    /// Decode the URL query of the request into `target`, then validate it.
    #[tracing::instrument(name = "parse_query", level = "debug", skip_all)]
    pub fn parse_query<T>(&self, request_head: &RequestHead, target: &mut T) -> Result<(), ParseError>
    where
        T: Target + Validate,
    {
        report(self._parse_query(request_head, target))
    }

    /// Decode the URL query **and** the urlencoded body of the request into `target`,
    /// then validate it.
    ///
    /// Body values come first for each key, query values are appended after them.
    /// See [`form_values`] for the requests whose body is taken into account.
    /// The body is never read if no form decoder has been configured.
    #[tracing::instrument(name = "parse_query_form", level = "debug", skip_all)]
    pub async fn parse_query_form<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        report(self._parse_query_form(request_head, body, target).await)
    }

    /// Decode the JSON body of the request into `target`, then validate it.
    ///
    /// An empty body is not an error: `target` is left untouched, but it's still validated.
    /// The `Content-Type` header is not checked.
    #[tracing::instrument(name = "parse_json", level = "debug", skip_all)]
    pub async fn parse_json<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        report(self._parse_json(request_head, body, target).await)
    }

    /// Decode the URL query, then the JSON body, into `target`, then validate it.
    ///
    /// Values from the body override the ones from the query when they map to the same field.
    /// If the query can't be decoded, the body is never read.
    #[tracing::instrument(name = "parse_query_json", level = "debug", skip_all)]
    pub async fn parse_query_json<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        report(self._parse_query_json(request_head, body, target).await)
    }

    fn _parse_query<T>(&self, request_head: &RequestHead, target: &mut T) -> Result<(), ParseError>
    where
        T: Target + Validate,
    {
        self.decode_query(request_head, target)?;
        validate(target)
    }

    async fn _parse_query_form<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        let decoder = self.form_decoder()?;
        let mut values = form_values(request_head, body, self.config.body_size_limit).await?;
        values.extend(query_values(request_head));
        decoder
            .decode(target, &values)
            .map_err(|e| DecodeError::new(DecodeOrigin::Form, e))?;
        validate(target)
    }

    async fn _parse_json<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        self.decode_json_body(request_head, body, target).await?;
        validate(target)
    }

    async fn _parse_query_json<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target + Validate,
        B: Body,
        B::Error: Into<BoxError>,
    {
        self.decode_query(request_head, target)?;
        self.decode_json_body(request_head, body, target).await?;
        validate(target)
    }

    fn decode_query<T: Target>(
        &self,
        request_head: &RequestHead,
        target: &mut T,
    ) -> Result<(), ParseError> {
        let decoder = self.form_decoder()?;
        decoder
            .decode(target, &query_values(request_head))
            .map_err(|e| DecodeError::new(DecodeOrigin::Query, e))?;
        Ok(())
    }

    async fn decode_json_body<T, B>(
        &self,
        request_head: &RequestHead,
        body: B,
        target: &mut T,
    ) -> Result<(), ParseError>
    where
        T: Target,
        B: Body,
        B::Error: Into<BoxError>,
    {
        let buffered = BufferedBody::extract(request_head, body, self.config.body_size_limit).await?;
        if buffered.bytes.is_empty() {
            tracing::trace!("Empty request body, nothing to unmarshal");
            return Ok(());
        }
        self.json_unmarshaler
            .unmarshal(&buffered.bytes, target)
            .map_err(|e| DecodeError::new(DecodeOrigin::JsonBody, e))?;
        Ok(())
    }
}

impl<F, J> Parser<F, J> {
    /// The names of the request parameters implicated in `err`.
    ///
    /// It delegates to the [`Introspector`] configured on this parser.
    pub fn parameters_from_err(&self, err: &(dyn Error + 'static)) -> Vec<String> {
        self.introspector.parameters_from_err(err)
    }

    /// The [`Introspector`] used by [`Parser::parameters_from_err`].
    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    /// The configuration of this parser.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn form_decoder(&self) -> Result<&F, NoFormDecoderConfigured> {
        self.form_decoder.as_ref().ok_or(NoFormDecoderConfigured)
    }
}

fn validate<T: Validate>(target: &T) -> Result<(), ParseError> {
    target.validate().map_err(ParseError::Validation)
}

fn report(outcome: Result<(), ParseError>) -> Result<(), ParseError> {
    if let Err(e) = &outcome {
        if e.status_code().is_server_error() {
            log_error!(e, "Failed to parse the request parameters");
        } else {
            log_error!(
                e,
                level: tracing::Level::DEBUG,
                "Failed to parse the request parameters"
            );
        }
    }
    outcome
}

/// Build a [`Parser`] with custom decoding strategies, introspection rules or configuration.
///
/// ```rust
/// use request_parms::{Parser, ParserConfig, decode::HtmlFormDecoder};
/// use request_parms::request::body::BodySizeLimit;
/// use ubyte::ToByteUnit;
///
/// let parser = Parser::builder()
///     .form_decoder(HtmlFormDecoder::new())
///     .body_size_limit(BodySizeLimit::Enabled { max_size: 1.mebibytes() })
///     .parameters_extractor(|_| vec!["payload".to_string()])
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ParserBuilder<F = &'static HtmlFormDecoder, J = SerdeJsonUnmarshaler> {
    form_decoder: Option<F>,
    json_unmarshaler: J,
    introspector: Introspector,
    config: ParserConfig,
}

impl ParserBuilder {
    /// A builder without a form decoder, using [`SerdeJsonUnmarshaler`], the default
    /// [`Introspector`] and the default [`ParserConfig`].
    pub fn new() -> Self {
        Self {
            form_decoder: None,
            json_unmarshaler: SerdeJsonUnmarshaler,
            introspector: Introspector::new(),
            config: ParserConfig::default(),
        }
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, J> ParserBuilder<F, J> {
    /// Use `decoder` for query strings and urlencoded bodies.
    pub fn form_decoder<F2: FormDecoder>(self, decoder: F2) -> ParserBuilder<F2, J> {
        ParserBuilder {
            form_decoder: Some(decoder),
            json_unmarshaler: self.json_unmarshaler,
            introspector: self.introspector,
            config: self.config,
        }
    }

    /// Use `unmarshaler` for JSON bodies.
    pub fn json_unmarshaler<J2: JsonUnmarshaler>(self, unmarshaler: J2) -> ParserBuilder<F, J2> {
        ParserBuilder {
            form_decoder: self.form_decoder,
            json_unmarshaler: unmarshaler,
            introspector: self.introspector,
            config: self.config,
        }
    }

    /// Extract parameter names from errors that don't expose any known capability.
    ///
    /// See [`Introspector::with_fallback`].
    pub fn parameters_extractor<E>(mut self, extractor: E) -> Self
    where
        E: Fn(&(dyn Error + 'static)) -> Vec<String> + Send + Sync + 'static,
    {
        self.introspector = self.introspector.with_fallback(extractor);
        self
    }

    /// Replace the [`Introspector`], e.g. to register your own error types.
    pub fn introspector(mut self, introspector: Introspector) -> Self {
        self.introspector = introspector;
        self
    }

    /// Replace the whole [`ParserConfig`].
    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum size of the request bodies the parser is willing to buffer.
    pub fn body_size_limit(mut self, limit: BodySizeLimit) -> Self {
        self.config.body_size_limit = limit;
        self
    }

    pub fn build(self) -> Parser<F, J> {
        Parser {
            form_decoder: self.form_decoder,
            json_unmarshaler: self.json_unmarshaler,
            introspector: self.introspector,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use ubyte::ToByteUnit;

    use super::Parser;
    use crate::decode::{BoxError, FormDecoder, Target};
    use crate::request::RequestHead;
    use crate::request::body::BodySizeLimit;
    use crate::{FormValues, ParseError, Validate};

    #[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Page {
        size: u32,
    }

    impl Validate for Page {}

    fn head(target: &str) -> RequestHead {
        RequestHead::split(http::Request::get(target).body(()).unwrap()).0
    }

    #[test]
    fn parsers_start_without_a_form_decoder() {
        let mut page = Page::default();
        let err = Parser::new()
            .parse_query(&head("/?size=3"), &mut page)
            .unwrap_err();
        assert!(matches!(err, ParseError::NoFormDecoder(_)));
        assert_eq!(page, Page::default());
    }

    #[test]
    fn custom_form_decoders_are_used() {
        /// Sets `size` to the number of distinct keys.
        struct CountKeys;

        impl FormDecoder for CountKeys {
            fn decode<T: Target>(&self, target: &mut T, values: &FormValues) -> Result<(), BoxError> {
                let count = values.len().to_string();
                let values: FormValues = [("size", count)].into_iter().collect();
                crate::decode::DEFAULT_FORM_DECODER.decode(target, &values)
            }
        }

        let parser = Parser::builder().form_decoder(CountKeys).build();
        let mut page = Page::default();
        parser.parse_query(&head("/?a=1&b=2&a=3"), &mut page).unwrap();
        assert_eq!(page.size, 2);
    }

    #[test]
    fn builder_settings_are_kept() {
        let parser = Parser::builder()
            .body_size_limit(BodySizeLimit::Enabled {
                max_size: 1.kibibytes(),
            })
            .parameters_extractor(|_| vec!["everything".into()])
            .build();
        assert_eq!(
            parser.config().body_size_limit,
            BodySizeLimit::Enabled {
                max_size: 1.kibibytes()
            }
        );
        let err = std::io::Error::other("boom");
        assert_eq!(parser.parameters_from_err(&err), ["everything"]);
    }
}
