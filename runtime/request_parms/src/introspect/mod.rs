//! Find out which request parameters are responsible for a failure.
//!
//! # Overview
//!
//! Decoders and validators report failures in different ways: some blame a single field,
//! some blame several fields at once, some wrap the culprit inside other errors.
//! The [`Introspector`] walks the error tree and looks for errors that expose one of two
//! capabilities:
//!
//! - [`HasParameters`]: the error blames several parameters
//! - [`HasParameter`]: the error blames a single parameter
//!
//! Rust can't ask a `dyn Error` whether it implements an arbitrary trait, so the error
//! types carrying these capabilities must be registered on the [`Introspector`].
//! The types shipped with this crate are registered out of the box, including the errors
//! returned by the default decoders.
//!
//! # Traversal
//!
//! The error tree is visited depth-first, in pre-order, left to right.
//! The children of an error are:
//!
//! 1. the errors it aggregates, if its type is a registered [`Aggregate`] (e.g. [`ErrorGroup`])
//! 2. otherwise, its [`source`](std::error::Error::source), if any
//!
//! The whole tree is searched for a [`HasParameters`] error first, then for a
//! [`HasParameter`] error. The first match wins: names from other matches are not merged in.
//! If neither capability is found, the fallback extractor (if configured) is invoked
//! with the top-level error.
use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub use errors::{ErrorGroup, InvalidParameter, InvalidParameters};

use crate::ParseError;

mod errors;

/// An error that blames a single request parameter.
pub trait HasParameter {
    /// The external name of the offending parameter.
    ///
    /// An empty string means that no parameter could be identified.
    fn parameter(&self) -> String;
}

/// An error that blames several request parameters at once.
pub trait HasParameters {
    /// The external names of the offending parameters, in any order, possibly with duplicates.
    fn parameters(&self) -> Vec<String>;
}

/// An error that wraps several other errors.
pub trait Aggregate {
    /// The wrapped errors, in order.
    fn errors(&self) -> Vec<&(dyn Error + 'static)>;
}

/// A caller-provided function to extract parameter names from errors that don't
/// expose any of the capabilities known to the [`Introspector`].
pub type ParametersExtractor = Arc<dyn Fn(&(dyn Error + 'static)) -> Vec<String> + Send + Sync>;

type ParameterProbe = fn(&(dyn Error + 'static)) -> Option<String>;
type ParametersProbe = fn(&(dyn Error + 'static)) -> Option<Vec<String>>;
type AggregateProbe = for<'a> fn(&'a (dyn Error + 'static)) -> Option<Vec<&'a (dyn Error + 'static)>>;

#[derive(Clone)]
/// Extract the names of the parameters implicated in an error.
///
/// See the [module documentation](self) for the details of the search.
///
/// # Example
///
/// ```rust
/// use request_parms::introspect::{ErrorGroup, Introspector, InvalidParameter};
///
/// let mut errors = ErrorGroup::new();
/// errors.push(std::io::Error::other("not a parameter problem"));
/// errors.push(InvalidParameter::new("size", "too big"));
///
/// let introspector = Introspector::new();
/// assert_eq!(introspector.parameters_from_err(&errors), vec!["size".to_string()]);
/// ```
pub struct Introspector {
    single: Vec<ParameterProbe>,
    multi: Vec<ParametersProbe>,
    aggregates: Vec<AggregateProbe>,
    fallback: Option<ParametersExtractor>,
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Introspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Introspector")
            .field("n_parameter_probes", &self.single.len())
            .field("n_parameters_probes", &self.multi.len())
            .field("n_aggregate_probes", &self.aggregates.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Introspector {
    /// An [`Introspector`] that knows about the error types shipped with this crate
    /// and about the errors returned by the default decoders.
    pub fn new() -> Self {
        Self {
            single: Vec::new(),
            multi: Vec::new(),
            aggregates: Vec::new(),
            fallback: None,
        }
        .with_parameter::<InvalidParameter>()
        .with_parameter::<serde_path_to_error::Error<serde::de::value::Error>>()
        .with_parameter::<serde_path_to_error::Error<serde_json::Error>>()
        .with_parameters::<InvalidParameters>()
        .with_aggregate::<ErrorGroup>()
        .with_aggregate::<ParseError>()
    }

    /// Register `E` as an error type that blames a single parameter.
    pub fn with_parameter<E>(mut self) -> Self
    where
        E: Error + HasParameter + 'static,
    {
        self.single.push(probe_parameter::<E>);
        self
    }

    /// Register `E` as an error type that blames several parameters.
    pub fn with_parameters<E>(mut self) -> Self
    where
        E: Error + HasParameters + 'static,
    {
        self.multi.push(probe_parameters::<E>);
        self
    }

    /// Register `E` as an error type that wraps several other errors.
    pub fn with_aggregate<E>(mut self) -> Self
    where
        E: Error + Aggregate + 'static,
    {
        self.aggregates.push(probe_aggregate::<E>);
        self
    }

    /// Set the function to invoke when no error in the tree exposes a parameter capability.
    ///
    /// Its output is returned verbatim.
    pub fn with_fallback<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> Vec<String> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(extractor));
        self
    }

    /// The names of the parameters implicated in `err`.
    ///
    /// Names coming from a [`HasParameters`] error are sorted and deduplicated.
    /// The result is empty if no name could be found.
    pub fn parameters_from_err(&self, err: &(dyn Error + 'static)) -> Vec<String> {
        if let Some(mut names) = self.find(err, |e| self.multi.iter().find_map(|probe| probe(e))) {
            names.retain(|name| !name.is_empty());
            names.sort();
            names.dedup();
            return names;
        }
        if let Some(name) = self.find(err, |e| self.single.iter().find_map(|probe| probe(e))) {
            return if name.is_empty() {
                Vec::new()
            } else {
                vec![name]
            };
        }
        match &self.fallback {
            Some(extractor) => extractor(err),
            None => Vec::new(),
        }
    }

    /// The names of the parameters implicated in the failure of `result`.
    ///
    /// It's always empty for `Ok` results.
    pub fn parameters_from_result<T, E>(&self, result: &Result<T, E>) -> Vec<String>
    where
        E: Error + 'static,
    {
        match result {
            Ok(_) => Vec::new(),
            Err(e) => self.parameters_from_err(e),
        }
    }

    /// Visit the error tree rooted in `root` and return the first non-`None` output of `probe`.
    fn find<R>(
        &self,
        root: &(dyn Error + 'static),
        mut probe: impl FnMut(&(dyn Error + 'static)) -> Option<R>,
    ) -> Option<R> {
        let mut stack = vec![root];
        while let Some(err) = stack.pop() {
            if let Some(found) = probe(err) {
                return Some(found);
            }
            // Reversed, so that the leftmost child is visited next.
            stack.extend(self.children(err).into_iter().rev());
        }
        None
    }

    fn children<'a>(&self, err: &'a (dyn Error + 'static)) -> Vec<&'a (dyn Error + 'static)> {
        for probe in &self.aggregates {
            if let Some(children) = probe(err) {
                return children;
            }
        }
        err.source().into_iter().collect()
    }
}

fn probe_parameter<E>(err: &(dyn Error + 'static)) -> Option<String>
where
    E: Error + HasParameter + 'static,
{
    err.downcast_ref::<E>().map(HasParameter::parameter)
}

fn probe_parameters<E>(err: &(dyn Error + 'static)) -> Option<Vec<String>>
where
    E: Error + HasParameters + 'static,
{
    err.downcast_ref::<E>().map(HasParameters::parameters)
}

fn probe_aggregate<'a, E>(err: &'a (dyn Error + 'static)) -> Option<Vec<&'a (dyn Error + 'static)>>
where
    E: Error + Aggregate + 'static,
{
    err.downcast_ref::<E>().map(Aggregate::errors)
}

impl<E> HasParameter for serde_path_to_error::Error<E> {
    /// The path to the field that failed to deserialize (e.g. `address.zip`).
    fn parameter(&self) -> String {
        let path = self.path();
        if path.iter().next().is_none() {
            String::new()
        } else {
            path.to_string()
        }
    }
}

impl Aggregate for ParseError {
    fn errors(&self) -> Vec<&(dyn Error + 'static)> {
        vec![self.inner()]
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fmt;

    use super::{ErrorGroup, HasParameter, HasParameters, Introspector, InvalidParameter, InvalidParameters};

    /// Wraps another error, exposing it as its source.
    #[derive(Debug)]
    struct Context(&'static str, Box<dyn Error + Send + Sync>);

    impl fmt::Display for Context {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}: {}", self.0, self.1)
        }
    }

    impl Error for Context {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&*self.1)
        }
    }

    fn eof() -> std::io::Error {
        std::io::Error::from(std::io::ErrorKind::UnexpectedEof)
    }

    fn fallback() -> Introspector {
        Introspector::new().with_fallback(|_| vec!["x".into(), "y".into(), "z".into()])
    }

    #[test]
    fn ok_results_have_no_parameters() {
        let result: Result<(), std::io::Error> = Ok(());
        assert!(Introspector::new().parameters_from_result(&result).is_empty());
        assert!(fallback().parameters_from_result(&result).is_empty());
    }

    #[test]
    fn plain_errors_have_no_parameters() {
        assert!(Introspector::new().parameters_from_err(&eof()).is_empty());
        let wrapped = Context("x", eof().into());
        assert!(Introspector::new().parameters_from_err(&wrapped).is_empty());
    }

    #[test]
    fn single_parameter() {
        let err = InvalidParameter::new("a", "bad");
        assert_eq!(Introspector::new().parameters_from_err(&err), ["a"]);
    }

    #[test]
    fn multiple_parameters_are_sorted_and_deduplicated() {
        let err = InvalidParameters::new(["a", "c", "b", "a"], "bad");
        assert_eq!(Introspector::new().parameters_from_err(&err), ["a", "b", "c"]);
    }

    #[test]
    fn empty_names_yield_nothing() {
        let err = InvalidParameter::new("", "bad");
        assert!(Introspector::new().parameters_from_err(&err).is_empty());
        let err = InvalidParameters::new(Vec::<String>::new(), "bad");
        assert!(Introspector::new().parameters_from_err(&err).is_empty());
    }

    #[test]
    fn capabilities_are_found_through_sources() {
        let err = Context("x", InvalidParameter::new("a", "bad").into());
        assert_eq!(Introspector::new().parameters_from_err(&err), ["a"]);

        let err = Context("x", InvalidParameters::new(["a", "c", "b", "a"], "bad").into());
        assert_eq!(Introspector::new().parameters_from_err(&err), ["a", "b", "c"]);
    }

    #[test]
    fn capabilities_are_found_inside_groups() {
        let group: ErrorGroup = [
            Box::new(eof()) as Box<dyn Error + Send + Sync>,
            Box::new(InvalidParameter::new("a", "bad")),
        ]
        .into_iter()
        .collect();
        let err = Context("x", group.into());
        assert_eq!(Introspector::new().parameters_from_err(&err), ["a"]);
    }

    #[test]
    fn multiple_parameters_win_over_single_parameter() {
        let group: ErrorGroup = [
            Box::new(InvalidParameter::new("z", "bad")) as Box<dyn Error + Send + Sync>,
            Box::new(InvalidParameters::new(["a", "c", "b", "a"], "bad")),
        ]
        .into_iter()
        .collect();
        assert_eq!(Introspector::new().parameters_from_err(&group), ["a", "b", "c"]);
    }

    #[test]
    fn first_match_wins_depth_first() {
        // The first child is visited, with its whole subtree, before the second one.
        let deep = Context("deep", InvalidParameter::new("deep", "bad").into());
        let group: ErrorGroup = [
            Box::new(deep) as Box<dyn Error + Send + Sync>,
            Box::new(InvalidParameter::new("shallow", "bad")),
        ]
        .into_iter()
        .collect();
        assert_eq!(Introspector::new().parameters_from_err(&group), ["deep"]);
    }

    #[test]
    fn fallback_is_used_when_no_capability_is_found() {
        assert_eq!(fallback().parameters_from_err(&eof()), ["x", "y", "z"]);
        let wrapped = Context("x", eof().into());
        assert_eq!(fallback().parameters_from_err(&wrapped), ["x", "y", "z"]);
    }

    #[test]
    fn fallback_is_not_used_when_a_capability_is_found() {
        let err = InvalidParameter::new("a", "bad");
        assert_eq!(fallback().parameters_from_err(&err), ["a"]);
        let err = InvalidParameters::new(["a", "b"], "bad");
        assert_eq!(fallback().parameters_from_err(&err), ["a", "b"]);
    }

    #[test]
    fn fallback_output_is_returned_verbatim() {
        let introspector = Introspector::new().with_fallback(|_| vec!["b".into(), "a".into(), "b".into()]);
        assert_eq!(introspector.parameters_from_err(&eof()), ["b", "a", "b"]);
    }

    #[test]
    fn custom_capabilities_can_be_registered() {
        #[derive(Debug)]
        struct Missing(Vec<String>);

        impl fmt::Display for Missing {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "missing: {}", self.0.join(","))
            }
        }

        impl Error for Missing {}

        impl HasParameters for Missing {
            fn parameters(&self) -> Vec<String> {
                self.0.clone()
            }
        }

        #[derive(Debug)]
        struct Blame;

        impl fmt::Display for Blame {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "blame")
            }
        }

        impl Error for Blame {}

        impl HasParameter for Blame {
            fn parameter(&self) -> String {
                "blamed".into()
            }
        }

        let err = Missing(vec!["q".into(), "p".into()]);
        assert!(Introspector::new().parameters_from_err(&err).is_empty());
        let introspector = Introspector::new()
            .with_parameters::<Missing>()
            .with_parameter::<Blame>();
        assert_eq!(introspector.parameters_from_err(&err), ["p", "q"]);
        assert_eq!(
            introspector.parameters_from_err(&Context("x", Blame.into())),
            ["blamed"]
        );
    }
}
