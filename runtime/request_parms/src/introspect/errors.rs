use std::borrow::Cow;
use std::fmt::{self, Display};

use smallvec::SmallVec;

use crate::decode::BoxError;

use super::{Aggregate, HasParameter, HasParameters};

#[derive(Debug, thiserror::Error)]
#[error("Invalid value for `{parameter}`: {reason}")]
/// A single parameter holds an unacceptable value.
///
/// Return it from [`Validate::validate`](crate::Validate::validate) to let the caller know
/// which parameter to fix.
///
/// ```rust
/// use request_parms::{Validate, decode::BoxError, introspect::InvalidParameter};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// pub struct Page {
///     size: u32,
/// }
///
/// impl Validate for Page {
///     fn validate(&self) -> Result<(), BoxError> {
///         if self.size > 100 {
///             return Err(InvalidParameter::new("size", "it can't be larger than 100").into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub struct InvalidParameter {
    parameter: String,
    reason: Cow<'static, str>,
}

impl InvalidParameter {
    /// Blame `parameter`, for the given `reason`.
    pub fn new(parameter: impl Into<String>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Why the value was rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl HasParameter for InvalidParameter {
    fn parameter(&self) -> String {
        self.parameter.clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid combination of values for {}: {reason}", .parameters.join(", "))]
/// Several parameters, together, hold an unacceptable combination of values.
pub struct InvalidParameters {
    parameters: Vec<String>,
    reason: Cow<'static, str>,
}

impl InvalidParameters {
    /// Blame all of `parameters`, for the given `reason`.
    pub fn new<I, P>(parameters: I, reason: impl Into<Cow<'static, str>>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            reason: reason.into(),
        }
    }

    /// Why the values were rejected.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl HasParameters for InvalidParameters {
    fn parameters(&self) -> Vec<String> {
        self.parameters.clone()
    }
}

/// A collection of errors that occurred while processing the same request.
///
/// Use it to report several problems **at once** (e.g. from
/// [`Validate::validate`](crate::Validate::validate)), reducing the number of round-trips
/// your API users need to fix their requests.
///
/// Each error in the group is a child of the group when looking for parameter names: see
/// [`Introspector`](super::Introspector).
#[derive(Debug, Default)]
pub struct ErrorGroup {
    items: SmallVec<[BoxError; 2]>,
}

impl ErrorGroup {
    /// Create a new, empty [`ErrorGroup`].
    pub fn new() -> Self {
        Self {
            items: SmallVec::new(),
        }
    }

    /// Returns `true` if there are no errors in the group.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of errors that have been collected so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add a new error to the group.
    pub fn push<E>(&mut self, e: E)
    where
        E: Into<BoxError>,
    {
        self.items.push(e.into());
    }

    /// Returns an iterator over the collected errors, in the order they were added.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = &(dyn std::error::Error + Send + Sync + 'static)> + ExactSizeIterator
    {
        self.items.iter().map(|e| &**e)
    }

    /// `Ok(())` if the group is empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl<E: Into<BoxError>> FromIterator<E> for ErrorGroup {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Display for ErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.as_slice() {
            [] => write!(f, "No errors"),
            [e] => write!(f, "{e}"),
            items => {
                write!(f, "Multiple errors occurred:")?;
                for e in items {
                    write!(f, "\n- {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorGroup {}

impl Aggregate for ErrorGroup {
    fn errors(&self) -> Vec<&(dyn std::error::Error + 'static)> {
        self.items
            .iter()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
            .collect()
    }
}
