//! Query parameters.
use crate::FormValues;
use crate::request::RequestHead;

/// Collect the query parameters of `request_head` into [`FormValues`].
///
/// A request target without a query yields an empty collection.
pub fn query_values(request_head: &RequestHead) -> FormValues {
    FormValues::parse(request_head.query().as_bytes())
}
