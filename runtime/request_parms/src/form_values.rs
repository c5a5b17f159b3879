use indexmap::IndexMap;
use indexmap::map::Entry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A multi-valued mapping from parameter names to their values, as they appear
/// in a URL query or in an `application/x-www-form-urlencoded` body.
///
/// Keys are kept in the order they were first seen.
/// Values for the same key are kept in the order they were appended.
///
/// This is the container that [`FormDecoder`](crate::decode::FormDecoder)s receive.
/// If your decoding library expects a different shape, [`FormValues::pairs`] and
/// [`FormValues::to_urlencoded`] will get you there.
pub struct FormValues {
    inner: IndexMap<String, Vec<String>>,
}

impl FormValues {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an urlencoded string (e.g. `a=1&b=2&a=3`) into [`FormValues`].
    ///
    /// Percent-encoded sequences are decoded and `+` is treated as a space.
    /// Malformed escapes are decoded leniently.
    pub fn parse(input: &[u8]) -> Self {
        let mut values = Self::new();
        for (key, value) in form_urlencoded::parse(input) {
            values.append(key.into_owned(), value.into_owned());
        }
        values
    }

    /// Append `value` to the list of values for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// The first value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All the values for `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if at least one value was recorded for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Keep only the keys for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&str) -> bool) {
        self.inner.retain(|key, _| f(key.as_str()));
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over each key and the list of its values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + ExactSizeIterator {
        self.inner
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Iterate over every `(key, value)` pair, flattening multi-valued keys.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Merge `other` into `self`.
    ///
    /// For every key in `other`, its values are appended **after** the values
    /// already present in `self`.
    pub fn extend(&mut self, other: FormValues) {
        for (key, values) in other.inner {
            match self.inner.entry(key) {
                Entry::Occupied(mut entry) => entry.get_mut().extend(values),
                Entry::Vacant(entry) => {
                    entry.insert(values);
                }
            }
        }
    }

    /// Serialize back into an `application/x-www-form-urlencoded` string.
    pub fn to_urlencoded(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(self.pairs());
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.append(key, value);
        }
        values
    }
}

impl IntoIterator for FormValues {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::FormValues;

    #[test]
    fn repeated_keys_are_grouped() {
        let values = FormValues::parse(b"a=1&b=2&a=3");
        assert_eq!(values.len(), 2);
        assert_eq!(values.get_all("a"), ["1", "3"]);
        assert_eq!(values.get("a"), Some("1"));
        assert_eq!(values.get("b"), Some("2"));
        assert!(values.get_all("missing").is_empty());
    }

    #[test]
    fn percent_encoded_sequences_are_decoded() {
        let values = FormValues::parse(b"%3Aq=Hi%20there&name=John+Doe");
        assert_eq!(values.get(":q"), Some("Hi there"));
        assert_eq!(values.get("name"), Some("John Doe"));
    }

    #[test]
    fn extend_appends_after_existing_values() {
        let mut body: FormValues = [("s", "body"), ("i", "1")].into_iter().collect();
        let query: FormValues = [("s", "query"), ("q", "x")].into_iter().collect();
        body.extend(query);

        assert_eq!(body.get_all("s"), ["body", "query"]);
        assert_eq!(body.get("s"), Some("body"));
        assert_eq!(body.get("q"), Some("x"));
    }

    #[test]
    fn urlencoded_output_preserves_order() {
        let values: FormValues = [("b", "2"), (":q", "a b"), ("b", "3")].into_iter().collect();
        assert_eq!(values.to_urlencoded(), "b=2&b=3&%3Aq=a+b");
    }
}
