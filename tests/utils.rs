use std::fs;
use wiremock::{Match, Request};

/// # Panics
///
/// Will panic if a file can't be read or missing
#[must_use = "This function returns the body of the file as a string"]
pub fn body_from_file(path: &str) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}

/// Matches requests whose query string doesn't contain the given parameter at all
pub struct QueryParamAbsentMatcher(String);

impl QueryParamAbsentMatcher {
    pub fn new<K: Into<String>>(key: K) -> Self {
        Self(key.into())
    }
}

/// Shorthand for [`QueryParamAbsentMatcher::new`].
pub fn query_param_absent<K>(key: K) -> QueryParamAbsentMatcher
where
    K: Into<String>,
{
    QueryParamAbsentMatcher::new(key)
}

impl Match for QueryParamAbsentMatcher {
    fn matches(&self, request: &Request) -> bool {
        let query = request.url.query().unwrap_or_default();
        !form_urlencoded::parse(query.as_bytes()).any(|q| q.0 == self.0.as_str())
    }
}

/// Collects the value of `key` from every request the mock server received
pub fn query_values(requests: &[Request], key: &str) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        })
        .collect()
}
