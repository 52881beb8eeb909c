//! Request metadata passed from the query layer to the transport.

use std::collections::BTreeMap;

/// Everything needed to issue one GET request: path segments relative to the
/// client's base URL and the encoded query parameters.
///
/// Segments are kept unencoded; the transport percent-encodes each one when it
/// assembles the URL, so search terms may contain spaces or slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Path segments below the base URL, e.g. `["fixtures", "date", "2024-05-19"]`.
    pub segments: Vec<String>,

    /// Query parameters for this request.
    pub query_params: BTreeMap<String, String>,
}

impl RequestMetadata {
    /// Creates metadata for the given segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query_params: BTreeMap::new(),
        }
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query_params.extend(params);
        self
    }

    /// The request path as `/segment/segment`, for logging and error messages.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}
