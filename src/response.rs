//! The response produced by a rack.
use serde_json::Value;

use crate::headers::HeaderMap;

/// Status code, headers, and body produced by either rack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub data: Value,
}

impl Response {
    pub fn new(status_code: u16, headers: HeaderMap, data: Value) -> Self {
        Self {
            status_code,
            headers,
            data,
        }
    }

    /// `200 <= status_code < 300`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// A synthetic 404 with an empty-array body, used by `PreferLocal` GET on a cache miss.
    pub fn not_found_empty_array() -> Self {
        Self::new(404, HeaderMap::new(), Value::Array(vec![]))
    }
}
