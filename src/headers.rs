//! Case-insensitive header storage.
use std::collections::HashMap;

// header statics must be lower case, numbers and symbols per the RFC spec. This reduces chance of error.
pub static ACCEPT: &str = "Accept";
pub static AUTHORIZATION: &str = "Authorization";
pub static CONTENT_TYPE: &str = "Content-Type";
pub static X_KINVEY_API_VERSION: &str = "X-Kinvey-Api-Version";
pub static X_KINVEY_DEVICE_INFORMATION: &str = "X-Kinvey-Device-Information";
pub static X_KINVEY_CONTENT_TYPE: &str = "X-Kinvey-Content-Type";
pub static X_KINVEY_SKIP_BUSINESS_LOGIC: &str = "X-Kinvey-Skip-Business-Logic";
pub static X_KINVEY_INCLUDE_HEADERS_IN_RESPONSE: &str = "X-Kinvey-Include-Headers-In-Response";
pub static X_KINVEY_RESPONSE_WRAPPER: &str = "X-Kinvey-ResponseWrapper";
pub static X_KINVEY_CLIENT_APP_VERSION: &str = "X-Kinvey-Client-App-Version";
pub static X_KINVEY_CUSTOM_REQUEST_PROPERTIES: &str = "X-Kinvey-Custom-Request-Properties";
pub static X_KINVEY_REQUEST_ID: &str = "X-Kinvey-Request-Id";

/// A header store that looks up, removes, and clears case-insensitively but
/// preserves the caller's original casing when iterating or serializing.
///
/// The teacher's `removeHeader` lowercases the lookup key but not the stored
/// key; this implementation normalizes on every operation instead, since that
/// asymmetry is called out as a latent bug in the design notes rather than
/// intended behavior (see DESIGN.md).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HeaderMap {
    // keyed by the lowercased header name; value is (original_case_name, value)
    entries: HashMap<String, (String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        self.entries.insert(key, (name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&name.to_ascii_lowercase());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a plain `name -> value` map, for the request descriptor handed to a rack.
    pub fn to_plain_map(&self) -> HashMap<String, String> {
        self.entries
            .values()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_case_insensitive() {
        let mut h = HeaderMap::new();
        h.set("Content-Type", "application/json");
        assert_eq!(h.get("content-type"), Some("application/json"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn set_preserves_caller_case() {
        let mut h = HeaderMap::new();
        h.set("X-Kinvey-Api-Version", "3");
        let map = h.to_plain_map();
        assert!(map.contains_key("X-Kinvey-Api-Version"));
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut h = HeaderMap::new();
        h.set("Content-Type", "application/json");
        h.remove("content-type");
        assert!(!h.has("Content-Type"));
    }

    #[test]
    fn clear_empties_the_map() {
        let mut h = HeaderMap::new();
        h.set("Accept", "application/json");
        h.clear();
        assert!(h.is_empty());
    }
}
