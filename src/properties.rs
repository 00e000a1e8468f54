//! Custom per-request metadata serialized into a header, with a size cap.
use std::collections::HashMap;

use serde_json::Value;

use crate::error::RequestError;

/// Custom request properties. Serialized as JSON into
/// `X-Kinvey-Custom-Request-Properties`; `app_version` is split out into its
/// own `X-Kinvey-Client-App-Version` header instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestProperties {
    pub app_version: Option<String>,
    pub values: HashMap<String, Value>,
}

impl RequestProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// The properties minus `app_version`, as they go out on the wire.
    fn wire_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn serialized(&self) -> String {
        self.wire_json().to_string()
    }

    pub fn byte_len(&self) -> usize {
        self.serialized().len()
    }

    /// Validate against `max_custom_props_bytes`, matching §4.1's `requestProperties` setter.
    pub fn validate(&self, max_custom_props_bytes: usize) -> Result<(), RequestError> {
        if self.byte_len() >= max_custom_props_bytes {
            return Err(RequestError::invalid_input(format!(
                "Custom request properties exceed the maximum allowed size of {} bytes",
                max_custom_props_bytes
            )));
        }
        Ok(())
    }
}
