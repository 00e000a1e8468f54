//! The caller-selected data policy governing which store is authoritative.
use serde::{Deserialize, Serialize};

/// Which store(s) satisfy a request, and how the other is kept consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataPolicy {
    /// Local only; never touches the network. Used internally for sync bookkeeping.
    LocalOnly,
    /// `LocalFirst`: prefer the cache, fall back to / reconcile with the network.
    PreferLocal,
    /// `NetworkOnly`: network is authoritative, no local fallback or mirroring.
    ForceNetwork,
    /// Network is preferred; on success the result is mirrored into the cache.
    PreferNetwork,
    /// Local is authoritative for this call; on a non-GET success, the sync
    /// queue is notified unless `skip_sync` is set.
    ForceLocal,
}

impl Default for DataPolicy {
    fn default() -> Self {
        DataPolicy::PreferLocal
    }
}

/// The HTTP-ish method a [`crate::request::Request`] executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Coerce a caller-supplied string (any case) to a `Method`, uppercasing
    /// and validating against the allowed set per §4.1's method setter.
    pub fn parse(input: &str) -> Result<Self, crate::error::RequestError> {
        match input.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(crate::error::RequestError::invalid_input(format!(
                "Invalid HTTP method: {}",
                other
            ))),
        }
    }
}

/// The semantic response-body hint, mapped to a transport hint by the setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResponseType {
    #[default]
    Text,
    Blob,
    Document,
    Json,
}

impl ResponseType {
    /// The transport-level hint string per §4.1's `responseType` setter.
    pub fn transport_hint(&self) -> &'static str {
        match self {
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
            ResponseType::Text => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestErrorIntrospect;

    #[test]
    fn method_parse_accepts_lowercase() {
        assert_eq!(Method::parse("get").unwrap(), Method::Get);
    }

    #[test]
    fn method_parse_rejects_unknown() {
        let err = Method::parse("OPTIONS").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn response_type_transport_hints() {
        assert_eq!(ResponseType::Blob.transport_hint(), "blob");
        assert_eq!(ResponseType::Document.transport_hint(), "document");
        assert_eq!(ResponseType::Json.transport_hint(), "json");
        assert_eq!(ResponseType::Text.transport_hint(), "");
    }
}
