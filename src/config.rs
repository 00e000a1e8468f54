//! The tunables named in §6, with the documented defaults.
use serde::{Deserialize, Serialize};

/// Process-wide configuration for request construction and dispatch.
///
/// Mirrors `syncstorage-settings::Settings`: a plain struct with a `Default`
/// impl, deserializable by a host application via the `config` crate if it
/// wants to load overrides from file or environment. This crate never reads
/// the environment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync_collection_name: String,
    pub max_custom_props_bytes: usize,
    pub default_timeout_ms: u64,
    pub max_ids_per_request: usize,
    pub api_version: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_collection_name: "sync".to_string(),
            max_custom_props_bytes: 2000,
            default_timeout_ms: 10_000,
            max_ids_per_request: 200,
            api_version: 3,
        }
    }
}
