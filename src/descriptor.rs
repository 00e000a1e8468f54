//! The plain request descriptor handed off to a rack (`toJSON()` in §4.1).
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::Method;

/// Everything a rack needs to actually perform I/O: no policy, no auth
/// closure, no `executing` flag — those are core-only concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub url: String,
    pub pathname: String,
    pub query: Option<Value>,
    pub search: HashMap<String, String>,
    pub data: Value,
    /// The transport hint string (`"blob"`, `"document"`, `"json"`, or `""`),
    /// already resolved from the semantic `ResponseType` by the setter.
    pub response_type: String,
    pub timeout: u64,
}
