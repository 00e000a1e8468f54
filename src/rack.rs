//! The rack contract: pluggable execution backends for local cache and network I/O.
//!
//! Racks are out of scope for this crate's implementation; only the contract
//! lives here, mirroring how `syncstorage-db-common::Db`/`DbPool` describe a
//! pluggable storage backend without implementing one.
use async_trait::async_trait;

use crate::descriptor::RequestDescriptor;
use crate::error::RequestError;
use crate::response::Response;

/// A pluggable execution backend (the "cache rack" or "network rack").
///
/// Implementations never fail for non-2xx responses; they return a
/// `Response` whose `is_success()` is false instead. `Err` is reserved for
/// transport-level failures, which must be distinguishable as "not found" at
/// minimum via [`RequestError::is_not_found`](crate::error::RequestErrorIntrospect::is_not_found).
#[async_trait]
pub trait Rack: Send + Sync {
    async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response, RequestError>;
}
