//! Request-execution core for a mobile-backend client SDK.
//!
//! Takes a high-level data operation (GET/POST/PATCH/PUT/DELETE against a
//! hierarchical resource path) and satisfies it against a local offline
//! cache and a remote network backend according to a caller-selected
//! [`policy::DataPolicy`]. Also implements delta-set synchronization
//! ([`deltaset::DeltaSetRequest`]) for minimizing network payload when
//! refreshing collections.
//!
//! The two execution backends (the "racks") are out of scope here; only
//! their contract ([`rack::Rack`]) lives in this crate.
#[macro_use]
extern crate slog_scope;

pub mod auth;
pub mod client;
pub mod config;
pub mod deltaset;
pub mod descriptor;
pub mod error;
pub mod headers;
pub mod path;
pub mod policy;
pub mod properties;
pub mod rack;
pub mod request;
pub mod response;
pub mod sync;

pub use auth::{Auth, AuthDescriptor};
pub use client::Client;
pub use config::Config;
pub use deltaset::DeltaSetRequest;
pub use error::{RequestError, RequestErrorIntrospect};
pub use policy::{DataPolicy, Method, ResponseType};
pub use rack::Rack;
pub use request::{Request, RequestOptions};
pub use response::Response;
