//! Credential resolution (§4.2 Step A).
use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::client::Client;

/// Either a fixed set of credentials, or a username/password pair that gets
/// base64-framed into Basic-auth credentials at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDescriptor {
    Basic { username: String, password: String },
    Opaque { scheme: String, credentials: String },
}

impl AuthDescriptor {
    /// Resolve to the `(scheme, credentials)` pair written into `Authorization`.
    pub fn resolve(&self) -> (String, String) {
        match self {
            AuthDescriptor::Basic { username, password } => {
                let raw = format!("{}:{}", username, password);
                ("Basic".to_string(), STANDARD.encode(raw))
            }
            AuthDescriptor::Opaque {
                scheme,
                credentials,
            } => (scheme.clone(), credentials.clone()),
        }
    }
}

type AuthClosure = Arc<dyn Fn(&Client) -> Option<AuthDescriptor> + Send + Sync>;

/// The `auth` field: a static descriptor, or a closure invoked once per
/// `execute()` with the client to produce one. Modeled as a two-variant sum
/// per the design notes rather than a dynamically-typed callable-or-value.
#[derive(Clone)]
pub enum Auth {
    Static(Option<AuthDescriptor>),
    Closure(AuthClosure),
}

impl Auth {
    pub fn none() -> Self {
        Auth::Static(None)
    }

    pub fn resolve(&self, client: &Client) -> Option<AuthDescriptor> {
        match self {
            Auth::Static(descriptor) => descriptor.clone(),
            Auth::Closure(f) => f(client),
        }
    }
}

impl Default for Auth {
    fn default() -> Self {
        Auth::none()
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Static(descriptor) => f.debug_tuple("Static").field(descriptor).finish(),
            Auth::Closure(_) => f.write_str("Closure(..)"),
        }
    }
}
