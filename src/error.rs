//! Errors produced by request construction and execution.
use backtrace::Backtrace;
use thiserror::Error;

/// Errors produced while building or executing a [`crate::request::Request`].
///
/// Mirrors the shape of a database-backend error: an opaque `kind`, a
/// `Backtrace` captured at construction time, and an introspection trait so
/// callers can branch on error category without matching on `Display` text.
#[derive(Debug)]
pub struct RequestError {
    kind: RequestErrorKind,
    pub backtrace: Backtrace,
}

#[derive(Debug, Error)]
enum RequestErrorKind {
    #[error("Invalid input: {}", _0)]
    InvalidInput(String),

    #[error("Request is already executing")]
    AlreadyExecuting,

    #[error("Not found")]
    NotFound,

    #[error("Blob not found")]
    BlobNotFound,

    #[error("Dispatcher produced no response")]
    NoResponse,

    #[error("{}", _0)]
    Generic(String),
}

impl RequestError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        RequestErrorKind::InvalidInput(msg.into()).into()
    }

    pub fn already_executing() -> Self {
        RequestErrorKind::AlreadyExecuting.into()
    }

    pub fn not_found() -> Self {
        RequestErrorKind::NotFound.into()
    }

    pub fn blob_not_found() -> Self {
        RequestErrorKind::BlobNotFound.into()
    }

    pub fn no_response() -> Self {
        RequestErrorKind::NoResponse.into()
    }

    pub fn generic(msg: impl Into<String>) -> Self {
        RequestErrorKind::Generic(msg.into()).into()
    }
}

/// Cheap kind checks for error branching, analogous to `DbErrorIntrospect`.
pub trait RequestErrorIntrospect {
    fn is_invalid_input(&self) -> bool;
    fn is_already_executing(&self) -> bool;
    fn is_not_found(&self) -> bool;
    fn is_blob_not_found(&self) -> bool;
    fn is_no_response(&self) -> bool;
}

impl RequestErrorIntrospect for RequestError {
    fn is_invalid_input(&self) -> bool {
        matches!(self.kind, RequestErrorKind::InvalidInput(_))
    }

    fn is_already_executing(&self) -> bool {
        matches!(self.kind, RequestErrorKind::AlreadyExecuting)
    }

    fn is_not_found(&self) -> bool {
        matches!(self.kind, RequestErrorKind::NotFound)
    }

    fn is_blob_not_found(&self) -> bool {
        matches!(self.kind, RequestErrorKind::BlobNotFound)
    }

    fn is_no_response(&self) -> bool {
        matches!(self.kind, RequestErrorKind::NoResponse)
    }
}

impl From<RequestErrorKind> for RequestError {
    fn from(kind: RequestErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.kind, formatter)
    }
}

impl std::error::Error for RequestError {}

/// Server-side error envelope shape returned in a non-2xx `Response::data`.
///
/// `{name, message|description|error, debug}`. Step C of `execute()` lifts
/// this into a typed [`RequestError`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
}

impl ErrorEnvelope {
    fn text(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.description.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// Lift a server error envelope into a typed [`RequestError`] per §4.2 Step C.
    pub fn into_error(self) -> RequestError {
        match self.name.as_deref() {
            Some("BlobNotFound") => RequestError::blob_not_found(),
            Some("EntityNotFound") => RequestError::not_found(),
            _ => RequestError::generic(self.text()),
        }
    }
}
