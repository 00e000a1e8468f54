//! The resource path grammar: `/:namespace/:app_id/:collection(/:id)?/?`.
use crate::error::RequestError;

/// The decomposed parts of a request's `pathname`, used by the sync notifier
/// to recover the collection a mutation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub namespace: String,
    pub app_id: String,
    pub collection: String,
    pub id: Option<String>,
}

/// Parse a pathname against `/:namespace/:app_id/:collection(/:id)?/?`.
pub fn parse(pathname: &str) -> Result<PathParts, RequestError> {
    let trimmed = pathname.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 3 {
        return Err(RequestError::invalid_input(format!(
            "Pathname does not match /:namespace/:app_id/:collection(/:id)?/?: {}",
            pathname
        )));
    }
    Ok(PathParts {
        namespace: segments[0].to_string(),
        app_id: segments[1].to_string(),
        collection: segments[2].to_string(),
        id: segments.get(3).map(|s| s.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collection_and_id() {
        let parts = parse("/appdata/app1/books/b1").unwrap();
        assert_eq!(parts.namespace, "appdata");
        assert_eq!(parts.app_id, "app1");
        assert_eq!(parts.collection, "books");
        assert_eq!(parts.id.as_deref(), Some("b1"));
    }

    #[test]
    fn parses_collection_only() {
        let parts = parse("/appdata/app1/books").unwrap();
        assert_eq!(parts.collection, "books");
        assert_eq!(parts.id, None);
    }

    #[test]
    fn tolerates_trailing_slash() {
        let parts = parse("/appdata/app1/books/").unwrap();
        assert_eq!(parts.collection, "books");
    }

    #[test]
    fn rejects_too_short_path() {
        assert!(parse("/appdata/app1").is_err());
    }
}
