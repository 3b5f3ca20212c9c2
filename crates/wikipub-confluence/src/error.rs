//! Error types for Confluence integration.

use wikipub_sync::GatewayError;

/// Error from Confluence API operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Neither a token nor a username and password were configured.
    #[error("no Confluence credentials configured")]
    MissingCredentials,

    /// Parent page needed to create a page does not exist.
    #[error("parent page '{title}' not found in space {space_key}")]
    ParentNotFound {
        /// Space searched.
        space_key: String,
        /// Missing parent title.
        title: String,
    },
}

impl From<ConfluenceError> for GatewayError {
    fn from(err: ConfluenceError) -> Self {
        match err {
            ConfluenceError::HttpResponse { status, body } => Self::Http { status, body },
            ConfluenceError::ParentNotFound { space_key, title } => {
                Self::ParentNotFound { space_key, title }
            }
            other => Self::with_source("Confluence request failed", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wikipub_sync::error_chain;

    use super::*;

    #[test]
    fn test_http_response_maps_to_http() {
        let err = GatewayError::from(ConfluenceError::HttpResponse {
            status: 403,
            body: "forbidden".to_owned(),
        });
        assert!(matches!(err, GatewayError::Http { status: 403, .. }));
    }

    #[test]
    fn test_parent_not_found_preserved() {
        let err = GatewayError::from(ConfluenceError::ParentNotFound {
            space_key: "DOC".to_owned(),
            title: "Home".to_owned(),
        });
        assert!(matches!(
            err,
            GatewayError::ParentNotFound { ref title, .. } if title == "Home"
        ));
    }

    #[test]
    fn test_other_errors_keep_source() {
        let err = GatewayError::from(ConfluenceError::MissingCredentials);
        assert_eq!(
            error_chain(&err),
            "Confluence request failed: no Confluence credentials configured"
        );
    }
}
