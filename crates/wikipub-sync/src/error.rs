//! Error types for page synchronization.

use std::error::Error;

use crate::template::TemplateError;

/// Run configuration is unusable. Raised before any node is processed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required value is empty.
    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

/// Error from a remote wiki operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// Server returned an error status.
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Parent page required for creation does not exist.
    #[error("parent page '{title}' not found in space {space_key}")]
    ParentNotFound {
        /// Space searched.
        space_key: String,
        /// Missing parent title.
        title: String,
    },

    /// Operation needs a persisted page.
    #[error("page '{0}' has not been stored yet")]
    NotPersisted(String),

    /// Transport or protocol failure.
    #[error("{message}")]
    Remote {
        /// Human-readable description.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn Error + Send + Sync>>,
    },
}

impl GatewayError {
    /// Create a remote error from a message.
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            source: None,
        }
    }

    /// Create a remote error wrapping a source error.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Remote {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Node-level failure recorded in a [`SyncOutcome`](crate::SyncOutcome).
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Page content could not be produced.
    #[error("template error")]
    Template(#[from] TemplateError),

    /// Remote store rejected an operation.
    #[error("remote error")]
    Gateway(#[from] GatewayError),
}

/// Walk the error source chain and join all messages.
pub fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}
