//! CLI error types.

use wikipub_config::ConfigError;
use wikipub_confluence::ConfluenceError;
use wikipub_sync::{ConfigurationError, SiteError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Confluence(#[from] ConfluenceError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("{failed} of {total} page(s) failed")]
    SyncFailed { failed: usize, total: usize },
}
