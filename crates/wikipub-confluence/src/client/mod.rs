//! Confluence REST API client.
//!
//! Provides sync HTTP client for Confluence Server/Data Center REST API
//! with HTTP Basic or personal access token authentication.

mod attachments;
mod auth;
mod pages;

use std::time::Duration;

use ureq::Agent;
use ureq::http::Response;
use wikipub_config::{ConfluenceConfig, Representation};

use crate::error::ConfluenceError;

pub use auth::Auth;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: Agent,
    base_url: String,
    auth: Auth,
    representation: Representation,
}

impl ConfluenceClient {
    /// Create a client for `base_url`.
    #[must_use]
    pub fn new(base_url: &str, auth: Auth, representation: Representation) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth,
            representation,
        }
    }

    /// Create client from the `[confluence]` config section.
    ///
    /// A token takes precedence over username and password.
    ///
    /// # Errors
    ///
    /// Returns [`ConfluenceError::MissingCredentials`] if no credentials are set.
    pub fn from_config(config: &ConfluenceConfig) -> Result<Self, ConfluenceError> {
        let auth = match (&config.token, &config.username, &config.password) {
            (Some(token), _, _) => Auth::Bearer(token.clone()),
            (None, Some(username), Some(password)) => Auth::basic(username, password),
            _ => return Err(ConfluenceError::MissingCredentials),
        };
        Ok(Self::new(&config.base_url, auth, config.representation))
    }

    /// Server base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser URL of a page.
    #[must_use]
    pub fn page_url(&self, page_id: &str) -> String {
        format!(
            "{}/pages/viewpage.action?pageId={}",
            self.base_url, page_id
        )
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }
}

/// Return the response body, or the error body for error statuses.
fn check_status(response: Response<ureq::Body>) -> Result<ureq::Body, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body_reader = response.into_body();

    if status >= 400 {
        let error_body = body_reader
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }
    Ok(body_reader)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> ConfluenceConfig {
        ConfluenceConfig {
            base_url: "https://confluence.example.com/".to_owned(),
            username: Some("ci".to_owned()),
            password: Some("secret".to_owned()),
            token: None,
            representation: Representation::Wiki,
        }
    }

    #[test]
    fn test_from_config_basic_auth() {
        let client = ConfluenceClient::from_config(&config()).unwrap();
        assert_eq!(client.base_url(), "https://confluence.example.com");
        assert_eq!(client.api_url(), "https://confluence.example.com/rest/api");
        assert!(matches!(client.auth, Auth::Basic(_)));
    }

    #[test]
    fn test_from_config_token_wins() {
        let mut config = config();
        config.token = Some("pat".to_owned());
        let client = ConfluenceClient::from_config(&config).unwrap();
        assert_eq!(client.auth.header(), "Bearer pat");
    }

    #[test]
    fn test_from_config_missing_credentials() {
        let mut config = config();
        config.password = None;
        assert!(matches!(
            ConfluenceClient::from_config(&config),
            Err(ConfluenceError::MissingCredentials)
        ));
    }

    #[test]
    fn test_page_url() {
        let client = ConfluenceClient::from_config(&config()).unwrap();
        assert_eq!(
            client.page_url("42"),
            "https://confluence.example.com/pages/viewpage.action?pageId=42"
        );
    }
}
