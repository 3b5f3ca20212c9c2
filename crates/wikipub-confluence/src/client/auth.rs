//! Request authentication.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// How requests are authenticated.
#[derive(Clone)]
pub enum Auth {
    /// HTTP Basic, holding the encoded `user:password` pair.
    Basic(String),
    /// Personal access token.
    Bearer(String),
}

impl Auth {
    /// HTTP Basic credentials.
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        Self::Basic(STANDARD.encode(format!("{username}:{password}")))
    }

    /// `Authorization` header value.
    pub(crate) fn header(&self) -> String {
        match self {
            Self::Basic(credentials) => format!("Basic {credentials}"),
            Self::Bearer(token) => format!("Bearer {token}"),
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(_) => f.write_str("Basic(***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}
