//! Remote page model.

/// The remote store's representation of a page.
///
/// A page without `id` is an unsaved shell: it was looked up, not found,
/// and will be created on the next [`WikiGateway::store_page`] call.
///
/// [`WikiGateway::store_page`]: crate::WikiGateway::store_page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    /// Identifier assigned by the remote store.
    pub id: Option<String>,
    /// Space containing the page.
    pub space_key: String,
    /// Title of the parent page.
    pub parent_title: String,
    /// Page title.
    pub title: String,
    /// Page body markup.
    pub content: String,
    /// Remote version counter (0 for an unsaved shell).
    pub version: u32,
}

impl RemotePage {
    /// Create an unsaved page shell with the given identity.
    #[must_use]
    pub fn shell(space_key: &str, parent_title: &str, title: &str) -> Self {
        Self {
            id: None,
            space_key: space_key.to_owned(),
            parent_title: parent_title.to_owned(),
            title: title.to_owned(),
            content: String::new(),
            version: 0,
        }
    }

    /// Whether the page exists remotely.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Result of looking a page up by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    /// The page exists.
    Found(RemotePage),
    /// No page with that identity exists yet.
    NotFound,
}

impl PageLookup {
    /// Convert into an `Option`, dropping the not-found case.
    #[must_use]
    pub fn into_page(self) -> Option<RemotePage> {
        match self {
            Self::Found(page) => Some(page),
            Self::NotFound => None,
        }
    }
}
