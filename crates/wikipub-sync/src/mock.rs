//! Mock gateway implementation for testing.
//!
//! Provides [`MockGateway`], an in-memory wiki that records every call and
//! can be told to fail specific operations.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::GatewayError;
use crate::gateway::WikiGateway;
use crate::page::{PageLookup, RemotePage};

/// A gateway call, as recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `find_page` (also issued by `create_or_get_page`).
    Find {
        /// Parent title.
        parent_title: String,
        /// Page title.
        title: String,
    },
    /// `store_page`.
    Store {
        /// Page title.
        title: String,
    },
    /// `delete_page`.
    Delete {
        /// Parent title.
        parent_title: String,
        /// Page title.
        title: String,
    },
    /// `add_label`.
    AddLabel {
        /// Label name.
        label: String,
        /// Target page.
        page_id: String,
    },
    /// `upload_attachment`.
    UploadAttachment {
        /// Target page.
        page_id: String,
        /// Attachment filename.
        filename: String,
    },
}

/// In-memory wiki for testing.
///
/// # Example
///
/// ```ignore
/// use wikipub_sync::{MockGateway, WikiGateway};
///
/// let gateway = MockGateway::new()
///     .with_page("DOC", "Home", "MyLib", "old content")
///     .failing_label("broken");
/// ```
#[derive(Debug, Default)]
pub struct MockGateway {
    pages: RwLock<Vec<RemotePage>>,
    labels: RwLock<HashMap<String, Vec<String>>>,
    attachments: RwLock<HashMap<String, Vec<(String, Vec<u8>)>>>,
    calls: RwLock<Vec<GatewayCall>>,
    failing_stores: HashSet<String>,
    failing_labels: HashSet<String>,
    failing_attachments: HashSet<String>,
    failing_deletes: HashSet<String>,
    require_parents: bool,
    next_id: RwLock<u64>,
}

impl MockGateway {
    /// Create an empty mock wiki.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing page.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, space_key: &str, parent_title: &str, title: &str, content: &str) -> Self {
        let id = self.allocate_id();
        self.pages.write().unwrap().push(RemotePage {
            id: Some(id),
            content: content.to_owned(),
            version: 1,
            ..RemotePage::shell(space_key, parent_title, title)
        });
        self
    }

    /// Fail `store_page` for pages with this title.
    #[must_use]
    pub fn failing_store(mut self, title: &str) -> Self {
        self.failing_stores.insert(title.to_owned());
        self
    }

    /// Fail `add_label` for this label.
    #[must_use]
    pub fn failing_label(mut self, label: &str) -> Self {
        self.failing_labels.insert(label.to_owned());
        self
    }

    /// Fail `upload_attachment` for this filename.
    #[must_use]
    pub fn failing_attachment(mut self, filename: &str) -> Self {
        self.failing_attachments.insert(filename.to_owned());
        self
    }

    /// Fail `delete_page` for pages below this parent.
    #[must_use]
    pub fn failing_deletes_under(mut self, parent_title: &str) -> Self {
        self.failing_deletes.insert(parent_title.to_owned());
        self
    }

    /// Reject creation of pages whose parent does not exist.
    #[must_use]
    pub fn require_parents(mut self) -> Self {
        self.require_parents = true;
        self
    }

    /// All stored pages.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn pages(&self) -> Vec<RemotePage> {
        self.pages.read().unwrap().clone()
    }

    /// Find a stored page by title.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn page(&self, title: &str) -> Option<RemotePage> {
        self.pages
            .read()
            .unwrap()
            .iter()
            .find(|p| p.title == title)
            .cloned()
    }

    /// Labels attached to a page, in attachment order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn labels(&self, page_id: &str) -> Vec<String> {
        self.labels
            .read()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Attachment filenames on a page, in upload order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn attachments(&self, page_id: &str) -> Vec<String> {
        self.attachments
            .read()
            .unwrap()
            .get(page_id)
            .map(|files| files.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Every call made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.read().unwrap().clone()
    }

    /// Only the `delete_page` calls.
    pub fn deletions(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::Delete { .. }))
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.write().unwrap().push(call);
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.write().unwrap();
        *next += 1;
        format!("{}", 1000 + *next)
    }

    fn has_page(&self, page_id: &str) -> bool {
        self.pages
            .read()
            .unwrap()
            .iter()
            .any(|p| p.id.as_deref() == Some(page_id))
    }
}

impl WikiGateway for MockGateway {
    fn find_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<PageLookup, GatewayError> {
        self.record(GatewayCall::Find {
            parent_title: parent_title.to_owned(),
            title: title.to_owned(),
        });
        let pages = self.pages.read().unwrap();
        Ok(pages
            .iter()
            .find(|p| p.space_key == space_key && p.parent_title == parent_title && p.title == title)
            .cloned()
            .map_or(PageLookup::NotFound, PageLookup::Found))
    }

    fn store_page(&self, mut page: RemotePage) -> Result<RemotePage, GatewayError> {
        self.record(GatewayCall::Store {
            title: page.title.clone(),
        });
        if self.failing_stores.contains(&page.title) {
            return Err(GatewayError::remote(format!(
                "store of '{}' rejected",
                page.title
            )));
        }

        if let Some(id) = page.id.clone() {
            let mut pages = self.pages.write().unwrap();
            let stored = pages
                .iter_mut()
                .find(|p| p.id.as_deref() == Some(id.as_str()))
                .ok_or_else(|| GatewayError::Http {
                    status: 404,
                    body: format!("no page with id {id}"),
                })?;
            stored.content.clone_from(&page.content);
            stored.version += 1;
            return Ok(stored.clone());
        }

        if self.require_parents
            && !self
                .pages
                .read()
                .unwrap()
                .iter()
                .any(|p| p.space_key == page.space_key && p.title == page.parent_title)
        {
            return Err(GatewayError::ParentNotFound {
                space_key: page.space_key,
                title: page.parent_title,
            });
        }

        page.id = Some(self.allocate_id());
        page.version = 1;
        self.pages.write().unwrap().push(page.clone());
        Ok(page)
    }

    fn delete_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<bool, GatewayError> {
        self.record(GatewayCall::Delete {
            parent_title: parent_title.to_owned(),
            title: title.to_owned(),
        });
        if self.failing_deletes.contains(parent_title) {
            return Err(GatewayError::remote("delete rejected"));
        }

        let mut pages = self.pages.write().unwrap();
        let before = pages.len();
        pages.retain(|p| {
            !(p.space_key == space_key && p.parent_title == parent_title && p.title == title)
        });
        Ok(pages.len() < before)
    }

    fn add_label(&self, label: &str, page_id: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::AddLabel {
            label: label.to_owned(),
            page_id: page_id.to_owned(),
        });
        if self.failing_labels.contains(label) {
            return Err(GatewayError::remote(format!("label '{label}' rejected")));
        }
        if !self.has_page(page_id) {
            return Err(GatewayError::NotPersisted(page_id.to_owned()));
        }

        let mut labels = self.labels.write().unwrap();
        let entry = labels.entry(page_id.to_owned()).or_default();
        if !entry.iter().any(|l| l == label) {
            entry.push(label.to_owned());
        }
        Ok(())
    }

    fn upload_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::UploadAttachment {
            page_id: page_id.to_owned(),
            filename: filename.to_owned(),
        });
        if self.failing_attachments.contains(filename) {
            return Err(GatewayError::remote(format!(
                "attachment '{filename}' rejected"
            )));
        }

        let mut attachments = self.attachments.write().unwrap();
        let files = attachments.entry(page_id.to_owned()).or_default();
        files.retain(|(name, _)| name != filename);
        files.push((filename.to_owned(), data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_assigns_id_then_updates() {
        let gateway = MockGateway::new();
        let created = gateway
            .store_page(RemotePage::shell("DOC", "Home", "Page"))
            .unwrap();
        assert!(created.is_persisted());
        assert_eq!(created.version, 1);

        let mut page = gateway.create_or_get_page("DOC", "Home", "Page").unwrap();
        page.content = "v2".to_owned();
        let updated = gateway.store_page(page).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.version, 2);
        assert_eq!(gateway.pages().len(), 1);
    }

    #[test]
    fn test_delete_missing_page_returns_false() {
        let gateway = MockGateway::new();
        assert!(!gateway.delete_page("DOC", "Home", "Nope").unwrap());
    }

    #[test]
    fn test_require_parents() {
        let gateway = MockGateway::new().require_parents();
        let err = gateway
            .store_page(RemotePage::shell("DOC", "Missing", "Page"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::ParentNotFound { .. }));
    }
}
