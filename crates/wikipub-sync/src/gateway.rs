//! Remote wiki operations needed by the sync engine.

use crate::error::GatewayError;
use crate::page::{PageLookup, RemotePage};

/// Operations the engine needs from the remote wiki.
///
/// Every call is blocking. Implementations own timeouts and retries; the
/// engine treats any error as terminal for the current node.
pub trait WikiGateway {
    /// Find the page `title` below `parent_title` in `space_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the lookup itself fails. A missing page
    /// is [`PageLookup::NotFound`], not an error.
    fn find_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<PageLookup, GatewayError>;

    /// Return the existing page, or an unsaved shell with that identity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the lookup fails.
    fn create_or_get_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<RemotePage, GatewayError> {
        Ok(match self.find_page(space_key, parent_title, title)? {
            PageLookup::Found(page) => page,
            PageLookup::NotFound => RemotePage::shell(space_key, parent_title, title),
        })
    }

    /// Create or update a page, returning the stored page with its id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the remote store rejects the page.
    fn store_page(&self, page: RemotePage) -> Result<RemotePage, GatewayError>;

    /// Delete the page `title` below `parent_title`.
    ///
    /// Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the deletion fails.
    fn delete_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<bool, GatewayError>;

    /// Attach a label to a stored page.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the label cannot be added.
    fn add_label(&self, label: &str, page_id: &str) -> Result<(), GatewayError>;

    /// Upload (or replace, by filename) an attachment on a stored page.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the upload fails.
    fn upload_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), GatewayError>;
}
