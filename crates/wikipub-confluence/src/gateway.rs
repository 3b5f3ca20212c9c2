//! [`WikiGateway`] implementation over the REST client.
//!
//! Confluence page titles are unique per space, so lookups search by title
//! and then check the parent (the page's last ancestor). A page with the
//! requested title under a different parent is reported as not found and
//! is never deleted.

use tracing::warn;
use wikipub_sync::{GatewayError, PageLookup, RemotePage, WikiGateway};

use crate::client::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::types::Page;

impl ConfluenceClient {
    /// Page with `title`, only if it sits directly below `parent_title`.
    fn find_child_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<Option<Page>, ConfluenceError> {
        let Some(page) = self.find_page_by_title(space_key, title)? else {
            return Ok(None);
        };

        if page.parent_title() == Some(parent_title) {
            Ok(Some(page))
        } else {
            warn!(
                page = title,
                expected_parent = parent_title,
                actual_parent = page.parent_title().unwrap_or("(none)"),
                "Page exists under a different parent"
            );
            Ok(None)
        }
    }
}

fn to_remote(page: Page, space_key: &str, parent_title: &str) -> RemotePage {
    RemotePage {
        content: page.storage_value().to_owned(),
        version: page.version.number,
        id: Some(page.id),
        space_key: space_key.to_owned(),
        parent_title: parent_title.to_owned(),
        title: page.title,
    }
}

impl WikiGateway for ConfluenceClient {
    fn find_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<PageLookup, GatewayError> {
        Ok(self
            .find_child_page(space_key, parent_title, title)?
            .map_or(PageLookup::NotFound, |page| {
                PageLookup::Found(to_remote(page, space_key, parent_title))
            }))
    }

    fn store_page(&self, page: RemotePage) -> Result<RemotePage, GatewayError> {
        let stored = match &page.id {
            Some(id) => self.update_page(
                id,
                &page.space_key,
                &page.title,
                &page.content,
                page.version,
            )?,
            None => {
                let parent = self
                    .find_page_by_title(&page.space_key, &page.parent_title)?
                    .ok_or_else(|| ConfluenceError::ParentNotFound {
                        space_key: page.space_key.clone(),
                        title: page.parent_title.clone(),
                    })?;
                self.create_page(&page.space_key, &parent.id, &page.title, &page.content)?
            }
        };

        Ok(RemotePage {
            id: Some(stored.id),
            version: stored.version.number,
            ..page
        })
    }

    fn delete_page(
        &self,
        space_key: &str,
        parent_title: &str,
        title: &str,
    ) -> Result<bool, GatewayError> {
        let Some(page) = self.find_child_page(space_key, parent_title, title)? else {
            return Ok(false);
        };
        self.delete_page_by_id(&page.id)?;
        Ok(true)
    }

    fn add_label(&self, label: &str, page_id: &str) -> Result<(), GatewayError> {
        Ok(self.add_page_label(page_id, label)?)
    }

    fn upload_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), GatewayError> {
        Ok(self.put_attachment(page_id, filename, data, content_type)?)
    }
}
