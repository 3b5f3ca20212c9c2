//! Page and label operations for Confluence API.

use serde_json::{Map, Value, json};
use tracing::{debug, info};
use wikipub_config::Representation;

use super::{ConfluenceClient, check_status};
use crate::error::ConfluenceError;
use crate::types::{Page, PagesResponse};

/// Expansions requested when searching pages.
const PAGE_EXPAND: &str = "version,body.storage,ancestors";

impl ConfluenceClient {
    /// Find a page by exact title within a space.
    pub(crate) fn find_page_by_title(
        &self,
        space_key: &str,
        title: &str,
    ) -> Result<Option<Page>, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        debug!("Searching page '{}' in space {}", title, space_key);

        let response = self
            .agent
            .get(&url)
            .query("spaceKey", space_key)
            .query("title", title)
            .query("type", "page")
            .query("expand", PAGE_EXPAND)
            .header("Authorization", &self.auth.header())
            .header("Accept", "application/json")
            .call()?;

        let found: PagesResponse = check_status(response)?.read_json()?;
        Ok(found.results.into_iter().next())
    }

    /// Create a page below `parent_id`.
    pub(crate) fn create_page(
        &self,
        space_key: &str,
        parent_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content", self.api_url());
        let payload = create_payload(space_key, parent_id, title, content, self.representation);

        info!("Creating page '{}' in space {}", title, space_key);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth.header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&serde_json::to_vec(&payload)?[..])?;

        let page: Page = check_status(response)?.read_json()?;
        info!("Created page {} ('{}')", page.id, page.title);
        Ok(page)
    }

    /// Update existing page (auto-increments version).
    pub(crate) fn update_page(
        &self,
        page_id: &str,
        space_key: &str,
        title: &str,
        content: &str,
        version: u32,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);
        let payload = update_payload(
            page_id,
            space_key,
            title,
            content,
            version,
            self.representation,
        );

        info!(
            "Updating page {} from version {} to {}",
            page_id,
            version,
            version + 1
        );

        let response = self
            .agent
            .put(&url)
            .header("Authorization", &self.auth.header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&serde_json::to_vec(&payload)?[..])?;

        let page: Page = check_status(response)?.read_json()?;
        info!(
            "Updated page {} to version {}",
            page_id, page.version.number
        );
        Ok(page)
    }

    /// Delete a page by ID.
    pub(crate) fn delete_page_by_id(&self, page_id: &str) -> Result<(), ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);

        info!("Deleting page {}", page_id);

        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &self.auth.header())
            .call()?;

        check_status(response)?;
        Ok(())
    }

    /// Add a global label to a page.
    pub(crate) fn add_page_label(&self, page_id: &str, label: &str) -> Result<(), ConfluenceError> {
        let url = format!("{}/content/{}/label", self.api_url(), page_id);
        let payload = json!([{"prefix": "global", "name": label}]);

        debug!("Adding label '{}' to page {}", label, page_id);

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth.header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&serde_json::to_vec(&payload)?[..])?;

        check_status(response)?;
        Ok(())
    }
}

/// `body` object holding `content` in the given representation.
fn body(content: &str, representation: Representation) -> Value {
    let mut body = Map::new();
    body.insert(
        representation.as_str().to_owned(),
        json!({"value": content, "representation": representation.as_str()}),
    );
    Value::Object(body)
}

fn create_payload(
    space_key: &str,
    parent_id: &str,
    title: &str,
    content: &str,
    representation: Representation,
) -> Value {
    json!({
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "ancestors": [{"id": parent_id}],
        "body": body(content, representation)
    })
}

fn update_payload(
    page_id: &str,
    space_key: &str,
    title: &str,
    content: &str,
    version: u32,
    representation: Representation,
) -> Value {
    json!({
        "id": page_id,
        "type": "page",
        "title": title,
        "space": {"key": space_key},
        "body": body(content, representation),
        "version": {"number": version + 1}
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_create_payload() {
        let payload = create_payload("DOC", "99", "MyLib - Install", "h1. Install", Representation::Wiki);
        assert_eq!(
            payload,
            json!({
                "type": "page",
                "title": "MyLib - Install",
                "space": {"key": "DOC"},
                "ancestors": [{"id": "99"}],
                "body": {"wiki": {"value": "h1. Install", "representation": "wiki"}}
            })
        );
    }

    #[test]
    fn test_update_payload_bumps_version() {
        let payload = update_payload("7", "DOC", "MyLib", "<p>x</p>", 3, Representation::Storage);
        assert_eq!(payload["version"]["number"], 4);
        assert_eq!(payload["body"]["storage"]["value"], "<p>x</p>");
        assert_eq!(payload["id"], "7");
        assert!(payload.get("ancestors").is_none());
    }
}
