//! Confluence page types.

use serde::Deserialize;

/// Confluence page.
///
/// Only includes fields that are actually used.
/// Serde ignores unknown fields from the API response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page ID.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Version information.
    pub version: Version,
    /// Page body content.
    #[serde(default)]
    pub body: Option<Body>,
    /// Ancestor pages, root first.
    #[serde(default)]
    pub ancestors: Vec<Ancestor>,
}

impl Page {
    /// Title of the direct parent, if the page has one.
    #[must_use]
    pub fn parent_title(&self) -> Option<&str> {
        self.ancestors.last().map(|a| a.title.as_str())
    }

    /// Body in storage format, empty when not expanded.
    #[must_use]
    pub fn storage_value(&self) -> &str {
        self.body
            .as_ref()
            .and_then(|b| b.storage.as_ref())
            .map_or("", |s| s.value.as_str())
    }
}

/// Page version.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    /// Version number.
    pub number: u32,
}

/// Page body content.
#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    /// Storage format content.
    #[serde(default)]
    pub storage: Option<Storage>,
}

/// Storage format representation.
#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    /// HTML content in Confluence storage format.
    pub value: String,
}

/// Ancestor reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Ancestor {
    /// Ancestor title.
    pub title: String,
}

/// Content search response.
///
/// Serde ignores paging fields (`start`, `limit`, `_links`).
#[derive(Debug, Clone, Deserialize)]
pub struct PagesResponse {
    /// Matching pages.
    pub results: Vec<Page>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SEARCH_RESPONSE: &str = r#"{
        "results": [{
            "id": "4242",
            "type": "page",
            "title": "MyLib - Install",
            "version": {"number": 7, "by": {"username": "ci"}},
            "body": {"storage": {"value": "<p>Version: 2.0</p>", "representation": "storage"}},
            "ancestors": [
                {"id": "1", "type": "page", "title": "Home"},
                {"id": "2", "type": "page", "title": "MyLib"}
            ],
            "_links": {"webui": "/display/DOC/MyLib+-+Install"}
        }],
        "start": 0,
        "limit": 25,
        "size": 1
    }"#;

    #[test]
    fn test_search_response_parses() {
        let response: PagesResponse = serde_json::from_str(SEARCH_RESPONSE).unwrap();
        let page = &response.results[0];

        assert_eq!(page.id, "4242");
        assert_eq!(page.version.number, 7);
        assert_eq!(page.parent_title(), Some("MyLib"));
        assert_eq!(page.storage_value(), "<p>Version: 2.0</p>");
    }

    #[test]
    fn test_page_without_expansions() {
        let page: Page = serde_json::from_str(
            r#"{"id": "1", "type": "page", "title": "Home", "version": {"number": 1}}"#,
        )
        .unwrap();

        assert_eq!(page.parent_title(), None);
        assert_eq!(page.storage_value(), "");
    }
}
