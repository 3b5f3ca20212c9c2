//! Template property resolution.
//!
//! Properties come from three sources, lowest precedence first:
//!
//! 1. explicit configuration, with URI values replaced by the content they
//!    point to
//! 2. extra project properties
//! 3. derived keys (`pageTitle`, `parentPageTitle`, `artifactId`, `version`,
//!    `groupId`, `name`, `description`)
//!
//! Derived keys always win, even over an explicit entry with the same name.
//! That includes `[project.properties]`: a project property overrides an
//! explicit entry, but a project property named `version` cannot replace the
//! project version a page is published for. Every other project property is
//! applied as is.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::error_chain;
use crate::resolver::{ContentResolver, parse_uri};

/// Keys injected by [`PropertyResolver::resolve`].
pub const DERIVED_KEYS: [&str; 7] = [
    "pageTitle",
    "parentPageTitle",
    "artifactId",
    "version",
    "groupId",
    "name",
    "description",
];

/// Property name to value mapping used for template substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet(BTreeMap<String, String>);

impl PropertySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look a property up.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Project metadata exposed to templates.
#[derive(Debug, Clone, Default)]
pub struct ProjectMetadata {
    /// Artifact identifier.
    pub artifact_id: Option<String>,
    /// Group identifier.
    pub group_id: Option<String>,
    /// Current build version.
    pub version: Option<String>,
    /// Human-readable name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Extra project properties.
    pub properties: BTreeMap<String, String>,
}

impl ProjectMetadata {
    /// Whether the current build is a snapshot (version ends in `-SNAPSHOT`).
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.ends_with("-SNAPSHOT"))
    }
}

/// Builds the final [`PropertySet`] for each page.
///
/// URI-valued explicit properties are dereferenced once, on construction.
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    base: PropertySet,
    metadata: ProjectMetadata,
}

impl PropertyResolver {
    /// Create a resolver, dereferencing URI values of `explicit`.
    ///
    /// A value that fails to dereference keeps its original text; the
    /// failure is logged as a warning naming the property.
    pub fn new(
        explicit: &BTreeMap<String, String>,
        metadata: ProjectMetadata,
        content: &dyn ContentResolver,
    ) -> Self {
        let mut base: PropertySet = explicit
            .iter()
            .map(|(key, value)| (key.clone(), dereference(key, value, content)))
            .collect();

        for (key, value) in &metadata.properties {
            base.insert(key.clone(), value.clone());
        }

        Self { base, metadata }
    }

    /// Properties for one page, with derived keys seeded from the page identity.
    #[must_use]
    pub fn resolve(&self, page_title: &str, parent_title: &str) -> PropertySet {
        let mut props = self.base.clone();
        let meta = &self.metadata;
        let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();

        props.insert("pageTitle", page_title);
        props.insert("parentPageTitle", parent_title);
        props.insert("artifactId", or_empty(&meta.artifact_id));
        props.insert("version", or_empty(&meta.version));
        props.insert("groupId", or_empty(&meta.group_id));
        props.insert("name", or_empty(&meta.name));
        props.insert("description", or_empty(&meta.description));
        props
    }
}

/// Replace a URI value with the content it points to.
fn dereference(key: &str, value: &str, content: &dyn ContentResolver) -> String {
    if parse_uri(value).is_none() {
        debug!(property = key, "Property value is not a URI");
        return value.to_owned();
    }

    match content.resolve(value) {
        Ok(text) => {
            debug!(property = key, uri = value, "Dereferenced property value");
            text
        }
        Err(err) => {
            warn!(
                property = key,
                error = %error_chain(&err),
                "Error processing value of property, keeping it unchanged"
            );
            value.to_owned()
        }
    }
}
