//! Local document nodes.

use std::path::PathBuf;

/// Default extension of child page sources.
pub const DEFAULT_FILE_EXT: &str = ".wiki";

/// Error constructing a [`DocumentNode`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NodeError {
    /// Node title is empty.
    #[error("document title cannot be empty")]
    EmptyTitle,
    /// A label is empty.
    #[error("label cannot be empty (document '{0}')")]
    EmptyLabel(String),
}

/// A local document destined to become one remote page.
///
/// Nodes are built once per run and never mutated while syncing. Nested
/// `children` are published below this node's computed page title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    title: String,
    source: Option<String>,
    labels: Vec<String>,
    file_extension: String,
    attachments: Vec<PathBuf>,
    children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Create a node without source, labels or children.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyTitle`] if the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, NodeError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(NodeError::EmptyTitle);
        }
        Ok(Self {
            title,
            source: None,
            labels: Vec::new(),
            file_extension: DEFAULT_FILE_EXT.to_owned(),
            attachments: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Set the source locator (file path or URI).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set labels. Duplicates are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::EmptyLabel`] if any label is blank.
    pub fn with_labels<I, S>(mut self, labels: I) -> Result<Self, NodeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if label.trim().is_empty() {
                return Err(NodeError::EmptyLabel(self.title));
            }
            if !collected.contains(&label) {
                collected.push(label);
            }
        }
        self.labels = collected;
        Ok(self)
    }

    /// Set the extension used to find implicit child sources.
    #[must_use]
    pub fn with_file_extension(mut self, ext: &str) -> Self {
        self.file_extension = if ext.starts_with('.') {
            ext.to_owned()
        } else {
            format!(".{ext}")
        };
        self
    }

    /// Add files to upload as page attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = PathBuf>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    /// Append a nested child node.
    #[must_use]
    pub fn with_child(mut self, child: DocumentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Node title (without prefix).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Source locator, if any.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Labels to attach remotely.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Source file extension, starting with `.`.
    #[must_use]
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    /// Files to attach to the page.
    #[must_use]
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    /// Nested children, in source order.
    #[must_use]
    pub fn children(&self) -> &[DocumentNode] {
        &self.children
    }
}
