//! Per-node page synchronization.
//!
//! [`PageSyncEngine`] turns one [`DocumentNode`] into one remote page:
//!
//! 1. Remove the stale snapshot page (release builds only, when enabled)
//! 2. Look the page up, or start an unsaved shell
//! 3. Render the node source with the resolved properties
//! 4. Store the page (skipped for existing pages without a source)
//! 5. Attach labels and upload attachments
//!
//! Failures in steps 1-4 fail the node. Label and attachment failures are
//! recorded in the outcome and never fail the node.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::{ConfigurationError, GatewayError, SyncError, error_chain};
use crate::gateway::WikiGateway;
use crate::node::DocumentNode;
use crate::outcome::{AttachmentError, AttachmentFailure, LabelFailure, SnapshotCleanup, SyncOutcome};
use crate::page::RemotePage;
use crate::properties::{ProjectMetadata, PropertyResolver};
use crate::resolver::ContentResolver;
use crate::template::{TemplateError, TemplateOptions, TemplateRenderer};

/// Immutable settings for one sync run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Target space.
    pub space_key: String,
    /// Page under which the home page is published.
    pub parent_title: String,
    /// Home page title, prepended to every child title.
    pub title_prefix: String,
    /// Delete `<prefix>-SNAPSHOT` when publishing a release build.
    pub remove_snapshots: bool,
    /// Project metadata (version decides snapshot cleanup).
    pub metadata: ProjectMetadata,
    /// Explicit template properties. URI values are dereferenced.
    pub properties: BTreeMap<String, String>,
    /// Template evaluator options.
    pub template: TemplateOptions,
}

impl RunConfig {
    /// Check that required values are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Empty`] naming the first empty value.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.space_key.trim().is_empty() {
            return Err(ConfigurationError::Empty("space key"));
        }
        if self.parent_title.trim().is_empty() {
            return Err(ConfigurationError::Empty("parent page title"));
        }
        if self.title_prefix.trim().is_empty() {
            return Err(ConfigurationError::Empty("title prefix"));
        }
        Ok(())
    }

    /// Remote title of a child node: `<prefix> - <title>`.
    #[must_use]
    pub fn page_title(&self, node_title: &str) -> String {
        format!("{} - {node_title}", self.title_prefix)
    }

    /// Title of the snapshot page removed on release.
    #[must_use]
    pub fn snapshot_title(&self) -> String {
        format!("{}-SNAPSHOT", self.title_prefix)
    }
}

/// Page content produced without touching the remote wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Local node title.
    pub node: String,
    /// Computed remote title.
    pub page_title: String,
    /// Parent page title.
    pub parent_title: String,
    /// Rendered markup, `None` when the node has no source.
    pub content: Option<String>,
}

/// Renders node sources into page markup.
///
/// Used by [`PageSyncEngine`] and on its own for offline previews.
pub struct NodeRenderer<'a> {
    content: &'a dyn ContentResolver,
    properties: PropertyResolver,
    renderer: TemplateRenderer,
}

impl<'a> NodeRenderer<'a> {
    /// Create a renderer. Dereferences URI-valued properties once.
    #[must_use]
    pub fn new(config: &RunConfig, content: &'a dyn ContentResolver) -> Self {
        Self {
            content,
            properties: PropertyResolver::new(&config.properties, config.metadata.clone(), content),
            renderer: TemplateRenderer::new(config.template),
        }
    }

    /// Render `node` for the page `page_title` below `parent_title`.
    ///
    /// Returns `None` for nodes without a source.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the source cannot be read or rendered.
    pub fn render(
        &self,
        node: &DocumentNode,
        page_title: &str,
        parent_title: &str,
    ) -> Result<Option<String>, TemplateError> {
        let Some(source) = node.source() else {
            debug!(node = node.title(), "Node has no source, keeping page content");
            return Ok(None);
        };

        let text = self.content.resolve(source)?;
        let props = self.properties.resolve(page_title, parent_title);
        self.renderer.render(&text, &props).map(Some)
    }

    /// Like [`render`](Self::render), keeping the page identity.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the source cannot be read or rendered.
    pub fn render_page(
        &self,
        node: &DocumentNode,
        page_title: &str,
        parent_title: &str,
    ) -> Result<RenderedPage, TemplateError> {
        Ok(RenderedPage {
            node: node.title().to_owned(),
            page_title: page_title.to_owned(),
            parent_title: parent_title.to_owned(),
            content: self.render(node, page_title, parent_title)?,
        })
    }
}

/// Syncs single nodes against a [`WikiGateway`].
pub struct PageSyncEngine<'a> {
    gateway: &'a dyn WikiGateway,
    renderer: NodeRenderer<'a>,
    config: RunConfig,
}

impl<'a> PageSyncEngine<'a> {
    /// Create an engine for one run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `config` is incomplete.
    pub fn new(
        gateway: &'a dyn WikiGateway,
        content: &'a dyn ContentResolver,
        config: RunConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            gateway,
            renderer: NodeRenderer::new(&config, content),
            config,
        })
    }

    /// Run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Sync the home page, titled with the title prefix itself and placed
    /// below the configured parent page.
    pub fn sync_root(&self, node: &DocumentNode) -> SyncOutcome {
        let title = self.config.title_prefix.clone();
        self.sync_page(node, &title, &self.config.parent_title)
    }

    /// Sync a child node below `parent_title`.
    pub fn sync_node(&self, node: &DocumentNode, parent_title: &str) -> SyncOutcome {
        let title = self.config.page_title(node.title());
        self.sync_page(node, &title, parent_title)
    }

    /// Render a child node without any remote call.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the source cannot be read or rendered.
    pub fn render_node(
        &self,
        node: &DocumentNode,
        parent_title: &str,
    ) -> Result<RenderedPage, TemplateError> {
        let page_title = self.config.page_title(node.title());
        self.renderer.render_page(node, &page_title, parent_title)
    }

    fn sync_page(&self, node: &DocumentNode, page_title: &str, parent_title: &str) -> SyncOutcome {
        let mut cleanup = SnapshotCleanup::Skipped;
        let stored = match self.remove_snapshot(parent_title) {
            Ok(result) => {
                cleanup = result;
                self.store(node, page_title, parent_title)
            }
            Err(err) => Err(err.into()),
        };

        let page_id = match stored {
            Ok(id) => id,
            Err(err) => {
                error!(
                    space_key = %self.config.space_key,
                    parent = parent_title,
                    node = node.title(),
                    error = %error_chain(&err),
                    "Failed to sync page"
                );
                let mut outcome = SyncOutcome::failed(node.title(), page_title, err);
                outcome.snapshot_cleanup = cleanup;
                return outcome;
            }
        };

        let mut outcome = SyncOutcome::succeeded(node.title(), page_title, Some(page_id.clone()));
        outcome.snapshot_cleanup = cleanup;
        outcome.label_failures = self.add_labels(node, page_title, &page_id);
        outcome.attachment_failures = self.upload_attachments(node, page_title, &page_id);
        outcome
    }

    fn remove_snapshot(&self, parent_title: &str) -> Result<SnapshotCleanup, GatewayError> {
        if !self.config.remove_snapshots || self.config.metadata.is_snapshot() {
            return Ok(SnapshotCleanup::Skipped);
        }

        let snapshot = self.config.snapshot_title();
        if self
            .gateway
            .delete_page(&self.config.space_key, parent_title, &snapshot)?
        {
            info!(
                space_key = %self.config.space_key,
                parent = parent_title,
                page = %snapshot,
                "Removed snapshot page"
            );
            Ok(SnapshotCleanup::Removed)
        } else {
            debug!(page = %snapshot, "No snapshot page to remove");
            Ok(SnapshotCleanup::NothingToRemove)
        }
    }

    /// Look up or create the page, render content, and store it.
    fn store(
        &self,
        node: &DocumentNode,
        page_title: &str,
        parent_title: &str,
    ) -> Result<String, SyncError> {
        let mut page =
            self.gateway
                .create_or_get_page(&self.config.space_key, parent_title, page_title)?;

        match self.renderer.render(node, page_title, parent_title)? {
            Some(content) => page.content = content,
            None => {
                if let Some(id) = page.id {
                    debug!(page = page_title, id = %id, "Page has no source, left unchanged");
                    return Ok(id);
                }
            }
        }

        let action = if page.is_persisted() { "updated" } else { "created" };
        let RemotePage { id, version, .. } = self.gateway.store_page(page)?;
        let id = id.ok_or_else(|| GatewayError::NotPersisted(page_title.to_owned()))?;

        info!(
            page = page_title,
            id = %id,
            version,
            action,
            "Stored page"
        );
        Ok(id)
    }

    fn add_labels(&self, node: &DocumentNode, page_title: &str, page_id: &str) -> Vec<LabelFailure> {
        let mut failures = Vec::new();
        for label in node.labels() {
            if let Err(error) = self.gateway.add_label(label, page_id) {
                warn!(
                    label = %label,
                    page = page_title,
                    error = %error_chain(&error),
                    "Failed to add label"
                );
                failures.push(LabelFailure {
                    label: label.clone(),
                    error,
                });
            }
        }
        failures
    }

    fn upload_attachments(
        &self,
        node: &DocumentNode,
        page_title: &str,
        page_id: &str,
    ) -> Vec<AttachmentFailure> {
        let mut failures = Vec::new();
        for file in node.attachments() {
            match self.upload(page_id, file) {
                Ok(()) => debug!(file = %file.display(), page = page_title, "Uploaded attachment"),
                Err(error) => {
                    warn!(
                        file = %file.display(),
                        page = page_title,
                        error = %error_chain(&error),
                        "Failed to upload attachment"
                    );
                    failures.push(AttachmentFailure {
                        file: file.clone(),
                        error,
                    });
                }
            }
        }
        failures
    }

    fn upload(&self, page_id: &str, path: &Path) -> Result<(), AttachmentError> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment");
        self.gateway
            .upload_attachment(page_id, filename, &data, guess_content_type(filename))?;
        Ok(())
    }
}

/// Guess an attachment's MIME type from its extension.
fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("txt" | "wiki") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
