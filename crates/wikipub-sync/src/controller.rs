//! Tree traversal for a sync run.

use tracing::{error, info, warn};

use crate::engine::{NodeRenderer, PageSyncEngine, RenderedPage, RunConfig};
use crate::node::DocumentNode;
use crate::outcome::{SyncOutcome, SyncReport};
use crate::template::TemplateError;

/// Walks a document tree and syncs every node, root first, then children
/// depth-first in source order.
pub struct SyncController<'e, 'a> {
    engine: &'e PageSyncEngine<'a>,
}

impl<'e, 'a> SyncController<'e, 'a> {
    /// Create a controller driving `engine`.
    #[must_use]
    pub fn new(engine: &'e PageSyncEngine<'a>) -> Self {
        Self { engine }
    }

    /// Sync `root` and all of its descendants.
    ///
    /// A failed node does not stop the run. Its children are still synced
    /// below the title the failed page would have had.
    pub fn sync_tree(&self, root: &DocumentNode) -> SyncReport {
        let mut report = SyncReport::new();

        let outcome = self.engine.sync_root(root);
        log_outcome(&outcome);
        let root_title = outcome.page_title.clone();
        report.push(outcome);

        self.sync_children(root, &root_title, &mut report);
        report
    }

    fn sync_children(&self, parent: &DocumentNode, parent_title: &str, report: &mut SyncReport) {
        for child in parent.children() {
            let outcome = self.engine.sync_node(child, parent_title);
            log_outcome(&outcome);
            let title = outcome.page_title.clone();
            report.push(outcome);

            self.sync_children(child, &title, report);
        }
    }
}

fn log_outcome(outcome: &SyncOutcome) {
    if outcome.success {
        info!(
            node = %outcome.node,
            page = %outcome.page_title,
            id = outcome.page_id.as_deref().unwrap_or_default(),
            "Synced page"
        );
        if outcome.has_warnings() {
            warn!(
                page = %outcome.page_title,
                labels = outcome.label_failures.len(),
                attachments = outcome.attachment_failures.len(),
                "Page synced with failures"
            );
        }
    } else {
        error!(
            node = %outcome.node,
            page = %outcome.page_title,
            error = %outcome.error_message().unwrap_or_default(),
            "Failed to sync node"
        );
    }
}

/// Render every node of the tree without remote calls, in sync order.
///
/// Each entry pairs the computed page title with its render result.
pub fn preview_tree(
    renderer: &NodeRenderer<'_>,
    config: &RunConfig,
    root: &DocumentNode,
) -> Vec<(String, Result<RenderedPage, TemplateError>)> {
    let mut pages = Vec::new();
    let root_title = config.title_prefix.clone();
    pages.push((
        root_title.clone(),
        renderer.render_page(root, &root_title, &config.parent_title),
    ));
    preview_children(renderer, config, root, &root_title, &mut pages);
    pages
}

fn preview_children(
    renderer: &NodeRenderer<'_>,
    config: &RunConfig,
    parent: &DocumentNode,
    parent_title: &str,
    pages: &mut Vec<(String, Result<RenderedPage, TemplateError>)>,
) {
    for child in parent.children() {
        let title = config.page_title(child.title());
        pages.push((title.clone(), renderer.render_page(child, &title, parent_title)));
        preview_children(renderer, config, child, &title, pages);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::mock::MockGateway;
    use crate::properties::ProjectMetadata;
    use crate::resolver::UriResolver;
    use crate::template::TemplateOptions;

    fn config() -> RunConfig {
        RunConfig {
            space_key: "DOC".to_owned(),
            parent_title: "Home".to_owned(),
            title_prefix: "MyLib".to_owned(),
            remove_snapshots: false,
            metadata: ProjectMetadata {
                version: Some("2.0".to_owned()),
                ..ProjectMetadata::default()
            },
            properties: BTreeMap::new(),
            template: TemplateOptions::default(),
        }
    }

    fn node(title: &str, source: Option<&str>) -> DocumentNode {
        let node = DocumentNode::new(title).unwrap();
        match source {
            Some(source) => node.with_source(source),
            None => node,
        }
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("home.wiki"), "Home ${version}").unwrap();
        std::fs::write(dir.path().join("a.wiki"), "A in ${parentPageTitle}").unwrap();
        std::fs::write(dir.path().join("c.wiki"), "C").unwrap();
        std::fs::write(dir.path().join("linux.wiki"), "Linux in ${parentPageTitle}").unwrap();
        dir
    }

    #[test]
    fn test_sync_tree_order_and_parents() {
        let dir = fixture();
        let gateway = MockGateway::new();
        let content = UriResolver::new(dir.path());
        let engine = PageSyncEngine::new(&gateway, &content, config()).unwrap();
        let root = node("Home", Some("home.wiki"))
            .with_child(node("A", Some("a.wiki")).with_child(node("Linux", Some("linux.wiki"))))
            .with_child(node("C", Some("c.wiki")));

        let report = SyncController::new(&engine).sync_tree(&root);

        assert!(report.is_success());
        let titles: Vec<_> = report.outcomes().iter().map(|o| o.page_title.as_str()).collect();
        assert_eq!(titles, ["MyLib", "MyLib - A", "MyLib - Linux", "MyLib - C"]);
        assert_eq!(gateway.page("MyLib - A").unwrap().content, "A in MyLib");
        let linux = gateway.page("MyLib - Linux").unwrap();
        assert_eq!(linux.parent_title, "MyLib - A");
        assert_eq!(linux.content, "Linux in MyLib - A");
    }

    #[test]
    fn test_failed_node_does_not_stop_run() {
        let dir = fixture();
        let gateway = MockGateway::new();
        let content = UriResolver::new(dir.path());
        let engine = PageSyncEngine::new(&gateway, &content, config()).unwrap();
        let root = node("Home", Some("home.wiki"))
            .with_child(node("A", Some("a.wiki")))
            .with_child(node("B", Some("missing.wiki")).with_child(node("Linux", Some("linux.wiki"))))
            .with_child(node("C", Some("c.wiki")));

        let report = SyncController::new(&engine).sync_tree(&root);

        assert!(!report.is_success());
        assert_eq!(report.len(), 5);
        let failed: Vec<_> = report.failures().map(|o| o.node.as_str()).collect();
        assert_eq!(failed, ["B"]);
        assert_eq!(
            gateway.page("MyLib - Linux").unwrap().parent_title,
            "MyLib - B"
        );
        assert!(gateway.page("MyLib - C").is_some());
    }

    #[test]
    fn test_store_failure_isolated() {
        let dir = fixture();
        let gateway = MockGateway::new().failing_store("MyLib - A");
        let content = UriResolver::new(dir.path());
        let engine = PageSyncEngine::new(&gateway, &content, config()).unwrap();
        let root = node("Home", None)
            .with_child(node("A", Some("a.wiki")))
            .with_child(node("C", Some("c.wiki")));

        let report = SyncController::new(&engine).sync_tree(&root);

        let success: Vec<_> = report.outcomes().iter().map(|o| o.success).collect();
        assert_eq!(success, [true, false, true]);
        assert!(
            report.outcomes()[1]
                .error_message()
                .unwrap()
                .contains("rejected")
        );
    }

    #[test]
    fn test_snapshot_delete_failure_isolated() {
        let dir = fixture();
        let gateway = MockGateway::new()
            .with_page("DOC", "Home", "MyLib-SNAPSHOT", "old")
            .failing_deletes_under("Home");
        let content = UriResolver::new(dir.path());
        let mut config = config();
        config.remove_snapshots = true;
        let engine = PageSyncEngine::new(&gateway, &content, config).unwrap();
        let root = node("Home", Some("home.wiki"))
            .with_child(node("A", Some("a.wiki")))
            .with_child(node("C", Some("c.wiki")));

        let report = SyncController::new(&engine).sync_tree(&root);

        let success: Vec<_> = report.outcomes().iter().map(|o| o.success).collect();
        assert_eq!(success, [false, true, true]);
        assert_eq!(report.outcomes()[0].page_id, None);
        assert!(gateway.page("MyLib").is_none());
        assert!(gateway.page("MyLib-SNAPSHOT").is_some());
        assert_eq!(gateway.page("MyLib - A").unwrap().parent_title, "MyLib");
        assert!(gateway.page("MyLib - C").is_some());
    }

    #[test]
    fn test_preview_tree_makes_no_remote_calls() {
        let dir = fixture();
        let content = UriResolver::new(dir.path());
        let config = config();
        let renderer = NodeRenderer::new(&config, &content);
        let root = node("Home", Some("home.wiki"))
            .with_child(node("A", Some("a.wiki")))
            .with_child(node("B", Some("missing.wiki")));

        let pages = preview_tree(&renderer, &config, &root);

        let titles: Vec<_> = pages.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(titles, ["MyLib", "MyLib - A", "MyLib - B"]);
        assert_eq!(
            pages[0].1.as_ref().unwrap().content.as_deref(),
            Some("Home 2.0")
        );
        assert!(pages[2].1.is_err());
    }
}
