//! Per-node sync results.

use std::path::PathBuf;

use crate::error::{GatewayError, SyncError, error_chain};

/// What snapshot cleanup did before a node was synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotCleanup {
    /// Cleanup disabled, or the current build is itself a snapshot.
    #[default]
    Skipped,
    /// Cleanup ran but no snapshot page existed.
    NothingToRemove,
    /// The snapshot page was deleted.
    Removed,
}

/// A label that could not be attached.
#[derive(Debug)]
pub struct LabelFailure {
    /// Label name.
    pub label: String,
    /// Why it failed.
    pub error: GatewayError,
}

/// An attachment that could not be uploaded.
#[derive(Debug)]
pub struct AttachmentFailure {
    /// Local file.
    pub file: PathBuf,
    /// Why it failed.
    pub error: AttachmentError,
}

/// Error uploading one attachment.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// Local file could not be read.
    #[error("cannot read attachment")]
    Io(#[from] std::io::Error),
    /// Upload was rejected.
    #[error("upload failed")]
    Gateway(#[from] GatewayError),
}

/// Result of syncing one node.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Local node title.
    pub node: String,
    /// Computed remote page title.
    pub page_title: String,
    /// Whether the page was stored.
    pub success: bool,
    /// Remote id, present on success.
    pub page_id: Option<String>,
    /// Failure cause, present on failure.
    pub error: Option<SyncError>,
    /// Snapshot cleanup result.
    pub snapshot_cleanup: SnapshotCleanup,
    /// Labels that could not be attached. Never fails the node.
    pub label_failures: Vec<LabelFailure>,
    /// Attachments that could not be uploaded. Never fails the node.
    pub attachment_failures: Vec<AttachmentFailure>,
}

impl SyncOutcome {
    pub(crate) fn succeeded(node: &str, page_title: &str, page_id: Option<String>) -> Self {
        Self {
            node: node.to_owned(),
            page_title: page_title.to_owned(),
            success: true,
            page_id,
            error: None,
            snapshot_cleanup: SnapshotCleanup::Skipped,
            label_failures: Vec::new(),
            attachment_failures: Vec::new(),
        }
    }

    pub(crate) fn failed(node: &str, page_title: &str, error: SyncError) -> Self {
        Self {
            node: node.to_owned(),
            page_title: page_title.to_owned(),
            success: false,
            page_id: None,
            error: Some(error),
            snapshot_cleanup: SnapshotCleanup::Skipped,
            label_failures: Vec::new(),
            attachment_failures: Vec::new(),
        }
    }

    /// Full error message with causes, if the node failed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| error_chain(e))
    }

    /// Whether the node succeeded but some labels or attachments did not.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.label_failures.is_empty() || !self.attachment_failures.is_empty()
    }
}

/// Outcomes of a whole run, in processing order.
#[derive(Debug, Default)]
pub struct SyncReport {
    outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome.
    pub fn push(&mut self, outcome: SyncOutcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    /// True iff every node succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no node was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl IntoIterator for SyncReport {
    type Item = SyncOutcome;
    type IntoIter = std::vec::IntoIter<SyncOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        assert!(SyncReport::new().is_success());
    }

    #[test]
    fn test_one_failure_fails_report() {
        let mut report = SyncReport::new();
        report.push(SyncOutcome::succeeded("A", "P - A", Some("1".to_owned())));
        report.push(SyncOutcome::failed(
            "B",
            "P - B",
            SyncError::from(GatewayError::remote("boom")),
        ));

        assert!(!report.is_success());
        let failed: Vec<_> = report.failures().map(|o| o.node.as_str()).collect();
        assert_eq!(failed, ["B"]);
        assert_eq!(
            report.outcomes()[1].error_message().as_deref(),
            Some("remote error: boom")
        );
    }
}
