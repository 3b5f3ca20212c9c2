//! Page tree synchronization for wikipub.
//!
//! This crate publishes a local tree of documentation sources to a remote
//! wiki space. Each local [`DocumentNode`] becomes one remote page titled
//! `<prefix> - <title>`, rendered from its source with project properties.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`PropertyResolver`] building the per-page [`PropertySet`]
//! - [`TemplateRenderer`] substituting properties into page sources
//! - [`WikiGateway`] trait abstracting the remote wiki
//! - [`PageSyncEngine`] syncing one node: cleanup, lookup, render, store, labels
//! - [`SyncController`] walking the whole tree, collecting a [`SyncReport`]
//! - [`Site`] discovering the local tree from disk
//! - [`MockGateway`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use wikipub_sync::{PageSyncEngine, RunConfig, Site, SyncController, UriResolver};
//!
//! let root = Site::load(&options)?;
//! let content = UriResolver::new(&options.site_dir);
//! let engine = PageSyncEngine::new(&client, &content, run_config)?;
//! let report = SyncController::new(&engine).sync_tree(&root);
//! if !report.is_success() {
//!     std::process::exit(1);
//! }
//! ```

mod controller;
mod engine;
mod error;
mod gateway;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod node;
mod outcome;
mod page;
mod properties;
mod resolver;
mod site;
mod template;

pub use controller::{SyncController, preview_tree};
pub use engine::{NodeRenderer, PageSyncEngine, RenderedPage, RunConfig};
pub use error::{ConfigurationError, GatewayError, SyncError, error_chain};
pub use gateway::WikiGateway;
#[cfg(any(test, feature = "mock"))]
pub use mock::{GatewayCall, MockGateway};
pub use node::{DEFAULT_FILE_EXT, DocumentNode, NodeError};
pub use outcome::{
    AttachmentError, AttachmentFailure, LabelFailure, SnapshotCleanup, SyncOutcome, SyncReport,
};
pub use page::{PageLookup, RemotePage};
pub use properties::{DERIVED_KEYS, ProjectMetadata, PropertyResolver, PropertySet};
pub use resolver::{ContentResolver, ResolveError, UriResolver, parse_uri};
pub use site::{DESCRIPTOR_FILENAME, Site, SiteError, SiteOptions};
pub use template::{TemplateError, TemplateOptions, TemplateRenderer};
