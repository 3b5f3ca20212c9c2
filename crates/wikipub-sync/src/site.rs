//! Local document tree discovery.
//!
//! The tree is read from a `site.toml` descriptor when the site directory
//! has one, and from the directory layout otherwise:
//!
//! ```text
//! site_dir/
//! ├── template.wiki        # home page source
//! ├── children/
//! │   ├── install.wiki     # child "install"
//! │   ├── install/         # nested children of "install"
//! │   │   └── linux.wiki
//! │   └── usage.wiki
//! └── attachments/         # attached to the home page
//!     └── logo.png
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::node::{DocumentNode, NodeError};
use crate::resolver::parse_uri;

/// Descriptor filename inside the site directory.
pub const DESCRIPTOR_FILENAME: &str = "site.toml";

/// Title given to the home node when none is configured.
const DEFAULT_HOME_TITLE: &str = "Home";

/// Error discovering the local tree.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Directory or file could not be read.
    #[error("cannot read {}", .path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid TOML or has unknown fields.
    #[error("invalid site descriptor {}", .path.display())]
    Descriptor {
        /// Descriptor path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// Descriptor entry produced an invalid node.
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Where the site lives and how to read it.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    /// Site root. Relative paths in the descriptor resolve against it.
    pub site_dir: PathBuf,
    /// Home page source.
    pub template: PathBuf,
    /// Folder scanned for child sources.
    pub children_dir: PathBuf,
    /// Folder whose files are attached to the home page.
    pub attachments_dir: PathBuf,
    /// Child source extension, starting with `.`.
    pub file_ext: String,
    /// Labels applied to the home page.
    pub labels: Vec<String>,
}

/// Loads the local document tree.
pub struct Site;

impl Site {
    /// Build the root node with all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the descriptor is invalid or a directory
    /// cannot be read.
    pub fn load(options: &SiteOptions) -> Result<DocumentNode, SiteError> {
        let descriptor_path = options.site_dir.join(DESCRIPTOR_FILENAME);
        if descriptor_path.is_file() {
            debug!(path = %descriptor_path.display(), "Loading site descriptor");
            let text = read_to_string(&descriptor_path)?;
            let descriptor: Descriptor =
                toml::from_str(&text).map_err(|e| SiteError::Descriptor {
                    path: descriptor_path.clone(),
                    source: Box::new(e),
                })?;
            return descriptor.into_tree(options);
        }

        debug!(dir = %options.site_dir.display(), "Scanning site directory");
        scan(options)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    #[serde(default)]
    home: HomeEntry,
    #[serde(default)]
    child: Vec<ChildEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HomeEntry {
    title: Option<String>,
    source: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    attachments: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChildEntry {
    name: String,
    source: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    attachments: Vec<PathBuf>,
    #[serde(default)]
    child: Vec<ChildEntry>,
}

impl Descriptor {
    fn into_tree(self, options: &SiteOptions) -> Result<DocumentNode, SiteError> {
        let Self { home, child } = self;

        let mut root = DocumentNode::new(home.title.as_deref().unwrap_or(DEFAULT_HOME_TITLE))?
            .with_file_extension(&options.file_ext)
            .with_labels(options.labels.iter().chain(&home.labels).cloned())?
            .with_attachments(home.attachments.iter().map(|p| options.site_dir.join(p)));

        match home.source {
            Some(source) => root = root.with_source(locator(&options.site_dir, &source)),
            None if options.template.is_file() => {
                root = root.with_source(path_locator(&options.template));
            }
            None => {}
        }

        for entry in child {
            root = root.with_child(entry.into_node(options, &options.children_dir)?);
        }
        Ok(root)
    }
}

impl ChildEntry {
    fn into_node(self, options: &SiteOptions, dir: &Path) -> Result<DocumentNode, SiteError> {
        let mut node = DocumentNode::new(self.name.as_str())?
            .with_file_extension(&options.file_ext)
            .with_labels(self.labels)?
            .with_attachments(self.attachments.iter().map(|p| options.site_dir.join(p)));

        let default_source = dir.join(format!("{}{}", self.name, node.file_extension()));
        match self.source {
            Some(source) => node = node.with_source(locator(&options.site_dir, &source)),
            None if default_source.is_file() => {
                node = node.with_source(path_locator(&default_source));
            }
            None => debug!(node = %self.name, "Child has no source"),
        }

        let nested_dir = dir.join(&self.name);
        for entry in self.child {
            node = node.with_child(entry.into_node(options, &nested_dir)?);
        }
        Ok(node)
    }
}

/// Keep URIs as they are, resolve plain paths against `base`.
fn locator(base: &Path, source: &str) -> String {
    if parse_uri(source).is_some() {
        source.to_owned()
    } else {
        path_locator(&base.join(source))
    }
}

fn path_locator(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn scan(options: &SiteOptions) -> Result<DocumentNode, SiteError> {
    let mut root = DocumentNode::new(DEFAULT_HOME_TITLE)?
        .with_file_extension(&options.file_ext)
        .with_labels(options.labels.iter().cloned())?;

    if options.template.is_file() {
        root = root.with_source(path_locator(&options.template));
    } else {
        debug!(path = %options.template.display(), "No home page template");
    }

    if options.attachments_dir.is_dir() {
        root = root.with_attachments(list_files(&options.attachments_dir)?);
    }

    if options.children_dir.is_dir() {
        for child in scan_children(&options.children_dir, &options.file_ext)? {
            root = root.with_child(child);
        }
    }
    Ok(root)
}

/// Entries of one children folder, grouped by title.
#[derive(Default)]
struct Entry {
    source: Option<PathBuf>,
    dir: Option<PathBuf>,
}

fn scan_children(dir: &Path, ext: &str) -> Result<Vec<DocumentNode>, SiteError> {
    let mut entries: BTreeMap<String, Entry> = BTreeMap::new();

    for path in read_dir(dir)? {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "Skipping non UTF-8 file name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            entries.entry(name.to_owned()).or_default().dir = Some(path.clone());
        } else if let Some(stem) = name.strip_suffix(ext)
            && !stem.is_empty()
        {
            entries.entry(stem.to_owned()).or_default().source = Some(path.clone());
        }
    }

    let mut nodes = Vec::with_capacity(entries.len());
    for (title, entry) in entries {
        let mut node = DocumentNode::new(title)?.with_file_extension(ext);
        if let Some(source) = &entry.source {
            node = node.with_source(path_locator(source));
        }
        if let Some(sub) = &entry.dir {
            for child in scan_children(sub, ext)? {
                node = node.with_child(child);
            }
        }
        nodes.push(node);
    }
    Ok(nodes)
}

/// Regular, non-hidden files of `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SiteError> {
    Ok(read_dir(dir)?
        .into_iter()
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect())
}

/// Paths of `dir`, sorted.
fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, SiteError> {
    let io_err = |source| SiteError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn read_to_string(path: &Path) -> Result<String, SiteError> {
    std::fs::read_to_string(path).map_err(|source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    })
}
