//! Configuration management for wikipub.
//!
//! Parses `wikipub.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `confluence.base_url`
//! - `confluence.username`
//! - `confluence.password`
//! - `confluence.token`
//! - `publish.space_key`
//! - `project.version`
//!
//! Values in `[properties]` are never expanded: they are handed to the
//! template engine as-is, where `${name}` has its own meaning.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override target space key.
    pub space_key: Option<String>,
    /// Override parent page title.
    pub parent_page: Option<String>,
    /// Override home page title (also used as title prefix).
    pub title: Option<String>,
    /// Override project version.
    pub version: Option<String>,
    /// Override snapshot removal flag.
    pub remove_snapshots: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wikipub.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence connection configuration.
    pub confluence: Option<ConfluenceConfig>,
    /// Publication settings.
    pub publish: PublishConfig,
    /// Project metadata exposed to templates.
    pub project: ProjectConfig,
    /// Explicit template properties. URI-valued entries are dereferenced
    /// at publish time.
    pub properties: BTreeMap<String, String>,

    /// Resolved site layout (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Publication settings (`[publish]`).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Target space key. Required for publishing.
    pub space_key: Option<String>,
    /// Title of the page under which the home page is published.
    pub parent_page: String,
    /// Home page title, also the prefix of every child page title.
    pub title: Option<String>,
    /// Remove the `<title>-SNAPSHOT` page when publishing a release.
    pub remove_snapshots: bool,
    /// Labels attached to the home page.
    pub labels: Vec<String>,
    /// Extension of child page sources.
    pub file_ext: String,
    site_dir: Option<String>,
    template: Option<String>,
    children_dir: Option<String>,
    attachments_dir: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            space_key: None,
            parent_page: "Home".to_owned(),
            title: None,
            remove_snapshots: false,
            labels: Vec::new(),
            file_ext: ".wiki".to_owned(),
            site_dir: None,
            template: None,
            children_dir: None,
            attachments_dir: None,
        }
    }
}

/// Resolved site layout with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Directory holding the site sources (and the optional `site.toml`).
    pub site_dir: PathBuf,
    /// Home page template.
    pub template: PathBuf,
    /// Folder scanned for child page sources.
    pub children_dir: PathBuf,
    /// Folder whose files are attached to the home page.
    pub attachments_dir: PathBuf,
    /// Child source extension, always starting with `.`.
    pub file_ext: String,
}

/// Project metadata (`[project]`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Artifact identifier.
    pub artifact_id: Option<String>,
    /// Group identifier.
    pub group_id: Option<String>,
    /// Project version. A `-SNAPSHOT` suffix marks a development build.
    pub version: Option<String>,
    /// Human-readable project name.
    pub name: Option<String>,
    /// Project description.
    pub description: Option<String>,
    /// Additional project properties.
    pub properties: BTreeMap<String, String>,
}

impl ProjectConfig {
    /// Whether the configured version is a snapshot build.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.ends_with("-SNAPSHOT"))
    }
}

/// Body representation used when storing page content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Confluence wiki markup, converted server-side.
    #[default]
    Wiki,
    /// Confluence XHTML storage format.
    Storage,
}

impl Representation {
    /// Name used in the REST API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wiki => "wiki",
            Self::Storage => "storage",
        }
    }
}

/// Confluence configuration.
#[derive(Debug, Deserialize)]
pub struct ConfluenceConfig {
    /// Confluence server base URL.
    pub base_url: String,
    /// Username for HTTP Basic authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for HTTP Basic authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Personal access token (takes precedence over username/password).
    #[serde(default)]
    pub token: Option<String>,
    /// Body representation of page sources.
    #[serde(default)]
    pub representation: Representation,
}

impl ConfluenceConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "confluence.base_url")?;
        require_http_url(&self.base_url, "confluence.base_url")?;

        if let Some(token) = &self.token {
            return require_non_empty(token, "confluence.token");
        }
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => {
                require_non_empty(user, "confluence.username")?;
                require_non_empty(password, "confluence.password")
            }
            _ => Err(ConfigError::Validation(
                "confluence requires either token or username and password".to_owned(),
            )),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.password`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_PASSWORD`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Prefix an extension with `.` when missing.
fn normalize_ext(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_owned()
    } else {
        format!(".{ext}")
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wikipub.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(space_key) = &settings.space_key {
            self.publish.space_key = Some(space_key.clone());
        }
        if let Some(parent_page) = &settings.parent_page {
            self.publish.parent_page.clone_from(parent_page);
        }
        if let Some(title) = &settings.title {
            self.publish.title = Some(title.clone());
        }
        if let Some(version) = &settings.version {
            self.project.version = Some(version.clone());
        }
        if let Some(remove_snapshots) = settings.remove_snapshots {
            self.publish.remove_snapshots = remove_snapshots;
        }
    }

    /// Get validated Confluence configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_confluence(&self) -> Result<&ConfluenceConfig, ConfigError> {
        let conf = self.confluence.as_ref().ok_or_else(|| {
            ConfigError::Validation("[confluence] section required in config".into())
        })?;
        conf.validate()?;
        Ok(conf)
    }

    /// Get the target space key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no space key is configured.
    pub fn require_space_key(&self) -> Result<&str, ConfigError> {
        let key = self.publish.space_key.as_deref().ok_or_else(|| {
            ConfigError::Validation("publish.space_key is required".to_owned())
        })?;
        require_non_empty(key, "publish.space_key")?;
        Ok(key)
    }

    /// Home page title.
    ///
    /// Falls back to `<artifact_id>-<version>` when no explicit title is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if neither source is available.
    pub fn effective_title(&self) -> Result<String, ConfigError> {
        if let Some(title) = &self.publish.title {
            require_non_empty(title, "publish.title")?;
            return Ok(title.clone());
        }
        match (&self.project.artifact_id, &self.project.version) {
            (Some(artifact), Some(version)) => Ok(format!("{artifact}-{version}")),
            _ => Err(ConfigError::Validation(
                "publish.title is required when project.artifact_id or project.version is missing"
                    .to_owned(),
            )),
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self::default();
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Connection settings are validated lazily by [`Config::require_confluence`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.publish.parent_page, "publish.parent_page")?;
        require_non_empty(&self.publish.file_ext, "publish.file_ext")?;
        if self.publish.file_ext == "." {
            return Err(ConfigError::Validation(
                "publish.file_ext must name an extension".to_owned(),
            ));
        }
        if let Some(key) = &self.publish.space_key {
            require_non_empty(key, "publish.space_key")?;
        }
        if self.publish.labels.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "publish.labels cannot contain empty labels".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut confluence) = self.confluence {
            confluence.base_url = expand::expand_env(&confluence.base_url, "confluence.base_url")?;
            expand::expand_opt(&mut confluence.username, "confluence.username")?;
            expand::expand_opt(&mut confluence.password, "confluence.password")?;
            expand::expand_opt(&mut confluence.token, "confluence.token")?;
        }
        expand::expand_opt(&mut self.publish.space_key, "publish.space_key")?;
        expand::expand_opt(&mut self.project.version, "project.version")?;
        Ok(())
    }

    /// Resolve the site layout relative to the config directory.
    ///
    /// `template`, `children_dir` and `attachments_dir` are relative to
    /// `site_dir`, which is relative to the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let site_dir = config_dir.join(
            self.publish
                .site_dir
                .as_deref()
                .unwrap_or("src/site/confluence"),
        );
        let resolve = |path: Option<&str>, default: &str| site_dir.join(path.unwrap_or(default));

        self.site_resolved = SiteConfig {
            template: resolve(self.publish.template.as_deref(), "template.wiki"),
            children_dir: resolve(self.publish.children_dir.as_deref(), "children"),
            attachments_dir: resolve(self.publish.attachments_dir.as_deref(), "attachments"),
            file_ext: normalize_ext(&self.publish.file_ext),
            site_dir,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/project"));
        assert_eq!(config.publish.parent_page, "Home");
        assert!(!config.publish.remove_snapshots);
        assert!(config.publish.space_key.is_none());
        assert_eq!(
            config.site_resolved.site_dir,
            PathBuf::from("/project/src/site/confluence")
        );
        assert_eq!(
            config.site_resolved.template,
            PathBuf::from("/project/src/site/confluence/template.wiki")
        );
        assert_eq!(
            config.site_resolved.children_dir,
            PathBuf::from("/project/src/site/confluence/children")
        );
        assert_eq!(config.site_resolved.file_ext, ".wiki");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.publish.parent_page, "Home");
        assert!(config.confluence.is_none());
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[confluence]
base_url = "https://confluence.example.com"
username = "deployer"
password = "secret"
representation = "storage"

[publish]
space_key = "DOC"
parent_page = "Libraries"
title = "mylib-1.0"
remove_snapshots = true
labels = ["doc", "mylib"]
file_ext = "txt"

[project]
artifact_id = "mylib"
version = "1.0"

[project.properties]
"project.url" = "https://example.org"

[properties]
changelog = "file:///tmp/CHANGES.txt"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let confluence = config.confluence.as_ref().unwrap();
        assert_eq!(confluence.username.as_deref(), Some("deployer"));
        assert_eq!(confluence.representation, Representation::Storage);
        assert_eq!(config.publish.space_key.as_deref(), Some("DOC"));
        assert_eq!(config.publish.parent_page, "Libraries");
        assert!(config.publish.remove_snapshots);
        assert_eq!(config.publish.labels, vec!["doc", "mylib"]);
        assert_eq!(
            config.project.properties.get("project.url").map(String::as_str),
            Some("https://example.org")
        );
        assert_eq!(
            config.properties.get("changelog").map(String::as_str),
            Some("file:///tmp/CHANGES.txt")
        );
    }

    #[test]
    fn test_resolve_paths_custom_layout() {
        let toml = r#"
[publish]
site_dir = "docs/wiki"
template = "home.wiki"
children_dir = "pages"
file_ext = "confluence"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.site_resolved.template,
            PathBuf::from("/project/docs/wiki/home.wiki")
        );
        assert_eq!(
            config.site_resolved.children_dir,
            PathBuf::from("/project/docs/wiki/pages")
        );
        assert_eq!(
            config.site_resolved.attachments_dir,
            PathBuf::from("/project/docs/wiki/attachments")
        );
        assert_eq!(config.site_resolved.file_ext, ".confluence");
    }

    #[test]
    fn test_is_snapshot() {
        let mut project = ProjectConfig::default();
        assert!(!project.is_snapshot());
        project.version = Some("1.0-SNAPSHOT".to_owned());
        assert!(project.is_snapshot());
        project.version = Some("1.0".to_owned());
        assert!(!project.is_snapshot());
    }

    #[test]
    fn test_effective_title_explicit() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.publish.title = Some("My Library".to_owned());
        assert_eq!(config.effective_title().unwrap(), "My Library");
    }

    #[test]
    fn test_effective_title_from_project() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.project.artifact_id = Some("mylib".to_owned());
        config.project.version = Some("2.0".to_owned());
        assert_eq!(config.effective_title().unwrap(), "mylib-2.0");
    }

    #[test]
    fn test_effective_title_missing() {
        let config = Config::default_with_base(Path::new("/project"));
        let err = config.effective_title().unwrap_err();
        assert!(err.to_string().contains("publish.title"));
    }

    #[test]
    fn test_require_space_key() {
        let mut config = Config::default_with_base(Path::new("/project"));
        assert!(config.require_space_key().is_err());
        config.publish.space_key = Some("DOC".to_owned());
        assert_eq!(config.require_space_key().unwrap(), "DOC");
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/project"));
        let overrides = CliSettings {
            space_key: Some("OPS".to_owned()),
            version: Some("3.1".to_owned()),
            remove_snapshots: Some(true),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.publish.space_key.as_deref(), Some("OPS"));
        assert_eq!(config.project.version.as_deref(), Some("3.1"));
        assert!(config.publish.remove_snapshots);
        assert_eq!(config.publish.parent_page, "Home"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.apply_cli_settings(&CliSettings::default());
        assert!(config.publish.space_key.is_none());
        assert!(config.publish.title.is_none());
    }

    #[test]
    fn test_expand_env_vars_confluence() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WIKIPUB_CFG_URL", "https://wiki.test.com");
            std::env::set_var("WIKIPUB_CFG_TOKEN", "tok-123");
        }

        let toml = r#"
[confluence]
base_url = "${WIKIPUB_CFG_URL}"
token = "${WIKIPUB_CFG_TOKEN}"

[publish]
space_key = "${WIKIPUB_CFG_SPACE:-DOC}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        let confluence = config.confluence.as_ref().unwrap();
        assert_eq!(confluence.base_url, "https://wiki.test.com");
        assert_eq!(confluence.token.as_deref(), Some("tok-123"));
        assert_eq!(config.publish.space_key.as_deref(), Some("DOC"));

        unsafe {
            std::env::remove_var("WIKIPUB_CFG_URL");
            std::env::remove_var("WIKIPUB_CFG_TOKEN");
        }
    }

    #[test]
    fn test_properties_are_not_expanded() {
        let toml = r#"
[properties]
greeting = "${version}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        assert_eq!(config.properties["greeting"], "${version}");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[publish]
space_key = "DOC"
site_dir = "site"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.publish.space_key.as_deref(), Some("DOC"));
        assert_eq!(config.site_resolved.site_dir, dir.path().join("site"));
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/wikipub.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    // Validation tests

    fn assert_validation_error(result: Result<(), ConfigError>, expected_substrings: &[&str]) {
        let err = result.expect_err("Expected validation to fail");
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    fn valid_confluence_config() -> ConfluenceConfig {
        ConfluenceConfig {
            base_url: "https://confluence.example.com".to_owned(),
            username: Some("deployer".to_owned()),
            password: Some("secret".to_owned()),
            token: None,
            representation: Representation::Wiki,
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/project"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_label() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.publish.labels = vec!["doc".to_owned(), " ".to_owned()];
        assert_validation_error(config.validate(), &["labels"]);
    }

    #[test]
    fn test_validate_empty_parent_page() {
        let mut config = Config::default_with_base(Path::new("/project"));
        config.publish.parent_page = String::new();
        assert_validation_error(config.validate(), &["publish.parent_page", "empty"]);
    }

    #[test]
    fn test_confluence_config_validate_valid() {
        assert!(valid_confluence_config().validate().is_ok());
    }

    #[test]
    fn test_confluence_config_validate_token_only() {
        let config = ConfluenceConfig {
            username: None,
            password: None,
            token: Some("tok".to_owned()),
            ..valid_confluence_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_confluence_config_validate_missing_credentials() {
        let config = ConfluenceConfig {
            password: None,
            ..valid_confluence_config()
        };
        assert_validation_error(config.validate(), &["token", "password"]);
    }

    #[test]
    fn test_confluence_config_validate_invalid_url() {
        let config = ConfluenceConfig {
            base_url: "not-a-url".to_owned(),
            ..valid_confluence_config()
        };
        assert_validation_error(config.validate(), &["base_url", "http"]);
    }

    #[test]
    fn test_config_require_confluence_missing_section() {
        let config = Config::default_with_base(Path::new("/project"));
        let err = config.require_confluence().unwrap_err();
        assert!(err.to_string().contains("[confluence]"));
    }
}
