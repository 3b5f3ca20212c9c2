//! `wikipub publish` command implementation.

use std::path::PathBuf;

use clap::Args;
use wikipub_config::{CliSettings, Config};
use wikipub_confluence::ConfluenceClient;
use wikipub_sync::{
    DocumentNode, NodeRenderer, PageSyncEngine, ProjectMetadata, RunConfig, Site, SiteOptions,
    SnapshotCleanup, SyncController, SyncReport, TemplateOptions, UriResolver, error_chain,
    preview_tree,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Path to configuration file (default: auto-discover wikipub.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target space key (overrides config).
    #[arg(long, env = "WIKIPUB_SPACE_KEY")]
    space_key: Option<String>,

    /// Page under which the home page is published (overrides config).
    #[arg(long)]
    parent_page: Option<String>,

    /// Home page title, also prefixed to every child title (overrides config).
    #[arg(long)]
    title: Option<String>,

    /// Project version (overrides config).
    #[arg(long = "version", value_name = "VERSION")]
    project_version: Option<String>,

    /// Delete the `<title>-SNAPSHOT` page when publishing a release.
    #[arg(long)]
    remove_snapshots: bool,

    /// Render every page without contacting Confluence.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any page fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            space_key: self.space_key.clone(),
            parent_page: self.parent_page.clone(),
            title: self.title.clone(),
            version: self.project_version.clone(),
            remove_snapshots: self.remove_snapshots.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let run_config = run_config(&config)?;
        run_config.validate()?;
        let root = Site::load(&site_options(&config))?;
        let content = UriResolver::new(&config.site_resolved.site_dir);

        if self.dry_run {
            let renderer = NodeRenderer::new(&run_config, &content);
            return preview(&output, &renderer, &run_config, &root);
        }

        let client = ConfluenceClient::from_config(config.require_confluence()?)?;
        let engine = PageSyncEngine::new(&client, &content, run_config)?;

        output.status(&format!(
            "Publishing '{}' to space {} below '{}'...",
            engine.config().title_prefix,
            engine.config().space_key,
            engine.config().parent_title
        ));
        let report = SyncController::new(&engine).sync_tree(&root);
        print_report(&output, &client, &report);

        let failed = report.failures().count();
        if failed > 0 {
            return Err(CliError::SyncFailed {
                failed,
                total: report.len(),
            });
        }
        Ok(())
    }
}

/// Build the run configuration from loaded config.
fn run_config(config: &Config) -> Result<RunConfig, CliError> {
    let project = &config.project;
    Ok(RunConfig {
        space_key: config.require_space_key()?.to_owned(),
        parent_title: config.publish.parent_page.clone(),
        title_prefix: config.effective_title()?,
        remove_snapshots: config.publish.remove_snapshots,
        metadata: ProjectMetadata {
            artifact_id: project.artifact_id.clone(),
            group_id: project.group_id.clone(),
            version: project.version.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            properties: project.properties.clone(),
        },
        properties: config.properties.clone(),
        template: TemplateOptions::default(),
    })
}

fn site_options(config: &Config) -> SiteOptions {
    let site = &config.site_resolved;
    SiteOptions {
        site_dir: site.site_dir.clone(),
        template: site.template.clone(),
        children_dir: site.children_dir.clone(),
        attachments_dir: site.attachments_dir.clone(),
        file_ext: site.file_ext.clone(),
        labels: config.publish.labels.clone(),
    }
}

fn preview(
    output: &Output,
    renderer: &NodeRenderer<'_>,
    config: &RunConfig,
    root: &DocumentNode,
) -> Result<(), CliError> {
    output.heading("[DRY RUN] No changes made.");

    let pages = preview_tree(renderer, config, root);
    let total = pages.len();
    let mut failed = 0;
    for (title, result) in pages {
        output.rule();
        match result {
            Ok(page) => {
                output.heading(&format!("{title}  (parent: {})", page.parent_title));
                match page.content {
                    Some(content) => output.status(&content),
                    None => output.status("(no source, existing content kept)"),
                }
            }
            Err(err) => {
                failed += 1;
                output.page_failed(&title, &error_chain(&err));
            }
        }
    }
    output.rule();
    output.summary("rendered", total, failed);

    if failed > 0 {
        return Err(CliError::SyncFailed { failed, total });
    }
    Ok(())
}

fn print_report(output: &Output, client: &ConfluenceClient, report: &SyncReport) {
    for outcome in report.outcomes() {
        let Some(page_id) = &outcome.page_id else {
            output.page_failed(
                &outcome.page_title,
                &outcome.error_message().unwrap_or_default(),
            );
            continue;
        };

        output.published(&outcome.page_title, &client.page_url(page_id));
        if outcome.snapshot_cleanup == SnapshotCleanup::Removed {
            output.detail("removed snapshot page");
        }
        for failure in &outcome.label_failures {
            output.problem(&format!(
                "label '{}' not added: {}",
                failure.label,
                error_chain(&failure.error)
            ));
        }
        for failure in &outcome.attachment_failures {
            output.problem(&format!(
                "attachment {} not uploaded: {}",
                failure.file.display(),
                error_chain(&failure.error)
            ));
        }
    }

    output.summary("published", report.len(), report.failures().count());
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn load(toml: &str) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wikipub.toml");
        std::fs::write(&path, toml).unwrap();
        let config = Config::load(Some(&path), None).unwrap();
        (dir, config)
    }

    #[test]
    fn test_run_config_from_config() {
        let (_dir, config) = load(
            r#"
[publish]
space_key = "DOC"
remove_snapshots = true

[project]
artifact_id = "mylib"
version = "1.0"

[properties]
team = "docs"
"#,
        );

        let run = run_config(&config).unwrap();

        assert_eq!(run.space_key, "DOC");
        assert_eq!(run.parent_title, "Home");
        assert_eq!(run.title_prefix, "mylib-1.0");
        assert!(run.remove_snapshots);
        assert_eq!(run.metadata.version.as_deref(), Some("1.0"));
        assert_eq!(run.properties.get("team").map(String::as_str), Some("docs"));
    }

    #[test]
    fn test_run_config_requires_space_key() {
        let (_dir, config) = load("[publish]\ntitle = \"MyLib\"\n");
        assert!(matches!(run_config(&config), Err(CliError::Config(_))));
    }

    #[test]
    fn test_site_options_use_resolved_paths() {
        let (dir, config) = load("[publish]\nspace_key = \"DOC\"\nlabels = [\"doc\"]\n");

        let options = site_options(&config);

        assert_eq!(options.site_dir, dir.path().join("src/site/confluence"));
        assert_eq!(options.children_dir, options.site_dir.join("children"));
        assert_eq!(options.file_ext, ".wiki");
        assert_eq!(options.labels, ["doc"]);
    }
}
