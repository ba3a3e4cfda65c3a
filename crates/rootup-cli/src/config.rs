use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rootup_core::Stability;
use serde::Deserialize;

pub(crate) const CONFIG_FILE_NAME: &str = "rootup.toml";

/// Project settings from `rootup.toml`. Relative paths are resolved against
/// the project directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ProjectConfig {
    pub manifest: PathBuf,
    pub lock: PathBuf,
    pub templates: PathBuf,
    pub vendor: String,
    pub plugin_package: String,
    pub runtime_package: String,
    pub stability: Stability,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("composer.json"),
            lock: PathBuf::from("composer.lock"),
            templates: PathBuf::from(".rootup/templates"),
            vendor: "magento".to_string(),
            plugin_package: "magento/composer-root-update-plugin".to_string(),
            runtime_package: "php".to_string(),
            stability: Stability::Stable,
        }
    }
}

impl ProjectConfig {
    fn resolved_against(mut self, project_dir: &Path) -> Self {
        self.manifest = project_dir.join(&self.manifest);
        self.lock = project_dir.join(&self.lock);
        self.templates = project_dir.join(&self.templates);
        self
    }
}

/// Loads `explicit` when given, otherwise `rootup.toml` in `project_dir` if
/// present, otherwise defaults.
pub(crate) fn load_project_config(
    project_dir: &Path,
    explicit: Option<&Path>,
) -> Result<ProjectConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = project_dir.join(CONFIG_FILE_NAME);
            if !default_path.exists() {
                return Ok(ProjectConfig::default().resolved_against(project_dir));
            }
            default_path
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed reading config: {}", path.display()))?;
    let config = parse_project_config(&content)
        .with_context(|| format!("failed parsing config: {}", path.display()))?;
    Ok(config.resolved_against(project_dir))
}

pub(crate) fn parse_project_config(content: &str) -> Result<ProjectConfig> {
    let config: ProjectConfig = toml::from_str(content)?;
    if config.vendor.trim().is_empty() {
        anyhow::bail!("vendor must not be empty");
    }
    if config.plugin_package.trim().is_empty() {
        anyhow::bail!("plugin_package must not be empty");
    }
    Ok(config)
}
