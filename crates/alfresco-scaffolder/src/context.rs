//! Project context: configuration, file access and user output
//!
//! Everything the registry and the module manager need from their
//! surroundings is passed in explicitly through a `ProjectContext`.

use crate::constants::FILE_PROJECT_CONFIG;
use crate::error::{Error, Result};
use crate::fs::FileStore;
use crate::registry::ModuleRecord;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Persisted project settings
///
/// Keys this crate does not know about are kept and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype_version: Option<String>,
    #[serde(default)]
    pub module_registry: Vec<ModuleRecord>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ProjectConfig {
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml(&self, path: &Path) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// User-facing informational and warning lines
pub trait Output {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Plain terminal output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn info(&self, message: &str) {
        println!("  {} {}", "●".blue(), message);
    }

    fn warn(&self, message: &str) {
        eprintln!("  {} {}", "△".yellow(), message.yellow());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Info(String),
    Warn(String),
}

/// Records every line; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    lines: Rc<RefCell<Vec<OutputLine>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| match line {
                OutputLine::Warn(message) => Some(message.clone()),
                OutputLine::Info(_) => None,
            })
            .collect()
    }
}

impl Output for MemoryOutput {
    fn info(&self, message: &str) {
        self.lines
            .borrow_mut()
            .push(OutputLine::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.lines
            .borrow_mut()
            .push(OutputLine::Warn(message.to_string()));
    }
}

/// Explicit dependencies of one generator run
pub struct ProjectContext {
    root: PathBuf,
    config: ProjectConfig,
    fs: Box<dyn FileStore>,
    out: Box<dyn Output>,
}

impl ProjectContext {
    pub fn new(
        root: impl Into<PathBuf>,
        config: ProjectConfig,
        fs: Box<dyn FileStore>,
        out: Box<dyn Output>,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            fs,
            out,
        }
    }

    /// Open a project, loading its configuration file when there is one
    pub fn open(
        root: impl Into<PathBuf>,
        fs: Box<dyn FileStore>,
        out: Box<dyn Output>,
    ) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(FILE_PROJECT_CONFIG);
        let config = match fs.read(&config_path)? {
            Some(text) => ProjectConfig::from_yaml(&config_path, &text)?,
            None => ProjectConfig::default(),
        };
        tracing::debug!(
            root = %root.display(),
            modules = config.module_registry.len(),
            "opened project"
        );
        Ok(Self::new(root, config, fs, out))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a project-relative path
    pub fn destination_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    pub fn fs(&self) -> &dyn FileStore {
        self.fs.as_ref()
    }

    pub fn fs_mut(&mut self) -> &mut dyn FileStore {
        self.fs.as_mut()
    }

    pub fn out(&self) -> &dyn Output {
        self.out.as_ref()
    }

    /// Write the configuration file through the file store
    pub fn persist_config(&mut self) -> Result<()> {
        let path = self.destination_path(FILE_PROJECT_CONFIG);
        let yaml = self.config.to_yaml(&path)?;
        self.fs.write(&path, &yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StagedFs;
    use tempfile::TempDir;

    #[test]
    fn test_config_keeps_unknown_keys() {
        let path = Path::new(".alfresco-scaffolder.yaml");
        let config = ProjectConfig::from_yaml(
            path,
            "projectGroupId: org.example\nprojectStructure: advanced\nmoduleRegistry: []\n",
        )
        .unwrap();
        assert_eq!(config.project_group_id.as_deref(), Some("org.example"));
        assert!(config.extra.contains_key("projectStructure"));

        let yaml = config.to_yaml(path).unwrap();
        assert!(yaml.contains("projectStructure: advanced"));
        assert_eq!(ProjectConfig::from_yaml(path, &yaml).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let result = ProjectConfig::from_yaml(Path::new("x.yaml"), "moduleRegistry: {");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_open_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let ctx = ProjectContext::open(
            dir.path(),
            Box::new(StagedFs::new()),
            Box::new(MemoryOutput::new()),
        )
        .unwrap();
        assert_eq!(ctx.config(), &ProjectConfig::default());
        assert_eq!(ctx.destination_path("pom.xml"), dir.path().join("pom.xml"));
    }

    #[test]
    fn test_persist_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut ctx = ProjectContext::open(
            dir.path(),
            Box::new(StagedFs::new()),
            Box::new(MemoryOutput::new()),
        )
        .unwrap();
        ctx.config_mut().project_version = Some("1.0".to_string());
        ctx.persist_config().unwrap();
        ctx.fs_mut().commit().unwrap();

        let reopened = ProjectContext::open(
            dir.path(),
            Box::new(StagedFs::new()),
            Box::new(MemoryOutput::new()),
        )
        .unwrap();
        assert_eq!(reopened.config().project_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_memory_output_shares_lines() {
        let out = MemoryOutput::new();
        let handle = out.clone();
        out.info("hello");
        out.warn("careful");
        assert_eq!(handle.lines().len(), 2);
        assert_eq!(handle.warnings(), vec!["careful".to_string()]);
    }
}
