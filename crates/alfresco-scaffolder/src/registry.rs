//! Module registry
//!
//! An ordered list of the modules installed in a project, persisted in the
//! project configuration under `moduleRegistry`. A record is identified by all
//! seven of its fields; two records that differ only in `path` are distinct.
//!
//! Display names take the form `groupId:artifactId:version:packaging:war:location`
//! with the `${project.groupId}` and `${project.version}` placeholders
//! resolved against the project configuration.

use crate::constants::{VAR_PROJECT_GROUPID, VAR_PROJECT_VERSION};
use crate::context::ProjectConfig;
use crate::error::{Error, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a module descriptor could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidModule {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("expected 7 fields (groupId, artifactId, version, packaging, war, location, path), got {0}")]
    WrongArity(usize),

    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
}

macro_rules! module_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidModule;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    "" => Err(InvalidModule::MissingField($field)),
                    other => Err(InvalidModule::UnknownValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

module_enum!(
    /// Artifact packaging of a module
    Packaging, "packaging" { Amp => "amp", Jar => "jar" }
);

module_enum!(
    /// The web application a module is applied to
    War, "war" { Repo => "repo", Share => "share" }
);

module_enum!(
    /// Where the module artifact comes from
    ///
    /// - `Source`: built by a module of this project
    /// - `Local`: a file inside the project tree
    /// - `Remote`: resolved from a Maven repository
    Location, "location" { Source => "source", Local => "local", Remote => "remote" }
);

/// One registered module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: Packaging,
    pub war: War,
    pub location: Location,
    /// Project-relative path to the module root
    pub path: String,
}

/// A module descriptor whose fields may be missing, e.g. as read from user input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleDraft {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub war: Option<String>,
    pub location: Option<String>,
    pub path: Option<String>,
}

impl ModuleRecord {
    /// The single validated construction path every normalization funnels into
    pub fn try_new(
        group_id: &str,
        artifact_id: &str,
        version: &str,
        packaging: &str,
        war: &str,
        location: &str,
        path: &str,
    ) -> std::result::Result<Self, InvalidModule> {
        let required = |field: &'static str, value: &str| {
            if value.is_empty() {
                Err(InvalidModule::MissingField(field))
            } else {
                Ok(value.to_string())
            }
        };
        Ok(Self {
            group_id: required("groupId", group_id)?,
            artifact_id: required("artifactId", artifact_id)?,
            version: required("version", version)?,
            packaging: packaging.parse()?,
            war: war.parse()?,
            location: location.parse()?,
            path: required("path", path)?,
        })
    }

    /// Display name with placeholders resolved against the project configuration
    pub fn display_name(&self, config: &ProjectConfig) -> String {
        let (group_id, version) = self.resolved_group_and_version(config);
        format!(
            "{}:{}:{}:{}:{}:{}",
            group_id, self.artifact_id, version, self.packaging, self.war, self.location
        )
    }

    /// Same as `display_name`, with the distinguishing parts highlighted for terminals
    pub fn colored_name(&self, config: &ProjectConfig) -> String {
        let (group_id, version) = self.resolved_group_and_version(config);
        format!(
            "{}:{}:{}:{}:{}:{}",
            group_id,
            self.artifact_id.blue(),
            version,
            self.packaging.as_str().green(),
            self.war.as_str().blue(),
            self.location.as_str().green()
        )
    }

    fn resolved_group_and_version<'a>(&'a self, config: &'a ProjectConfig) -> (&'a str, &'a str) {
        let group_id = match config.project_group_id.as_deref() {
            Some(group_id) if self.group_id == VAR_PROJECT_GROUPID => group_id,
            _ => self.group_id.as_str(),
        };
        let version = match config.project_version.as_deref() {
            Some(version) if self.version == VAR_PROJECT_VERSION => version,
            _ => self.version.as_str(),
        };
        (group_id, version)
    }
}

/// Normalize a fully-populated descriptor object
pub fn normalize_from_record(
    draft: &ModuleDraft,
) -> std::result::Result<ModuleRecord, InvalidModule> {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    ModuleRecord::try_new(
        &field(&draft.group_id),
        &field(&draft.artifact_id),
        &field(&draft.version),
        &field(&draft.packaging),
        &field(&draft.war),
        &field(&draft.location),
        &field(&draft.path),
    )
}

/// Normalize seven positional values: groupId, artifactId, version, packaging, war, location, path
pub fn normalize_from_fields(fields: &[&str]) -> std::result::Result<ModuleRecord, InvalidModule> {
    match fields {
        [group_id, artifact_id, version, packaging, war, location, path] => {
            ModuleRecord::try_new(group_id, artifact_id, version, packaging, war, location, path)
        }
        other => Err(InvalidModule::WrongArity(other.len())),
    }
}

/// Anything that can be normalized into a `ModuleRecord`
pub trait IntoModule {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule>;
}

impl IntoModule for ModuleRecord {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule> {
        ModuleRecord::try_new(
            &self.group_id,
            &self.artifact_id,
            &self.version,
            self.packaging.as_str(),
            self.war.as_str(),
            self.location.as_str(),
            &self.path,
        )
    }
}

impl IntoModule for &ModuleRecord {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule> {
        self.clone().into_module()
    }
}

impl IntoModule for &ModuleDraft {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule> {
        normalize_from_record(self)
    }
}

impl IntoModule for &[&str] {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule> {
        normalize_from_fields(self)
    }
}

impl<const N: usize> IntoModule for [&str; N] {
    fn into_module(self) -> std::result::Result<ModuleRecord, InvalidModule> {
        normalize_from_fields(&self)
    }
}

/// A record paired with its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedModule {
    pub name: String,
    pub module: ModuleRecord,
}

/// Ordered list of the project's modules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRecord>,
}

impl ModuleRegistry {
    /// Load the registry persisted in the project configuration
    pub fn load(config: &ProjectConfig) -> Self {
        Self {
            modules: config.module_registry.clone(),
        }
    }

    pub fn modules(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn named_modules(&self, config: &ProjectConfig) -> Vec<NamedModule> {
        self.modules
            .iter()
            .map(|module| NamedModule {
                name: module.display_name(config),
                module: module.clone(),
            })
            .collect()
    }

    /// The stored record equal to the normalized query; `None` also for invalid queries
    pub fn find_module(&self, module: impl IntoModule) -> Option<&ModuleRecord> {
        let wanted = module.into_module().ok()?;
        self.modules.iter().find(|m| **m == wanted)
    }

    /// Register a module; returns `false` when an identical record was already present
    pub fn add_module(&mut self, module: impl IntoModule) -> Result<bool> {
        let module = module.into_module()?;
        if self.modules.contains(&module) {
            tracing::debug!(artifact_id = %module.artifact_id, "module already registered");
            return Ok(false);
        }
        tracing::debug!(artifact_id = %module.artifact_id, "registering module");
        self.modules.push(module);
        Ok(true)
    }

    /// Unregister a module and return the removed record
    pub fn remove_module(&mut self, module: impl IntoModule) -> Result<ModuleRecord> {
        let module = module.into_module()?;
        let index = self
            .modules
            .iter()
            .position(|m| *m == module)
            .ok_or_else(|| Error::ModuleNotRegistered(module.artifact_id.clone()))?;
        tracing::debug!(artifact_id = %module.artifact_id, "unregistering module");
        Ok(self.modules.remove(index))
    }

    /// Copy the whole list into the project configuration
    pub fn save(&self, config: &mut ProjectConfig) {
        config.module_registry = self.modules.clone();
    }
}
