//! Crate-level error type

use crate::registry::InvalidModule;
use crate::xml::XmlError;
use std::path::PathBuf;

/// Errors surfaced by the registry, the module manager and the file store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("All components of the module are required: {0}")]
    IncompleteModule(#[from] InvalidModule),

    #[error("You may only remove a module that has already been registered: {0}")]
    ModuleNotRegistered(String),

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project configuration {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
