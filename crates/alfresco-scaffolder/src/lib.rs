//! Alfresco Scaffolder - Module management for Alfresco SDK projects
//!
//! This library keeps the multi-module Maven build of an Alfresco SDK project
//! in line with a registry of the modules the project deploys. It is used by
//! the `alfresco-tools` binary but has no terminal dependencies of its own
//! apart from the optional prompts.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: XML editing** - `xml` (DOM, XPath subset, pretty printer) and the
//!   document editors `pom`, `spring_context` and `tomcat_context`
//! - **Layer 2: Project model** - `registry`, `sdk` profiles, the `context`
//!   (configuration, staged `fs`, user output)
//! - **Layer 3: Orchestration** - `manager::ModuleManager`, which queues file
//!   edits and applies them on `save()`
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based output and confirmation prompts
//!
//! # Example Usage
//!
//! ```ignore
//! use alfresco_scaffolder::{ConsoleOutput, FileStore, ModuleManager, ProjectContext, StagedFs};
//!
//! let fs = Box::new(StagedFs::new());
//! let ctx = ProjectContext::open("my-project", fs, Box::new(ConsoleOutput))?;
//! let mut manager = ModuleManager::new(ctx);
//! manager.add_module(["org.example", "my-repo", "1.0", "amp", "repo", "source", "my-repo"])?;
//! manager.save()?;
//! manager.context_mut().fs_mut().commit()?;
//! ```

pub mod constants;
pub mod context;
pub mod error;
pub mod fs;
pub mod manager;
pub mod pom;
pub mod registry;
pub mod sdk;
pub mod spring_context;
pub mod tomcat_context;
pub mod xml;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use context::{ConsoleOutput, MemoryOutput, Output, OutputLine, ProjectConfig, ProjectContext};
pub use error::{Error, Result};
pub use fs::{FileStore, StagedFs};
pub use manager::{ModuleManager, ModuleOp};
pub use pom::{Dependency, MavenPom};
pub use registry::{
    InvalidModule, IntoModule, Location, ModuleDraft, ModuleRecord, ModuleRegistry, NamedModule,
    Packaging, War,
};
pub use sdk::{Sdk, SdkDescriptor, SdkProfile, DEFAULT_SDK_VERSION};
pub use spring_context::SpringContext;
pub use tomcat_context::TomcatContext;
pub use xml::{Document, NodeId, XmlError};
