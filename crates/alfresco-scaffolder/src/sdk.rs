//! SDK profiles
//!
//! Each supported Alfresco SDK release is described by a static
//! `SdkDescriptor`. Behaviour that changed between releases (default module
//! names, build output layout, packaging templates) sits behind the
//! `SdkProfile` trait so the module manager never branches on versions itself.

use crate::constants::{
    FILE_MODULE_CONTEXT_XML, VAR_PROJECT_ARTIFACTID, VAR_PROJECT_GROUPID, VAR_PROJECT_VERSION,
};
use crate::context::{ProjectConfig, ProjectContext};
use crate::error::Result;
use crate::registry::{Location, ModuleRecord, Packaging, War};
use crate::spring_context::SpringContext;
use crate::xml::Document;
use semver::Version;
use std::path::Path;

/// SDK used when the project configuration does not name one
pub const DEFAULT_SDK_VERSION: &str = "2.2.0";

/// Import added to every new repository AMP so generated contexts are picked up
pub const GENERATED_CONTEXT_IMPORT: &str =
    "classpath:alfresco/module/${project.artifactId}/context/generated/*-context.xml";

/// Static metadata for one SDK release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkDescriptor {
    pub version: &'static str,
    pub archetype_group_id: &'static str,
    pub archetype_artifact_id: &'static str,
    pub archetype_version: &'static str,
    pub provided_community_version: &'static str,
    pub provided_enterprise_version: &'static str,
    pub supported_java_versions: &'static str,
    pub supported_maven_versions: &'static str,
    /// Packaging of the modules the archetype stamps out
    pub default_packaging: Packaging,
    /// Whether the default modules may be removed after generation
    pub removes_default_modules: bool,
}

const ARCHETYPE_GROUP_ID: &str = "org.alfresco.maven.archetype";
const ARCHETYPE_ARTIFACT_ID: &str = "alfresco-allinone-archetype";

/// Supported SDK releases, newest first
pub const SDK_VERSIONS: &[SdkDescriptor] = &[
    SdkDescriptor {
        version: "3.0.0",
        archetype_group_id: ARCHETYPE_GROUP_ID,
        archetype_artifact_id: ARCHETYPE_ARTIFACT_ID,
        archetype_version: "3.0.0",
        provided_community_version: "5.2.e",
        provided_enterprise_version: "5.2.0",
        supported_java_versions: "^1.8.0",
        supported_maven_versions: "^3.3.0",
        default_packaging: Packaging::Jar,
        removes_default_modules: false,
    },
    SdkDescriptor {
        version: "2.2.0",
        archetype_group_id: ARCHETYPE_GROUP_ID,
        archetype_artifact_id: ARCHETYPE_ARTIFACT_ID,
        archetype_version: "2.2.0",
        provided_community_version: "5.1.e",
        provided_enterprise_version: "5.1",
        supported_java_versions: "^1.8.0",
        supported_maven_versions: "^3.2.5",
        default_packaging: Packaging::Amp,
        removes_default_modules: true,
    },
    SdkDescriptor {
        version: "2.1.1",
        archetype_group_id: ARCHETYPE_GROUP_ID,
        archetype_artifact_id: ARCHETYPE_ARTIFACT_ID,
        archetype_version: "2.1.1",
        provided_community_version: "5.0.d",
        provided_enterprise_version: "5.0.1",
        supported_java_versions: "^1.7.0",
        supported_maven_versions: "^3.2.5",
        default_packaging: Packaging::Amp,
        removes_default_modules: true,
    },
    SdkDescriptor {
        version: "2.1.0",
        archetype_group_id: ARCHETYPE_GROUP_ID,
        archetype_artifact_id: ARCHETYPE_ARTIFACT_ID,
        archetype_version: "2.1.0",
        provided_community_version: "5.0.d",
        provided_enterprise_version: "5.0.1",
        supported_java_versions: "^1.8.0",
        supported_maven_versions: "^3.2.5",
        default_packaging: Packaging::Amp,
        removes_default_modules: true,
    },
    SdkDescriptor {
        version: "2.0.0",
        archetype_group_id: ARCHETYPE_GROUP_ID,
        archetype_artifact_id: ARCHETYPE_ARTIFACT_ID,
        archetype_version: "2.0.0",
        provided_community_version: "5.0.c",
        provided_enterprise_version: "5.0",
        supported_java_versions: "^1.7.0",
        supported_maven_versions: "^3.0.5",
        default_packaging: Packaging::Amp,
        removes_default_modules: true,
    },
];

/// Parse a version string, tolerating surrounding whitespace and a leading 'v' or '='
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned
        .strip_prefix('v')
        .or_else(|| cleaned.strip_prefix('='))
        .unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}

/// True when the project's archetype version is at least `minimum`
fn archetype_at_least(config: &ProjectConfig, minimum: &str) -> bool {
    let current = config.archetype_version.as_deref().and_then(parse_version);
    match (current, parse_version(minimum)) {
        (Some(current), Some(minimum)) => current >= minimum,
        _ => false,
    }
}

/// Version-dependent behaviour of an SDK
///
/// Only `descriptor` is required; the provided methods implement the rules
/// shared by every released SDK and can be overridden per profile.
pub trait SdkProfile {
    fn descriptor(&self) -> &SdkDescriptor;

    /// Prefix for default module names: `<projectArtifactId>-` from 2.2.0 on
    fn version_prefix(&self, config: &ProjectConfig) -> String {
        match &config.project_artifact_id {
            Some(artifact_id) if archetype_at_least(config, "2.2.0-SNAPSHOT") => {
                format!("{}-", artifact_id)
            }
            _ => String::new(),
        }
    }

    /// Folder below `target/` holding filtered module resources
    fn target_folder_name(&self, config: &ProjectConfig, basename: &str) -> String {
        if archetype_at_least(config, "2.2.0-SNAPSHOT") {
            "amp".to_string()
        } else {
            basename.to_string()
        }
    }

    /// From 3.0.0 the Alfresco Maven plugin replaces the runner and WAR wrappers
    fn uses_enhanced_plugin(&self, config: &ProjectConfig) -> bool {
        archetype_at_least(config, "3.0.0-SNAPSHOT")
    }

    /// The source modules an archetype-generated project starts with
    fn default_modules(&self, config: &ProjectConfig) -> Vec<ModuleRecord> {
        let prefix = self.version_prefix(config);
        let packaging = self.descriptor().default_packaging;
        let (repo, share) = match packaging {
            Packaging::Amp => ("repo-amp", "share-amp"),
            Packaging::Jar => ("platform-jar", "share-jar"),
        };
        [(repo, War::Repo), (share, War::Share)]
            .into_iter()
            .map(|(name, war)| {
                let name = format!("{}{}", prefix, name);
                ModuleRecord {
                    group_id: VAR_PROJECT_GROUPID.to_string(),
                    artifact_id: name.clone(),
                    version: VAR_PROJECT_VERSION.to_string(),
                    packaging,
                    war,
                    location: Location::Source,
                    path: name,
                }
            })
            .collect()
    }

    /// Customize a freshly copied source module
    fn setup_new_module(&self, ctx: &mut ProjectContext, module: &ModuleRecord) -> Result<()> {
        match (module.war, module.packaging) {
            (War::Repo, Packaging::Amp) => setup_new_repo_amp(ctx, &module.path),
            (War::Repo, Packaging::Jar) => {
                ctx.out()
                    .info(&format!("Setting up new platform jar: {}", module.path));
                Ok(())
            }
            (War::Share, Packaging::Amp) => {
                ctx.out()
                    .info(&format!("Setting up new share amp: {}", module.path));
                Ok(())
            }
            (War::Share, Packaging::Jar) => {
                ctx.out()
                    .info(&format!("Setting up new share jar: {}", module.path));
                Ok(())
            }
        }
    }
}

/// Import the generated contexts and point the module id at the artifactId
fn setup_new_repo_amp(ctx: &mut ProjectContext, path: &str) -> Result<()> {
    ctx.out()
        .info(&format!("Setting up new repository amp: {}", path));
    let basename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let module_folder = format!("{}/src/main/amp/config/alfresco/module/{}", path, basename);

    let module_context_path =
        ctx.destination_path(format!("{}/{}", module_folder, FILE_MODULE_CONTEXT_XML));
    tracing::debug!(path = %module_context_path.display(), "editing module context");
    let source = ctx.fs().read(&module_context_path)?;
    let mut context = SpringContext::new(source.as_deref())?;
    if !context.has_import(GENERATED_CONTEXT_IMPORT) {
        context.add_import(GENERATED_CONTEXT_IMPORT);
        ctx.fs_mut()
            .write(&module_context_path, &context.to_xml_string())?;
    }

    let service_context_path =
        ctx.destination_path(format!("{}/context/service-context.xml", module_folder));
    if let Some(source) = ctx.fs().read(&service_context_path)? {
        let mut doc = Document::parse(&source)?;
        let property = doc.first_node_matching_xpath("//property[@name='moduleId']", doc.root())?;
        if let Some(property) = property {
            if doc.attribute(property, "value").is_some_and(|v| !v.is_empty()) {
                tracing::debug!(path = %service_context_path.display(), "updating moduleId");
                doc.set_attribute(property, "value", VAR_PROJECT_ARTIFACTID);
                ctx.fs_mut()
                    .write(&service_context_path, &doc.pretty_print())?;
            }
        }
    }
    Ok(())
}

/// A released SDK selected from the project configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sdk {
    descriptor: &'static SdkDescriptor,
}

impl Sdk {
    pub fn find(version: &str) -> Option<Self> {
        SDK_VERSIONS
            .iter()
            .find(|d| d.version == version)
            .map(|descriptor| Self { descriptor })
    }

    /// The SDK named by `sdkVersion`, or the default one
    pub fn from_config(config: &ProjectConfig) -> Self {
        let requested = config.sdk_version.as_deref().unwrap_or(DEFAULT_SDK_VERSION);
        if let Some(sdk) = Self::find(requested) {
            return sdk;
        }
        tracing::warn!(
            sdk_version = requested,
            "unknown SDK version, using {}",
            DEFAULT_SDK_VERSION
        );
        Self::default()
    }
}

impl Default for Sdk {
    fn default() -> Self {
        let descriptor = SDK_VERSIONS
            .iter()
            .find(|d| d.version == DEFAULT_SDK_VERSION)
            .unwrap_or(&SDK_VERSIONS[0]);
        Self { descriptor }
    }
}

impl SdkProfile for Sdk {
    fn descriptor(&self) -> &SdkDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryOutput;
    use crate::fs::StagedFs;
    use tempfile::TempDir;

    fn config(archetype_version: &str) -> ProjectConfig {
        ProjectConfig {
            project_artifact_id: Some("demo".to_string()),
            archetype_version: Some(archetype_version.to_string()),
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("v2.2.0"), Some(Version::new(2, 2, 0)));
        assert_eq!(parse_version(" =3.0.0 "), Some(Version::new(3, 0, 0)));
        assert!(parse_version("2.2.0-SNAPSHOT").is_some());
        assert!(parse_version("latest").is_none());
    }

    #[test]
    fn test_from_config_defaults_to_2_2_0() {
        assert_eq!(Sdk::from_config(&ProjectConfig::default()).descriptor().version, "2.2.0");
        let config = ProjectConfig {
            sdk_version: Some("3.0.0".to_string()),
            ..ProjectConfig::default()
        };
        assert_eq!(Sdk::from_config(&config).descriptor().version, "3.0.0");
        let unknown = ProjectConfig {
            sdk_version: Some("9.9.9".to_string()),
            ..ProjectConfig::default()
        };
        assert_eq!(Sdk::from_config(&unknown), Sdk::default());
    }

    #[test]
    fn test_version_gates() {
        let sdk = Sdk::default();
        assert_eq!(sdk.version_prefix(&config("2.1.1")), "");
        assert_eq!(sdk.version_prefix(&config("2.2.0-SNAPSHOT")), "demo-");
        assert_eq!(sdk.version_prefix(&config("2.2.0")), "demo-");
        assert_eq!(sdk.version_prefix(&ProjectConfig::default()), "");

        assert_eq!(sdk.target_folder_name(&config("2.1.0"), "repo-amp"), "repo-amp");
        assert_eq!(sdk.target_folder_name(&config("2.2.0"), "repo-amp"), "amp");

        assert!(!sdk.uses_enhanced_plugin(&config("2.2.0")));
        assert!(sdk.uses_enhanced_plugin(&config("3.0.0-SNAPSHOT")));
        assert!(sdk.uses_enhanced_plugin(&config("3.0.0")));
    }

    #[test]
    fn test_default_modules() {
        let amps = Sdk::default().default_modules(&config("2.2.0"));
        assert_eq!(amps.len(), 2);
        assert_eq!(amps[0].artifact_id, "demo-repo-amp");
        assert_eq!(amps[0].path, "demo-repo-amp");
        assert_eq!(amps[0].group_id, VAR_PROJECT_GROUPID);
        assert_eq!(amps[1].war, War::Share);

        let jars = Sdk::find("3.0.0").unwrap().default_modules(&config("2.1.0"));
        assert_eq!(jars[0].artifact_id, "platform-jar");
        assert_eq!(jars[1].artifact_id, "share-jar");
        assert_eq!(jars[1].packaging, Packaging::Jar);
    }

    #[test]
    fn test_setup_new_repo_amp_adds_generated_import_once() {
        let dir = TempDir::new().unwrap();
        let out = MemoryOutput::new();
        let mut ctx = ProjectContext::new(
            dir.path(),
            ProjectConfig::default(),
            Box::new(StagedFs::new()),
            Box::new(out.clone()),
        );
        let folder = dir.path().join("a-repo/src/main/amp/config/alfresco/module/a-repo");
        ctx.fs_mut()
            .write(
                &folder.join("module-context.xml"),
                r#"<beans><import resource="classpath:x.xml"/></beans>"#,
            )
            .unwrap();
        ctx.fs_mut()
            .write(
                &folder.join("context/service-context.xml"),
                r#"<beans><bean id="m"><property name="moduleId" value="a-repo"/></bean></beans>"#,
            )
            .unwrap();

        let module =
            ModuleRecord::try_new("g", "a", "1.0", "amp", "repo", "source", "a-repo").unwrap();
        let sdk = Sdk::default();
        sdk.setup_new_module(&mut ctx, &module).unwrap();
        sdk.setup_new_module(&mut ctx, &module).unwrap();

        let context = ctx.fs().read(&folder.join("module-context.xml")).unwrap().unwrap();
        let context = SpringContext::new(Some(&context)).unwrap();
        assert_eq!(context.imports(), vec!["classpath:x.xml", GENERATED_CONTEXT_IMPORT]);

        let service = ctx
            .fs()
            .read(&folder.join("context/service-context.xml"))
            .unwrap()
            .unwrap();
        assert!(service.contains(r#"value="${project.artifactId}""#));
        assert_eq!(out.lines().len(), 2);
    }
}
