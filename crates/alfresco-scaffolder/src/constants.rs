//! Well-known file names, folders and build placeholders of an SDK project

/// Project configuration file, relative to the project root
pub const FILE_PROJECT_CONFIG: &str = ".alfresco-scaffolder.yaml";

pub const FILE_POM_XML: &str = "pom.xml";
pub const FILE_CONTEXT_REPO_XML: &str = "context-repo.xml";
pub const FILE_CONTEXT_SHARE_XML: &str = "context-share.xml";
pub const FILE_MODULE_CONTEXT_XML: &str = "module-context.xml";

pub const FOLDER_CUSTOMIZATIONS: &str = "customizations";
pub const FOLDER_RUNNER: &str = "runner";
pub const FOLDER_SOURCE_TEMPLATES: &str = "source_templates";
pub const FOLDER_TOMCAT: &str = "tomcat";

pub const VAR_PROJECT_GROUPID: &str = "${project.groupId}";
pub const VAR_PROJECT_ARTIFACTID: &str = "${project.artifactId}";
pub const VAR_PROJECT_VERSION: &str = "${project.version}";

/// Prefix for paths resolved relative to the aggregator project
pub const VAR_PARENT_BASEDIR: &str = "${project.parent.basedir}";
/// Prefix for paths resolved relative to the current module
pub const VAR_BASEDIR: &str = "${project.basedir}";

pub const WAR_PLUGIN_ARTIFACT_ID: &str = "maven-war-plugin";

/// Profile in the runner build that carries the functional test executions
pub const FUNCTIONAL_TESTING_PROFILE: &str = "functional-testing";
