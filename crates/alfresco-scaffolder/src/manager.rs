//! Module manager
//!
//! Keeps the files of a project in line with its module registry. Adding or
//! removing a module updates the registry right away and queues `ModuleOp`s;
//! `save()` persists the registry and then runs the queue in FIFO order.
//!
//! Files touched per module:
//! - the containing `pom.xml` (`<modules>` entry)
//! - the module's own `pom.xml` (project and parent GAV)
//! - `<war>/pom.xml` (dependency and WAR overlay)
//! - `runner/pom.xml` (functional test executions, share modules only)
//! - `runner/tomcat/context-<war>.xml` (resource paths and virtual classpath)

use crate::constants::{
    FILE_CONTEXT_REPO_XML, FILE_CONTEXT_SHARE_XML, FILE_POM_XML, FOLDER_CUSTOMIZATIONS,
    FOLDER_RUNNER, FOLDER_SOURCE_TEMPLATES, FOLDER_TOMCAT, FUNCTIONAL_TESTING_PROFILE,
    VAR_BASEDIR, VAR_PARENT_BASEDIR, VAR_PROJECT_GROUPID, VAR_PROJECT_VERSION,
    WAR_PLUGIN_ARTIFACT_ID,
};
use crate::context::ProjectContext;
use crate::error::Result;
use crate::pom::{Dependency, MavenPom};
use crate::registry::{IntoModule, Location, ModuleRecord, ModuleRegistry, War};
use crate::sdk::{Sdk, SdkProfile};
use crate::tomcat_context::TomcatContext;
use crate::xml::{Document, NodeId, XmlError};
use std::path::{Path, PathBuf};

/// A queued file edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOp {
    /// Copy the packaging template into the module path unless it is occupied
    CopyTemplate(ModuleRecord),
    /// Move the SDK default module folder to one named after the artifactId
    RenamePathElements(ModuleRecord),
    AddToParentPom(ModuleRecord),
    AddFailsafeConfig(ModuleRecord),
    AddToTomcatContext(ModuleRecord),
    UpdateProjectPom(ModuleRecord),
    /// Run the SDK hook for a freshly copied module
    SetupNewModule(ModuleRecord),
    SetProjectDetails {
        module: ModuleRecord,
        name: Option<String>,
        description: Option<String>,
    },
    AddToWarWrapper(ModuleRecord),
    RemoveFiles(ModuleRecord),
    RemoveFromParentPom(ModuleRecord),
    RemoveFailsafeConfig(ModuleRecord),
    RemoveFromTomcatContext(ModuleRecord),
    RemoveFromWarWrapper(ModuleRecord),
}

impl ModuleOp {
    pub fn module(&self) -> &ModuleRecord {
        match self {
            Self::CopyTemplate(m)
            | Self::RenamePathElements(m)
            | Self::AddToParentPom(m)
            | Self::AddFailsafeConfig(m)
            | Self::AddToTomcatContext(m)
            | Self::UpdateProjectPom(m)
            | Self::SetupNewModule(m)
            | Self::AddToWarWrapper(m)
            | Self::RemoveFiles(m)
            | Self::RemoveFromParentPom(m)
            | Self::RemoveFailsafeConfig(m)
            | Self::RemoveFromTomcatContext(m)
            | Self::RemoveFromWarWrapper(m) => m,
            Self::SetProjectDetails { module, .. } => module,
        }
    }

    /// Whether this op unwires a module rather than installing it
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::RemoveFiles(_)
                | Self::RemoveFromParentPom(_)
                | Self::RemoveFailsafeConfig(_)
                | Self::RemoveFromTomcatContext(_)
                | Self::RemoveFromWarWrapper(_)
        )
    }
}

/// Last path component of a project-relative module path
fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// `pom.xml` of the folder containing the module, relative to the project root
fn containing_pom(module: &ModuleRecord) -> PathBuf {
    Path::new(&module.path)
        .parent()
        .unwrap_or(Path::new(""))
        .join(FILE_POM_XML)
}

fn execution_ids(module: &ModuleRecord) -> [String; 2] {
    [
        format!("functional-tests-{}", module.artifact_id),
        format!("verify-tests-{}", module.artifact_id),
    ]
}

fn find_execution(
    doc: &Document,
    executions: NodeId,
    id: &str,
) -> std::result::Result<Option<NodeId>, XmlError> {
    for execution in doc.select_matching_xpath("pom:execution", executions)? {
        if let Some(child) = doc.get_child(execution, "pom", "id")? {
            if doc.text_content(child) == id {
                return Ok(Some(execution));
            }
        }
    }
    Ok(None)
}

fn append_text_child(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    text: &str,
) -> std::result::Result<NodeId, XmlError> {
    let child = doc.create_child(parent, "pom", tag, false)?;
    doc.set_text_content(child, text);
    Ok(child)
}

/// Append a failsafe execution that runs the module's own TestNG suite
fn append_execution(
    doc: &mut Document,
    executions: NodeId,
    id: &str,
    goal: &str,
    module_path: &str,
) -> std::result::Result<(), XmlError> {
    let phase = if goal == "verify" { "verify" } else { "integration-test" };
    let execution = doc.create_child(executions, "pom", "execution", false)?;
    append_text_child(doc, execution, "id", id)?;
    append_text_child(doc, execution, "phase", phase)?;
    let goals = doc.create_child(execution, "pom", "goals", false)?;
    append_text_child(doc, goals, "goal", goal)?;
    let configuration = doc.create_child(execution, "pom", "configuration", false)?;
    let suites = doc.create_child(configuration, "pom", "suiteXmlFiles", false)?;
    let test_classes = format!("{}/{}/target/test-classes", VAR_PARENT_BASEDIR, module_path);
    append_text_child(doc, suites, "suiteXmlFile", &format!("{}/testng.xml", test_classes))?;
    append_text_child(doc, configuration, "testClassesDirectory", &test_classes)?;
    Ok(())
}

/// Find the WAR plugin, claiming an empty placeholder or appending one when missing
fn claim_war_plugin(pom: &mut MavenPom) -> std::result::Result<NodeId, XmlError> {
    let build = pom.get_or_create_top_level_element("pom", "build")?;
    let doc = pom.document_mut();
    let plugins = doc.get_or_create_child(build, "pom", "plugins")?;
    let mut plugin = doc.get_or_create_child(plugins, "pom", "plugin")?;
    loop {
        let artifact_id = doc.get_or_create_child(plugin, "pom", "artifactId")?;
        let text = doc.text_content(artifact_id);
        if text.is_empty() {
            doc.set_text_content(artifact_id, WAR_PLUGIN_ARTIFACT_ID);
            return Ok(plugin);
        }
        if text == WAR_PLUGIN_ARTIFACT_ID {
            return Ok(plugin);
        }
        plugin = match doc.next_element_sibling(plugin) {
            Some(next) => next,
            None => doc.create_child(plugins, "pom", "plugin", false)?,
        };
    }
}

/// Synchronizes the registry with the build tree of one project
pub struct ModuleManager<S: SdkProfile = Sdk> {
    ctx: ProjectContext,
    sdk: S,
    registry: ModuleRegistry,
    ops: Vec<ModuleOp>,
}

impl ModuleManager<Sdk> {
    /// Manager for the SDK named in the project configuration
    pub fn new(ctx: ProjectContext) -> Self {
        let sdk = Sdk::from_config(ctx.config());
        Self::with_sdk(ctx, sdk)
    }
}

impl<S: SdkProfile> ModuleManager<S> {
    pub fn with_sdk(ctx: ProjectContext, sdk: S) -> Self {
        let registry = ModuleRegistry::load(ctx.config());
        Self {
            ctx,
            sdk,
            registry,
            ops: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ProjectContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ProjectContext {
        &mut self.ctx
    }

    pub fn into_context(self) -> ProjectContext {
        self.ctx
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// Operations queued for the next `save()`
    pub fn pending_ops(&self) -> &[ModuleOp] {
        &self.ops
    }

    /// Queue an operation
    ///
    /// An identical pending operation is not queued twice, unless an op of the
    /// opposite direction for the same module was queued after it.
    pub fn schedule(&mut self, op: ModuleOp) {
        for queued in self.ops.iter().rev() {
            if queued.module() != op.module() {
                continue;
            }
            if *queued == op {
                tracing::debug!(?op, "operation already scheduled");
                return;
            }
            if queued.is_removal() != op.is_removal() {
                break;
            }
        }
        self.ops.push(op);
    }

    /// Register a module and queue the edits that install it
    pub fn add_module(&mut self, module: impl IntoModule) -> Result<ModuleRecord> {
        let module = module.into_module()?;
        tracing::debug!(artifact_id = %module.artifact_id, "add_module()");
        self.ctx.out().info(&format!(
            "Adding {} module to module registry",
            module.artifact_id
        ));
        self.registry.add_module(&module)?;

        if module.location == Location::Source {
            self.schedule(ModuleOp::CopyTemplate(module.clone()));
            self.schedule(ModuleOp::RenamePathElements(module.clone()));
            self.schedule(ModuleOp::AddToParentPom(module.clone()));
            if module.war == War::Share {
                self.schedule(ModuleOp::AddFailsafeConfig(module.clone()));
            }
            self.schedule(ModuleOp::AddToTomcatContext(module.clone()));
            self.schedule(ModuleOp::UpdateProjectPom(module.clone()));
        }
        self.schedule(ModuleOp::AddToWarWrapper(module.clone()));
        Ok(module)
    }

    /// Unregister a module and queue the edits that uninstall it
    ///
    /// Returns `Ok(None)` after a warning when the module is not registered.
    pub fn remove_module(&mut self, module: impl IntoModule) -> Result<Option<ModuleRecord>> {
        let module = module.into_module()?;
        tracing::debug!(artifact_id = %module.artifact_id, "remove_module()");
        if self.registry.find_module(&module).is_none() {
            self.ctx.out().warn(&format!(
                "Module {} is not registered, nothing to remove",
                module.display_name(self.ctx.config())
            ));
            return Ok(None);
        }
        let module = self.registry.remove_module(&module)?;

        if module.location == Location::Source {
            self.schedule(ModuleOp::RemoveFiles(module.clone()));
            self.schedule(ModuleOp::RemoveFromParentPom(module.clone()));
            if module.war == War::Share {
                self.schedule(ModuleOp::RemoveFailsafeConfig(module.clone()));
            }
            self.schedule(ModuleOp::RemoveFromTomcatContext(module.clone()));
        }
        self.schedule(ModuleOp::RemoveFromWarWrapper(module.clone()));
        Ok(Some(module))
    }

    /// Persist the registry, then run and clear the queue
    ///
    /// The first failing operation aborts the rest; writes already staged stay staged.
    pub fn save(&mut self) -> Result<()> {
        tracing::debug!(
            ops = self.ops.len(),
            "saving module registry and running scheduled operations"
        );
        self.registry.save(self.ctx.config_mut());
        self.ctx.persist_config()?;
        for op in std::mem::take(&mut self.ops) {
            self.run(&op)?;
        }
        tracing::debug!("save() finished");
        Ok(())
    }

    /// Register the SDK's out-of-the-box source modules and save
    pub fn register_default_modules(&mut self) -> Result<()> {
        tracing::debug!("registering default modules");
        let defaults = self.sdk.default_modules(self.ctx.config());
        for module in &defaults {
            self.add_module(module)?;
        }
        self.save()
    }

    /// Remove the SDK's out-of-the-box source modules and save
    pub fn remove_default_modules(&mut self) -> Result<()> {
        let descriptor = self.sdk.descriptor();
        if !descriptor.removes_default_modules {
            let message = format!(
                "SDK {} does not support removing the default modules",
                descriptor.version
            );
            self.ctx.out().warn(&message);
            return Ok(());
        }
        self.ctx.out().info("Removing default modules");
        let defaults = self.sdk.default_modules(self.ctx.config());
        for module in &defaults {
            self.remove_module(module)?;
        }
        self.save()
    }

    fn run(&mut self, op: &ModuleOp) -> Result<()> {
        tracing::debug!(?op, "running operation");
        match op {
            ModuleOp::CopyTemplate(m) => self.copy_template(m),
            ModuleOp::RenamePathElements(m) => self.rename_path_elements(m),
            ModuleOp::AddToParentPom(m) => self.add_to_parent_pom(m),
            ModuleOp::AddFailsafeConfig(m) => self.add_failsafe_config(m),
            ModuleOp::AddToTomcatContext(m) => self.add_to_tomcat_context(m),
            ModuleOp::UpdateProjectPom(m) => self.update_project_pom(m),
            ModuleOp::SetupNewModule(m) => self.sdk.setup_new_module(&mut self.ctx, m),
            ModuleOp::SetProjectDetails {
                module,
                name,
                description,
            } => self.set_project_details(module, name.as_deref(), description.as_deref()),
            ModuleOp::AddToWarWrapper(m) => self.add_to_war_wrapper(m),
            ModuleOp::RemoveFiles(m) => self.remove_files(m),
            ModuleOp::RemoveFromParentPom(m) => self.remove_from_parent_pom(m),
            ModuleOp::RemoveFailsafeConfig(m) => self.remove_failsafe_config(m),
            ModuleOp::RemoveFromTomcatContext(m) => self.remove_from_tomcat_context(m),
            ModuleOp::RemoveFromWarWrapper(m) => self.remove_from_war_wrapper(m),
        }
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        self.ctx.fs().read(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.ctx.fs_mut().write(path, contents)
    }

    fn read_pom(&self, path: &Path) -> Result<MavenPom> {
        let source = self.read(path)?;
        Ok(MavenPom::new(source.as_deref())?)
    }

    fn copy_template(&mut self, module: &ModuleRecord) -> Result<()> {
        let to = self.ctx.destination_path(&module.path);
        if self.ctx.fs().exists(&to) {
            self.ctx.out().warn(&format!(
                "Not copying module as target path already exists: {}",
                to.display()
            ));
            return Ok(());
        }
        let config = self.ctx.config();
        let prefix = self.sdk.version_prefix(config);
        let kind = if module.war == War::Repo && self.sdk.uses_enhanced_plugin(config) {
            "platform"
        } else {
            module.war.as_str()
        };
        let from = self.ctx.destination_path(format!(
            "{}/{}{}-{}",
            FOLDER_SOURCE_TEMPLATES, prefix, kind, module.packaging
        ));
        if !self.ctx.fs().exists(&from) {
            self.ctx.out().warn(&format!(
                "No template for {} module at {}",
                module.artifact_id,
                from.display()
            ));
            return Ok(());
        }
        self.ctx.out().info(&format!(
            "Copying template for {} module {} to {}",
            module.artifact_id,
            from.display(),
            to.display()
        ));
        self.ctx.fs_mut().copy_dir(&from, &to)
    }

    fn rename_path_elements(&mut self, module: &ModuleRecord) -> Result<()> {
        if module.war != War::Repo {
            return Ok(());
        }
        let default_repo = self
            .sdk
            .default_modules(self.ctx.config())
            .into_iter()
            .find(|d| d.location == Location::Source && d.war == War::Repo);
        let Some(default_repo) = default_repo else {
            return Ok(());
        };
        if default_repo.artifact_id == module.artifact_id {
            return Ok(());
        }
        let folder = format!("{}/src/main/amp/config/alfresco/module", module.path);
        let from = self
            .ctx
            .destination_path(format!("{}/{}", folder, default_repo.artifact_id));
        let to = self
            .ctx
            .destination_path(format!("{}/{}", folder, module.artifact_id));
        if !self.ctx.fs().exists(&from) {
            tracing::debug!(from = %from.display(), "nothing to rename");
            return Ok(());
        }
        self.ctx.out().info(&format!(
            "Renaming path elements from {} to {}",
            from.display(),
            to.display()
        ));
        self.ctx.fs_mut().move_dir(&from, &to)
    }

    fn add_to_parent_pom(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.ctx.destination_path(containing_pom(module));
        self.ctx.out().info(&format!(
            "Adding {} module to {}",
            module.artifact_id,
            path.display()
        ));
        let mut pom = self.read_pom(&path)?;
        let entry = basename(&module.path);
        if pom.find_module(entry)?.is_none() {
            pom.add_module(entry, true)?;
            self.write(&path, &pom.to_xml_string())?;
        }
        Ok(())
    }

    fn runner_pom_path(&self) -> PathBuf {
        self.ctx
            .destination_path(Path::new(FOLDER_RUNNER).join(FILE_POM_XML))
    }

    fn failsafe_plugin_xpath() -> String {
        format!(
            "/pom:project/pom:profiles/pom:profile[pom:id=\"{}\"]/pom:build/pom:plugins/pom:plugin[1]",
            FUNCTIONAL_TESTING_PROFILE
        )
    }

    fn add_failsafe_config(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.runner_pom_path();
        let Some(source) = self.read(&path)? else {
            tracing::debug!(
                path = %path.display(),
                "no runner pom, skipping failsafe configuration"
            );
            return Ok(());
        };
        self.ctx.out().info(&format!(
            "Configuring failsafe entries for {} in {}",
            module.artifact_id,
            path.display()
        ));
        let mut pom = MavenPom::new(Some(&source))?;
        let doc = pom.document_mut();
        let plugin_xpath = Self::failsafe_plugin_xpath();
        let Some(plugin) = doc.first_node_matching_xpath(&plugin_xpath, doc.root())? else {
            return Ok(());
        };
        let Some(executions) = doc.get_child(plugin, "pom", "executions")? else {
            return Ok(());
        };

        if let Some(configuration) = doc.get_child(plugin, "pom", "configuration")? {
            doc.remove_child(configuration, "pom", "suiteXmlFiles")?;
            doc.remove_child(configuration, "pom", "testClassesDirectory")?;
        }
        let [functional, verify] = execution_ids(module);
        for id in ["functional-tests", "verify-tests", functional.as_str(), verify.as_str()] {
            if let Some(execution) = find_execution(doc, executions, id)? {
                doc.remove_parents_child(executions, execution);
            }
        }
        append_execution(doc, executions, &functional, "integration-test", &module.path)?;
        append_execution(doc, executions, &verify, "verify", &module.path)?;

        let text = pom.to_xml_string();
        self.write(&path, &text)
    }

    fn remove_failsafe_config(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.runner_pom_path();
        let Some(source) = self.read(&path)? else {
            return Ok(());
        };
        self.ctx.out().info(&format!(
            "Removing failsafe entries for {} from {}",
            module.artifact_id,
            path.display()
        ));
        let mut pom = MavenPom::new(Some(&source))?;
        let doc = pom.document_mut();
        let xpath = format!("{}/pom:executions", Self::failsafe_plugin_xpath());
        let Some(executions) = doc.first_node_matching_xpath(&xpath, doc.root())? else {
            return Ok(());
        };
        let mut changed = false;
        for id in execution_ids(module) {
            if let Some(execution) = find_execution(doc, executions, &id)? {
                tracing::debug!(id = %id, "removing execution");
                changed |= doc.remove_parents_child(executions, execution);
            }
        }
        if changed {
            let text = pom.to_xml_string();
            self.write(&path, &text)?;
        }
        Ok(())
    }

    fn tomcat_context_path(&self, war: War) -> PathBuf {
        let file = match war {
            War::Repo => FILE_CONTEXT_REPO_XML,
            War::Share => FILE_CONTEXT_SHARE_XML,
        };
        self.ctx
            .destination_path(Path::new(FOLDER_RUNNER).join(FOLDER_TOMCAT).join(file))
    }

    /// Resource path mapping and classpath entries contributed by a module
    fn tomcat_entries(&self, module: &ModuleRecord) -> (String, [String; 3]) {
        let target_folder = self
            .sdk
            .target_folder_name(self.ctx.config(), basename(&module.path));
        let target = format!("{}/{}/target", VAR_PARENT_BASEDIR, module.path);
        (
            format!("/={}/{}/web", target, target_folder),
            [
                format!("{}/classes", target),
                format!("{}/{}/config", target, target_folder),
                format!("{}/test-classes", target),
            ],
        )
    }

    fn add_to_tomcat_context(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.tomcat_context_path(module.war);
        let Some(source) = self.read(&path)? else {
            tracing::debug!(path = %path.display(), "no tomcat context, skipping");
            return Ok(());
        };
        self.ctx.out().info(&format!(
            "Adding path elements for {} to tomcat context file",
            module.artifact_id
        ));
        let mut context = TomcatContext::new(Some(&source))?;
        let (resource_map, classpath) = self.tomcat_entries(module);
        context.add_extra_resource_path_map(&resource_map);
        for entry in &classpath {
            context.add_virtual_classpath(entry);
        }
        if module.war == War::Share {
            // share's own test classes must stay last
            let share_tests = format!("{}/share/target/test-classes", VAR_PARENT_BASEDIR);
            context.remove_virtual_classpath(&share_tests);
            context.add_virtual_classpath(&share_tests);
        }
        self.write(&path, &context.to_xml_string())
    }

    fn remove_from_tomcat_context(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.tomcat_context_path(module.war);
        let Some(source) = self.read(&path)? else {
            return Ok(());
        };
        self.ctx.out().info(&format!(
            "Removing path elements for {} from tomcat context file",
            module.artifact_id
        ));
        let mut context = TomcatContext::new(Some(&source))?;
        let (resource_map, classpath) = self.tomcat_entries(module);
        context.remove_extra_resource_path_map(&resource_map);
        for entry in &classpath {
            context.remove_virtual_classpath(entry);
        }
        self.write(&path, &context.to_xml_string())
    }

    fn update_project_pom(&mut self, module: &ModuleRecord) -> Result<()> {
        let project_pom_path = self
            .ctx
            .destination_path(Path::new(&module.path).join(FILE_POM_XML));
        self.ctx.out().info(&format!(
            "Setting project/parent GAVs for {} in {}",
            module.artifact_id,
            project_pom_path.display()
        ));

        let config = self.ctx.config().clone();
        let parent_path = self.ctx.destination_path(containing_pom(module));
        let parent = match self.read(&parent_path)? {
            Some(source) => Some(MavenPom::new(Some(&source))?),
            None => None,
        };
        let parent_value = |tag: &str, fallback: &Option<String>| -> Result<String> {
            let explicit = match &parent {
                Some(pom) => pom.top_level_text("pom", tag)?,
                None => None,
            };
            Ok(explicit.or_else(|| fallback.clone()).unwrap_or_default())
        };
        let parent_group_id = parent_value("groupId", &config.project_group_id)?;
        let parent_artifact_id = parent_value("artifactId", &config.project_artifact_id)?;
        let parent_version = parent_value("version", &config.project_version)?;

        let in_customizations = Path::new(&module.path)
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == FOLDER_CUSTOMIZATIONS);
        let resolve = |value: &str, placeholder: &str, configured: &Option<String>| -> String {
            match configured {
                Some(configured) if in_customizations && value == placeholder => configured.clone(),
                _ => value.to_string(),
            }
        };
        let group_id = resolve(&module.group_id, VAR_PROJECT_GROUPID, &config.project_group_id);
        let version = resolve(&module.version, VAR_PROJECT_VERSION, &config.project_version);

        let mut pom = self.read_pom(&project_pom_path)?;
        pom.set_project_gav(
            Some(&group_id),
            Some(&module.artifact_id),
            Some(&version),
            Some(module.packaging.as_str()),
        )?;
        pom.set_parent_gav(&parent_group_id, &parent_artifact_id, &parent_version)?;
        self.write(&project_pom_path, &pom.to_xml_string())
    }

    fn set_project_details(
        &mut self,
        module: &ModuleRecord,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let path = self
            .ctx
            .destination_path(Path::new(&module.path).join(FILE_POM_XML));
        let mut pom = self.read_pom(&path)?;
        if let Some(name) = name {
            pom.set_top_level_element_text_content("pom", "name", name)?;
        }
        if let Some(description) = description {
            pom.set_top_level_element_text_content("pom", "description", description)?;
        }
        self.write(&path, &pom.to_xml_string())
    }

    fn war_wrapper_path(&self, module: &ModuleRecord) -> PathBuf {
        self.ctx
            .destination_path(Path::new(module.war.as_str()).join(FILE_POM_XML))
    }

    fn war_dependency(module: &ModuleRecord) -> Dependency {
        Dependency::new(&module.group_id, &module.artifact_id)
            .with_version(&module.version)
            .with_type(module.packaging.as_str())
    }

    fn add_to_war_wrapper(&mut self, module: &ModuleRecord) -> Result<()> {
        self.ctx.out().info(&format!(
            "Adding {} module to {} war wrapper",
            module.artifact_id, module.war
        ));
        let path = self.war_wrapper_path(module);
        let mut pom = self.read_pom(&path)?;

        let query = Self::war_dependency(module);
        if pom.find_dependency(&query)?.is_none() {
            let dependency = match module.location {
                Location::Local => query
                    .with_scope("system")
                    .with_system_path(format!("{}/../{}", VAR_BASEDIR, module.path)),
                Location::Source | Location::Remote => query,
            };
            pom.add_dependency(&dependency)?;
        }

        let plugin = claim_war_plugin(&mut pom)?;
        let doc = pom.document_mut();
        let configuration = doc.get_or_create_child(plugin, "pom", "configuration")?;
        doc.get_or_create_child(configuration, "pom", "overlays")?;
        pom.add_overlay(&module.group_id, &module.artifact_id, module.packaging.as_str())?;

        self.write(&path, &pom.to_xml_string())
    }

    fn remove_from_war_wrapper(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.war_wrapper_path(module);
        let Some(source) = self.read(&path)? else {
            return Ok(());
        };
        self.ctx.out().info(&format!(
            "Removing {} module from {} war wrapper",
            module.artifact_id, module.war
        ));
        let mut pom = MavenPom::new(Some(&source))?;
        let removed_dependency = pom.remove_dependency(&Self::war_dependency(module))?;
        let removed_overlay = pom.remove_overlay(
            &module.group_id,
            &module.artifact_id,
            Some(module.packaging.as_str()),
        )?;
        if removed_dependency || removed_overlay {
            self.write(&path, &pom.to_xml_string())?;
        }
        Ok(())
    }

    fn remove_files(&mut self, module: &ModuleRecord) -> Result<()> {
        self.ctx
            .out()
            .warn(&format!("Deleting source module: {}", module.path));
        let path = self.ctx.destination_path(&module.path);
        self.ctx.fs_mut().delete(&path)
    }

    fn remove_from_parent_pom(&mut self, module: &ModuleRecord) -> Result<()> {
        let path = self.ctx.destination_path(containing_pom(module));
        let Some(source) = self.read(&path)? else {
            return Ok(());
        };
        self.ctx.out().warn(&format!(
            "Removing {} module from {}",
            module.artifact_id,
            path.display()
        ));
        let mut pom = MavenPom::new(Some(&source))?;
        if pom.remove_module(basename(&module.path))? {
            self.write(&path, &pom.to_xml_string())?;
        }
        Ok(())
    }
}
