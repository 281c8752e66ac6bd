//! Maven build descriptor editor
//!
//! Wraps a `pom.xml` document and exposes the handful of structural edits the
//! module manager needs: GAV coordinates, dependencies, nested modules,
//! plugin lookup and WAR overlays. Every finder returns `Ok(None)` when nothing
//! matches; only malformed documents and bad expressions are errors.

use crate::constants::{VAR_PROJECT_GROUPID, VAR_PROJECT_VERSION};
use crate::xml::{Document, NodeId, XmlError};

const SKELETON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/maven-v4_0_0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>com.example</groupId>
  <artifactId>placeholder</artifactId>
  <version>0.0.1-SNAPSHOT</version>
  <packaging>pom</packaging>
  <name>Example name should be changed</name>
  <description>Example description should be changed</description>
  <parent/>
  <properties/>
  <dependencies/>
  <dependencyManagement/>
  <build/>
  <reporting/>
  <modules/>
  <repositories/>
  <pluginRepositories/>
  <profiles/>
  <url/>
  <inceptionYear/>
  <licenses/>
  <organization/>
  <developers/>
  <contributors/>
  <issueManagement/>
  <ciManagement/>
  <mailingLists/>
  <scm/>
  <prerequisites/>
  <distributionManagement/>
</project>
"#;

const DEPENDENCIES_XPATH: &str = "/pom:project/pom:dependencies/pom:dependency";
const MODULES_XPATH: &str = "/pom:project/pom:modules/pom:module";
const PLUGINS_XPATH: &str = "/pom:project/pom:build/pom:plugins/pom:plugin";
const OVERLAYS_XPATH: &str =
    "/pom:project/pom:build/pom:plugins/pom:plugin/pom:configuration/pom:overlays";

/// Dependency coordinates used both as a query and as the data to write
///
/// When used as a query every optional field that is set must match exactly.
/// `system_path` is never part of the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub type_: Option<String>,
    pub scope: Option<String>,
    pub system_path: Option<String>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_system_path(mut self, system_path: impl Into<String>) -> Self {
        self.system_path = Some(system_path.into());
        self
    }
}

/// An editable build descriptor
#[derive(Debug, Clone)]
pub struct MavenPom {
    doc: Document,
}

impl MavenPom {
    /// Parse `source`, or start from the canonical skeleton when it is absent or blank
    pub fn new(source: Option<&str>) -> Result<Self, XmlError> {
        let text = source.filter(|s| !s.trim().is_empty()).unwrap_or(SKELETON);
        Ok(Self {
            doc: Document::parse(text)?,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn project(&self) -> NodeId {
        self.doc.document_element()
    }

    /// Text of a child element, `None` when the element is missing
    fn child_text(&self, node: NodeId, tag: &str) -> Result<Option<String>, XmlError> {
        Ok(self
            .doc
            .get_child(node, "pom", tag)?
            .map(|child| self.doc.text_content(child)))
    }

    pub fn top_level_element(&self, prefix: &str, tag: &str) -> Result<Option<NodeId>, XmlError> {
        self.doc.get_child(self.project(), prefix, tag)
    }

    pub fn get_or_create_top_level_element(
        &mut self,
        prefix: &str,
        tag: &str,
    ) -> Result<NodeId, XmlError> {
        let project = self.project();
        self.doc.get_or_create_child(project, prefix, tag)
    }

    pub fn set_top_level_element_text_content(
        &mut self,
        prefix: &str,
        tag: &str,
        value: &str,
    ) -> Result<(), XmlError> {
        let element = self.get_or_create_top_level_element(prefix, tag)?;
        self.doc.set_text_content(element, value);
        Ok(())
    }

    pub fn top_level_text(&self, prefix: &str, tag: &str) -> Result<Option<String>, XmlError> {
        Ok(self
            .top_level_element(prefix, tag)?
            .map(|element| self.doc.text_content(element)))
    }

    /// Set the project coordinates
    ///
    /// A group or version equal to the inherited placeholder removes the
    /// element instead, so the value is inherited from the parent.
    pub fn set_project_gav(
        &mut self,
        group_id: Option<&str>,
        artifact_id: Option<&str>,
        version: Option<&str>,
        packaging: Option<&str>,
    ) -> Result<(), XmlError> {
        let project = self.project();
        self.doc
            .set_or_clear_child_text(
                project,
                "pom",
                "groupId",
                group_id,
                Some(VAR_PROJECT_GROUPID),
            )?;
        self.doc
            .set_or_clear_child_text(project, "pom", "artifactId", artifact_id, None)?;
        self.doc
            .set_or_clear_child_text(
                project,
                "pom",
                "version",
                version,
                Some(VAR_PROJECT_VERSION),
            )?;
        self.doc
            .set_or_clear_child_text(project, "pom", "packaging", packaging, None)
    }

    pub fn set_parent_gav(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<(), XmlError> {
        let parent = self.get_or_create_top_level_element("pom", "parent")?;
        for (tag, value) in [
            ("groupId", group_id),
            ("artifactId", artifact_id),
            ("version", version),
        ] {
            let node = self.doc.get_or_create_child(parent, "pom", tag)?;
            self.doc.set_text_content(node, value);
        }
        Ok(())
    }

    /// First dependency matching the query
    pub fn find_dependency(&self, query: &Dependency) -> Result<Option<NodeId>, XmlError> {
        if query.group_id.is_empty() || query.artifact_id.is_empty() {
            return Ok(None);
        }
        for dependency in self.doc.select_matching_xpath(DEPENDENCIES_XPATH, self.doc.root())? {
            let refinements = [
                ("version", &query.version),
                ("type", &query.type_),
                ("scope", &query.scope),
            ];
            let mut matched = self.child_text(dependency, "groupId")?.as_deref()
                == Some(query.group_id.as_str())
                && self.child_text(dependency, "artifactId")?.as_deref()
                    == Some(query.artifact_id.as_str());
            for (tag, wanted) in refinements {
                if !matched {
                    break;
                }
                if let Some(wanted) = wanted {
                    matched = self.child_text(dependency, tag)?.as_deref() == Some(wanted.as_str());
                }
            }
            if matched {
                return Ok(Some(dependency));
            }
        }
        Ok(None)
    }

    /// Update the matching dependency or append a new one
    ///
    /// Optional fields that are `None` are removed from the written element.
    pub fn add_dependency(&mut self, dependency: &Dependency) -> Result<NodeId, XmlError> {
        let node = match self.find_dependency(dependency)? {
            Some(node) => node,
            None => {
                let container = self.get_or_create_top_level_element("pom", "dependencies")?;
                self.doc.create_child(container, "pom", "dependency", false)?
            }
        };
        for (tag, value) in [
            ("groupId", Some(dependency.group_id.as_str())),
            ("artifactId", Some(dependency.artifact_id.as_str())),
            ("version", dependency.version.as_deref()),
            ("type", dependency.type_.as_deref()),
            ("scope", dependency.scope.as_deref()),
            ("systemPath", dependency.system_path.as_deref()),
        ] {
            self.doc.set_or_clear_child_text(node, "pom", tag, value, None)?;
        }
        Ok(node)
    }

    /// Remove the first dependency matching the query; returns whether one was removed
    pub fn remove_dependency(&mut self, query: &Dependency) -> Result<bool, XmlError> {
        Ok(match self.find_dependency(query)? {
            Some(node) => self.detach(node),
            None => false,
        })
    }

    /// Nested module entry with exactly this text
    pub fn find_module(&self, name: &str) -> Result<Option<NodeId>, XmlError> {
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self
            .doc
            .select_matching_xpath(MODULES_XPATH, self.doc.root())?
            .into_iter()
            .find(|node| self.doc.text_content(*node) == name))
    }

    /// Add a nested module, at the front of the list when `at_front` is set
    pub fn add_module(&mut self, name: &str, at_front: bool) -> Result<NodeId, XmlError> {
        let node = match self.find_module(name)? {
            Some(node) => node,
            None => {
                let modules = self.get_or_create_top_level_element("pom", "modules")?;
                self.doc.create_child(modules, "pom", "module", at_front)?
            }
        };
        self.doc.set_text_content(node, name);
        Ok(node)
    }

    pub fn remove_module(&mut self, name: &str) -> Result<bool, XmlError> {
        Ok(match self.find_module(name)? {
            Some(node) => self.detach(node),
            None => false,
        })
    }

    /// Build plugin by artifactId, refined by groupId when one is given
    pub fn find_plugin(
        &self,
        group_id: Option<&str>,
        artifact_id: &str,
    ) -> Result<Option<NodeId>, XmlError> {
        if artifact_id.is_empty() {
            return Ok(None);
        }
        for plugin in self.doc.select_matching_xpath(PLUGINS_XPATH, self.doc.root())? {
            if self.child_text(plugin, "artifactId")?.as_deref() != Some(artifact_id) {
                continue;
            }
            let group_matches = match group_id {
                Some(group_id) => self.child_text(plugin, "groupId")?.as_deref() == Some(group_id),
                None => true,
            };
            if group_matches {
                return Ok(Some(plugin));
            }
        }
        Ok(None)
    }

    /// WAR overlay by groupId and artifactId, refined by type when one is given
    pub fn find_overlay(
        &self,
        group_id: &str,
        artifact_id: &str,
        type_: Option<&str>,
    ) -> Result<Option<NodeId>, XmlError> {
        if group_id.is_empty() || artifact_id.is_empty() {
            return Ok(None);
        }
        let overlays = self
            .doc
            .select_matching_xpath(&format!("{}/pom:overlay", OVERLAYS_XPATH), self.doc.root())?;
        for overlay in overlays {
            if self.child_text(overlay, "groupId")?.as_deref() != Some(group_id)
                || self.child_text(overlay, "artifactId")?.as_deref() != Some(artifact_id)
            {
                continue;
            }
            match type_ {
                Some(type_) if self.child_text(overlay, "type")?.as_deref() != Some(type_) => {}
                _ => return Ok(Some(overlay)),
            }
        }
        Ok(None)
    }

    /// Add or update an overlay inside the first existing `<overlays>` container
    ///
    /// Returns `Ok(None)` without touching the document when no plugin
    /// declares an overlays container yet.
    pub fn add_overlay(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        type_: &str,
    ) -> Result<Option<NodeId>, XmlError> {
        let overlay = match self.find_overlay(group_id, artifact_id, Some(type_))? {
            Some(overlay) => overlay,
            None => match self
                .doc
                .first_node_matching_xpath(OVERLAYS_XPATH, self.doc.root())?
            {
                Some(overlays) => self.doc.create_child(overlays, "pom", "overlay", false)?,
                None => return Ok(None),
            },
        };
        for (tag, value) in [("groupId", group_id), ("artifactId", artifact_id), ("type", type_)] {
            let node = self.doc.get_or_create_child(overlay, "pom", tag)?;
            self.doc.set_text_content(node, value);
        }
        Ok(Some(overlay))
    }

    pub fn remove_overlay(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        type_: Option<&str>,
    ) -> Result<bool, XmlError> {
        Ok(match self.find_overlay(group_id, artifact_id, type_)? {
            Some(node) => self.detach(node),
            None => false,
        })
    }

    /// Set `<properties><tag>value</tag></properties>`
    pub fn set_property(&mut self, tag: &str, value: &str) -> Result<NodeId, XmlError> {
        let properties = self.get_or_create_top_level_element("pom", "properties")?;
        let property = self.doc.get_or_create_child(properties, "pom", tag)?;
        self.doc.set_text_content(property, value);
        Ok(property)
    }

    fn detach(&mut self, node: NodeId) -> bool {
        match self.doc.parent(node) {
            Some(parent) => self.doc.remove_parents_child(parent, node),
            None => false,
        }
    }

    pub fn to_xml_string(&self) -> String {
        self.doc.pretty_print()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pom_with_dependencies() -> MavenPom {
        MavenPom::new(Some(
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <dependencies>
    <dependency><groupId>g</groupId><artifactId>a</artifactId><version>1</version><scope>compile</scope></dependency>
    <dependency><groupId>g</groupId><artifactId>a</artifactId><version>2</version><scope>test</scope></dependency>
  </dependencies>
</project>"#,
        ))
        .unwrap()
    }

    fn version_of(pom: &MavenPom, node: NodeId) -> Option<String> {
        pom.child_text(node, "version").unwrap()
    }

    #[test]
    fn test_empty_source_uses_skeleton() {
        let pom = MavenPom::new(None).unwrap();
        assert_eq!(
            pom.top_level_text("pom", "modelVersion").unwrap().as_deref(),
            Some("4.0.0")
        );
        assert!(pom.top_level_element("pom", "modules").unwrap().is_some());
        let blank = MavenPom::new(Some("  \n")).unwrap();
        assert_eq!(blank.to_xml_string(), pom.to_xml_string());
    }

    #[test]
    fn test_malformed_source_is_an_error() {
        assert!(MavenPom::new(Some("<project>")).is_err());
    }

    #[test]
    fn test_find_dependency_exact_refinement() {
        let pom = pom_with_dependencies();
        let first = pom
            .find_dependency(&Dependency::new("g", "a").with_version("1").with_scope("compile"))
            .unwrap()
            .unwrap();
        assert_eq!(version_of(&pom, first).as_deref(), Some("1"));

        let second = pom
            .find_dependency(&Dependency::new("g", "a").with_version("2").with_scope("test"))
            .unwrap()
            .unwrap();
        assert_eq!(version_of(&pom, second).as_deref(), Some("2"));

        let any = pom.find_dependency(&Dependency::new("g", "a")).unwrap();
        assert_eq!(any, Some(first));

        assert!(pom
            .find_dependency(&Dependency::new("g", "a").with_version("1").with_scope("test"))
            .unwrap()
            .is_none());
        assert!(pom
            .find_dependency(&Dependency::new("g", "a").with_type("amp"))
            .unwrap()
            .is_none());
        assert!(pom.find_dependency(&Dependency::new("", "a")).unwrap().is_none());
    }

    #[test]
    fn test_add_dependency_is_idempotent() {
        let mut pom = MavenPom::new(None).unwrap();
        let dependency = Dependency::new("g", "a")
            .with_version("1.0")
            .with_type("amp")
            .with_scope("system")
            .with_system_path("${project.basedir}/../a");
        let first = pom.add_dependency(&dependency).unwrap();
        let again = pom.add_dependency(&dependency).unwrap();
        assert_eq!(first, again);

        let doc = pom.document();
        let all = doc.select_matching_xpath(DEPENDENCIES_XPATH, doc.root()).unwrap();
        assert_eq!(all.len(), 1);
        assert!(pom.to_xml_string().contains(
            "<dependency>\n      <groupId>g</groupId>\n      <artifactId>a</artifactId>\n      <version>1.0</version>\n      <type>amp</type>\n      <scope>system</scope>\n      <systemPath>${project.basedir}/../a</systemPath>\n    </dependency>"
        ));

        assert!(pom.remove_dependency(&Dependency::new("g", "a")).unwrap());
        assert!(!pom.remove_dependency(&Dependency::new("g", "a")).unwrap());
    }

    #[test]
    fn test_modules_keep_order() {
        let mut pom = MavenPom::new(None).unwrap();
        pom.add_module("b", false).unwrap();
        pom.add_module("a", true).unwrap();
        pom.add_module("c", false).unwrap();
        pom.add_module("a", true).unwrap();
        let doc = pom.document();
        let names: Vec<String> = doc
            .select_matching_xpath(MODULES_XPATH, doc.root())
            .unwrap()
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        assert!(pom.remove_module("b").unwrap());
        assert!(pom.find_module("b").unwrap().is_none());
        assert!(pom.find_module("").unwrap().is_none());
    }

    #[test]
    fn test_project_and_parent_gav() {
        let mut pom = MavenPom::new(None).unwrap();
        pom.set_project_gav(
            Some("${project.groupId}"),
            Some("a"),
            Some("${project.version}"),
            Some("amp"),
        )
        .unwrap();
        assert!(pom.top_level_element("pom", "groupId").unwrap().is_none());
        assert!(pom.top_level_element("pom", "version").unwrap().is_none());
        assert_eq!(pom.top_level_text("pom", "artifactId").unwrap().as_deref(), Some("a"));
        assert_eq!(pom.top_level_text("pom", "packaging").unwrap().as_deref(), Some("amp"));

        pom.set_parent_gav("g", "parent", "1.0").unwrap();
        let parent = pom.top_level_element("pom", "parent").unwrap().unwrap();
        assert_eq!(pom.child_text(parent, "artifactId").unwrap().as_deref(), Some("parent"));
        assert_eq!(pom.child_text(parent, "version").unwrap().as_deref(), Some("1.0"));
    }

    #[test]
    fn test_find_plugin_with_and_without_group() {
        let pom = MavenPom::new(Some(
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><build><plugins>
<plugin><groupId>org.apache.maven.plugins</groupId><artifactId>maven-war-plugin</artifactId></plugin>
</plugins></build></project>"#,
        ))
        .unwrap();
        assert!(pom.find_plugin(None, "maven-war-plugin").unwrap().is_some());
        assert!(pom
            .find_plugin(Some("org.apache.maven.plugins"), "maven-war-plugin")
            .unwrap()
            .is_some());
        assert!(pom.find_plugin(Some("other"), "maven-war-plugin").unwrap().is_none());
        assert!(pom.find_plugin(None, "missing").unwrap().is_none());
    }

    #[test]
    fn test_overlays_need_a_container() {
        let mut pom = MavenPom::new(None).unwrap();
        assert_eq!(pom.add_overlay("g", "a", "amp").unwrap(), None);

        let mut pom = MavenPom::new(Some(
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><build><plugins><plugin>
<artifactId>maven-war-plugin</artifactId><configuration><overlays/></configuration>
</plugin></plugins></build></project>"#,
        ))
        .unwrap();
        let overlay = pom.add_overlay("g", "a", "amp").unwrap().unwrap();
        assert_eq!(pom.add_overlay("g", "a", "amp").unwrap(), Some(overlay));
        assert_eq!(pom.find_overlay("g", "a", None).unwrap(), Some(overlay));
        assert!(pom.find_overlay("g", "a", Some("jar")).unwrap().is_none());
        assert!(pom.remove_overlay("g", "a", Some("amp")).unwrap());
        assert!(pom.find_overlay("g", "a", None).unwrap().is_none());
    }

    #[test]
    fn test_set_property() {
        let mut pom = MavenPom::new(None).unwrap();
        pom.set_property("alfresco.version", "5.1").unwrap();
        pom.set_property("alfresco.version", "5.2").unwrap();
        assert!(pom
            .to_xml_string()
            .contains("<properties>\n    <alfresco.version>5.2</alfresco.version>\n  </properties>"));
    }
}
