//! Tomcat context editor
//!
//! A development-only container context lists extra static resource locations
//! in `Resources/@extraResourcePaths` (comma separated) and extra class
//! locations in `Loader/@virtualClasspath` (semicolon separated).

use crate::xml::{AttrRef, Document, XmlError};

const SKELETON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- ===================================================================================================================
     This context file is used only in a development IDE for rapid development,
     it is never released with the Alfresco.war or Share.war

     IMPORTANT: If a source AMP or JAR extension is added to one of the WAR files,
     then you need to add the paths below.
     =================================================================================================================-->
<Context docBase="${project.parent.basedir}/alfresco-war/target/${project.build.finalName}">
  <!-- Pick up static resource files from any Share extensions, being it a JAR or an AMP (this should not include docBase) -->
  <Resources className="org.apache.naming.resources.VirtualDirContext" extraResourcePaths=""/>
  <!-- Configure where the Share (share.war) web application can load classes, test classes, and config files -->
  <Loader className="org.apache.catalina.loader.VirtualWebappLoader" searchVirtualFirst="true" virtualClasspath=""/>
  <!-- Load from all directories, not just when the META-INF directory is found in exploded JAR -->
  <JarScanner scanAllDirectories="true"/>
</Context>
"#;

const RESOURCE_PATHS_SEPARATOR: &str = ",";
const CLASSPATH_SEPARATOR: &str = ";";

/// An editable container context document
#[derive(Debug, Clone)]
pub struct TomcatContext {
    doc: Document,
    extra_resource_paths: AttrRef,
    virtual_classpath: AttrRef,
}

impl TomcatContext {
    /// Parse `source`, or start from the development skeleton when it is absent or blank
    ///
    /// The document must carry `/Context/Resources` and `/Context/Loader`;
    /// their list attributes are created empty when missing.
    pub fn new(source: Option<&str>) -> Result<Self, XmlError> {
        let text = source.filter(|s| !s.trim().is_empty()).unwrap_or(SKELETON);
        let mut doc = Document::parse(text)?;
        let extra_resource_paths =
            Self::locate_attribute(&mut doc, "/Context/Resources", "extraResourcePaths")?;
        let virtual_classpath =
            Self::locate_attribute(&mut doc, "/Context/Loader", "virtualClasspath")?;
        Ok(Self {
            doc,
            extra_resource_paths,
            virtual_classpath,
        })
    }

    fn locate_attribute(
        doc: &mut Document,
        element: &str,
        name: &str,
    ) -> Result<AttrRef, XmlError> {
        if let Some(attr) = doc.select_attribute(&format!("{}/@{}", element, name), doc.root())? {
            return Ok(attr);
        }
        let owner = doc
            .first_node_matching_xpath(element, doc.root())?
            .ok_or_else(|| XmlError::MissingNode(element.to_string()))?;
        doc.set_attribute(owner, name, "");
        Ok(AttrRef {
            element: owner,
            name: name.to_string(),
        })
    }

    pub fn wipe_extra_resource_paths(&mut self) {
        self.doc.set_attribute(
            self.extra_resource_paths.element,
            &self.extra_resource_paths.name,
            "",
        );
    }

    pub fn wipe_virtual_classpath(&mut self) {
        self.doc
            .set_attribute(self.virtual_classpath.element, &self.virtual_classpath.name, "");
    }

    /// Append a `prefix=path` mapping, moving it last if already present
    pub fn add_extra_resource_path_map(&mut self, path_map: &str) {
        self.doc.append_to_attribute_value_list(
            &self.extra_resource_paths,
            path_map,
            RESOURCE_PATHS_SEPARATOR,
        );
    }

    pub fn remove_extra_resource_path_map(&mut self, path_map: &str) {
        self.doc.remove_from_attribute_value_list(
            &self.extra_resource_paths,
            path_map,
            RESOURCE_PATHS_SEPARATOR,
        );
    }

    /// Append a classpath entry, moving it last if already present
    pub fn add_virtual_classpath(&mut self, path: &str) {
        self.doc
            .append_to_attribute_value_list(&self.virtual_classpath, path, CLASSPATH_SEPARATOR);
    }

    pub fn remove_virtual_classpath(&mut self, path: &str) {
        self.doc
            .remove_from_attribute_value_list(&self.virtual_classpath, path, CLASSPATH_SEPARATOR);
    }

    pub fn extra_resource_paths(&self) -> Vec<String> {
        self.doc
            .attribute_tokens(&self.extra_resource_paths, RESOURCE_PATHS_SEPARATOR)
    }

    pub fn virtual_classpath(&self) -> Vec<String> {
        self.doc
            .attribute_tokens(&self.virtual_classpath, CLASSPATH_SEPARATOR)
    }

    pub fn to_xml_string(&self) -> String {
        self.doc.pretty_print()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_starts_empty() {
        let ctx = TomcatContext::new(None).unwrap();
        assert!(ctx.extra_resource_paths().is_empty());
        assert!(ctx.virtual_classpath().is_empty());
    }

    #[test]
    fn test_classpath_entries_are_unique_and_ordered() {
        let mut ctx = TomcatContext::new(None).unwrap();
        ctx.add_virtual_classpath("test-classes");
        ctx.add_virtual_classpath("a/classes");
        ctx.add_virtual_classpath("test-classes");
        assert_eq!(ctx.virtual_classpath(), vec!["a/classes", "test-classes"]);
        assert!(ctx
            .to_xml_string()
            .contains(r#"virtualClasspath="a/classes;test-classes""#));

        ctx.remove_virtual_classpath("a/classes");
        assert_eq!(ctx.virtual_classpath(), vec!["test-classes"]);
        ctx.wipe_virtual_classpath();
        assert!(ctx.virtual_classpath().is_empty());
    }

    #[test]
    fn test_resource_path_maps() {
        let mut ctx = TomcatContext::new(None).unwrap();
        ctx.add_extra_resource_path_map("/=a/web");
        ctx.add_extra_resource_path_map("/=b/web");
        assert!(ctx
            .to_xml_string()
            .contains(r#"extraResourcePaths="/=a/web,/=b/web""#));
        ctx.remove_extra_resource_path_map("/=a/web");
        assert_eq!(ctx.extra_resource_paths(), vec!["/=b/web"]);
        ctx.wipe_extra_resource_paths();
        assert!(ctx.extra_resource_paths().is_empty());
    }

    #[test]
    fn test_missing_attributes_are_created() {
        let mut ctx =
            TomcatContext::new(Some(r#"<Context><Resources/><Loader/></Context>"#)).unwrap();
        ctx.add_virtual_classpath("x");
        assert!(ctx.to_xml_string().contains(r#"<Loader virtualClasspath="x"/>"#));
    }

    #[test]
    fn test_missing_elements_are_rejected() {
        assert!(matches!(
            TomcatContext::new(Some("<Context><Resources/></Context>")),
            Err(XmlError::MissingNode(_))
        ));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let mut ctx = TomcatContext::new(None).unwrap();
        ctx.add_virtual_classpath("${project.parent.basedir}/a/target/classes");
        let printed = ctx.to_xml_string();
        let reparsed = TomcatContext::new(Some(&printed)).unwrap();
        assert_eq!(reparsed.to_xml_string(), printed);
    }
}
