//! Editing primitives shared by the document editors

use super::dom::{AttrRef, Document, NodeId};
use super::{lookup_namespace_uri, XmlError};

impl Document {
    /// Create a namespaced child, appended last or inserted first
    ///
    /// There is no existence check: multi-valued elements such as
    /// `<dependency>` rely on getting a fresh sibling every time.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        prefix: &str,
        tag: &str,
        at_front: bool,
    ) -> Result<NodeId, XmlError> {
        let namespace = lookup_namespace_uri(prefix)
            .ok_or_else(|| XmlError::UnknownPrefix(prefix.to_string()))?;
        let child = self.create_element(tag, Some(namespace));
        match self.children(parent).first().copied() {
            Some(first) if at_front => self.insert_before(parent, child, first),
            _ => self.append_child(parent, child),
        }
        Ok(child)
    }

    /// First child element with the given prefix and tag
    pub fn get_child(
        &self,
        node: NodeId,
        prefix: &str,
        tag: &str,
    ) -> Result<Option<NodeId>, XmlError> {
        if prefix.is_empty() || tag.is_empty() {
            return Err(XmlError::MissingArgument("get_child"));
        }
        self.first_node_matching_xpath(&format!("{}:{}", prefix, tag), node)
    }

    pub fn get_or_create_child(
        &mut self,
        node: NodeId,
        prefix: &str,
        tag: &str,
    ) -> Result<NodeId, XmlError> {
        match self.get_child(node, prefix, tag)? {
            Some(child) => Ok(child),
            None => self.create_child(node, prefix, tag, false),
        }
    }

    /// Remove the first matching child, if there is one
    pub fn remove_child(&mut self, node: NodeId, prefix: &str, tag: &str) -> Result<(), XmlError> {
        if let Some(child) = self.get_child(node, prefix, tag)? {
            self.detach(child);
        }
        Ok(())
    }

    /// Remove `child` only while it is still a child of `parent`
    pub fn remove_parents_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    /// Set the child's text, or remove the child when `text` is empty or equals `contra`
    ///
    /// Presence of the child means an explicit override; absence means the
    /// value is inherited.
    pub fn set_or_clear_child_text(
        &mut self,
        node: NodeId,
        prefix: &str,
        tag: &str,
        text: Option<&str>,
        contra: Option<&str>,
    ) -> Result<(), XmlError> {
        match text {
            Some(text) if !text.is_empty() && Some(text) != contra => {
                let child = self.get_or_create_child(node, prefix, tag)?;
                self.set_text_content(child, text);
                Ok(())
            }
            _ => self.remove_child(node, prefix, tag),
        }
    }

    /// Following sibling that is an element, skipping text and comments
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        self.children(parent)
            .iter()
            .skip_while(|c| **c != node)
            .skip(1)
            .copied()
            .find(|c| self.is_element(*c))
    }

    pub fn attribute_value(&self, attr: &AttrRef) -> Option<&str> {
        self.attribute(attr.element, &attr.name)
    }

    /// Append `value` to a separator-delimited attribute, moving it last if present
    pub fn append_to_attribute_value_list(&mut self, attr: &AttrRef, value: &str, separator: &str) {
        let mut tokens = self.attribute_tokens(attr, separator);
        tokens.retain(|t| t != value);
        tokens.push(value.to_string());
        self.set_attribute(attr.element, &attr.name, &tokens.join(separator));
    }

    pub fn remove_from_attribute_value_list(
        &mut self,
        attr: &AttrRef,
        value: &str,
        separator: &str,
    ) {
        let mut tokens = self.attribute_tokens(attr, separator);
        tokens.retain(|t| t != value);
        self.set_attribute(attr.element, &attr.name, &tokens.join(separator));
    }

    /// Non-empty trimmed tokens of a list-valued attribute
    pub fn attribute_tokens(&self, attr: &AttrRef, separator: &str) -> Vec<String> {
        self.attribute_value(attr)
            .unwrap_or("")
            .split(separator)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::POM_NAMESPACE;

    fn pom() -> Document {
        Document::parse(
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0"><!--c--><a/><b>x</b></project>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_create_child_positions() {
        let mut doc = pom();
        let root = doc.document_element();
        let last = doc.create_child(root, "pom", "last", false).unwrap();
        let first = doc.create_child(root, "pom", "first", true).unwrap();
        assert_eq!(doc.children(root).first(), Some(&first));
        assert_eq!(doc.children(root).last(), Some(&last));
        assert_eq!(doc.namespace_uri(first), Some(POM_NAMESPACE));
        assert!(matches!(
            doc.create_child(root, "bogus", "x", false),
            Err(XmlError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn test_get_child_and_get_or_create() {
        let mut doc = pom();
        let root = doc.document_element();
        let b = doc.get_child(root, "pom", "b").unwrap().unwrap();
        assert_eq!(doc.text_content(b), "x");
        assert!(doc.get_child(root, "pom", "missing").unwrap().is_none());
        assert!(matches!(
            doc.get_child(root, "", "b"),
            Err(XmlError::MissingArgument(_))
        ));

        let created = doc.get_or_create_child(root, "pom", "c").unwrap();
        assert_eq!(doc.get_or_create_child(root, "pom", "c").unwrap(), created);
        assert_eq!(doc.child_elements(root).count(), 3);
    }

    #[test]
    fn test_remove_child_and_parent_guard() {
        let mut doc = pom();
        let root = doc.document_element();
        let a = doc.get_child(root, "pom", "a").unwrap().unwrap();
        let b = doc.get_child(root, "pom", "b").unwrap().unwrap();
        assert!(!doc.remove_parents_child(a, b));
        assert!(doc.remove_parents_child(root, b));
        assert!(!doc.remove_parents_child(root, b));
        doc.remove_child(root, "pom", "a").unwrap();
        doc.remove_child(root, "pom", "a").unwrap();
        assert_eq!(doc.child_elements(root).count(), 0);
    }

    #[test]
    fn test_set_or_clear_child_text() {
        let mut doc = pom();
        let root = doc.document_element();
        doc.set_or_clear_child_text(root, "pom", "groupId", Some("g"), Some("${project.groupId}"))
            .unwrap();
        let group = doc.get_child(root, "pom", "groupId").unwrap().unwrap();
        assert_eq!(doc.text_content(group), "g");

        doc.set_or_clear_child_text(
            root,
            "pom",
            "groupId",
            Some("${project.groupId}"),
            Some("${project.groupId}"),
        )
        .unwrap();
        assert!(doc.get_child(root, "pom", "groupId").unwrap().is_none());

        doc.set_or_clear_child_text(root, "pom", "b", Some(""), None).unwrap();
        assert!(doc.get_child(root, "pom", "b").unwrap().is_none());
    }

    #[test]
    fn test_next_element_sibling_skips_other_nodes() {
        let doc = Document::parse("<r><a/> text <!--c--><b/></r>").unwrap();
        let root = doc.document_element();
        let a = doc.child_elements(root).next().unwrap();
        let b = doc.next_element_sibling(a).unwrap();
        assert_eq!(doc.name(b), "b");
        assert_eq!(doc.next_element_sibling(b), None);
    }

    #[test]
    fn test_attribute_value_lists() {
        let mut doc = Document::parse(r#"<Loader virtualClasspath=" a ; b ;"/>"#).unwrap();
        let attr = AttrRef {
            element: doc.document_element(),
            name: "virtualClasspath".to_string(),
        };
        doc.append_to_attribute_value_list(&attr, "c", ";");
        assert_eq!(doc.attribute_value(&attr), Some("a;b;c"));
        doc.append_to_attribute_value_list(&attr, "a", ";");
        assert_eq!(doc.attribute_value(&attr), Some("b;c;a"));
        doc.remove_from_attribute_value_list(&attr, "c", ";");
        assert_eq!(doc.attribute_value(&attr), Some("b;a"));
        doc.remove_from_attribute_value_list(&attr, "missing", ";");
        assert_eq!(doc.attribute_value(&attr), Some("b;a"));
    }
}
