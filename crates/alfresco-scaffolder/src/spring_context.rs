//! Spring bean context editor
//!
//! Only the `<import resource="..."/>` list is modelled. Imports keep their
//! declaration order and a resource is never imported twice.

use crate::xml::{Document, NodeId, XmlError};

const SKELETON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!--
        Licensed to the Apache Software Foundation (ASF) under one or more
        contributor license agreements.  See the NOTICE file distributed with
        this work for additional information regarding copyright ownership.
        The ASF licenses this file to You under the Apache License, Version 2.0
        (the "License"); you may not use this file except in compliance with
        the License.  You may obtain a copy of the License at

        http://www.apache.org/licenses/LICENSE-2.0

        Unless required by applicable law or agreed to in writing, software
        distributed under the License is distributed on an "AS IS" BASIS,
        WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
        See the License for the specific language governing permissions and
        limitations under the License.

-->
<!DOCTYPE beans PUBLIC "-//SPRING//DTD BEAN//EN" "http://www.springframework.org/dtd/spring-beans.dtd">
<beans/>
"#;

/// An editable bean context document
#[derive(Debug, Clone)]
pub struct SpringContext {
    doc: Document,
}

impl SpringContext {
    /// Parse `source`, or start from an empty `<beans>` context when it is absent or blank
    pub fn new(source: Option<&str>) -> Result<Self, XmlError> {
        let text = source.filter(|s| !s.trim().is_empty()).unwrap_or(SKELETON);
        Ok(Self {
            doc: Document::parse(text)?,
        })
    }

    fn import_nodes(&self) -> Vec<NodeId> {
        self.doc
            .descendant_elements(self.doc.document_element())
            .into_iter()
            .filter(|node| self.doc.local_name(*node) == "import")
            .collect()
    }

    /// Resources of every import, in document order
    pub fn imports(&self) -> Vec<String> {
        self.import_nodes()
            .into_iter()
            .filter_map(|node| self.doc.attribute(node, "resource").map(str::to_string))
            .collect()
    }

    pub fn has_import(&self, resource: &str) -> bool {
        self.import_nodes()
            .into_iter()
            .any(|node| self.doc.attribute(node, "resource") == Some(resource))
    }

    /// Insert an import right after the last existing one, or first when there are none
    ///
    /// Does nothing when the resource is already imported.
    pub fn add_import(&mut self, resource: &str) {
        if self.has_import(resource) {
            return;
        }
        let beans = self.doc.document_element();
        let namespace = self.doc.namespace_uri(beans).map(str::to_string);
        let import = self.doc.create_element("import", namespace.as_deref());
        self.doc.set_attribute(import, "resource", resource);

        match self.import_nodes().last().copied() {
            Some(last) => {
                let parent = self.doc.parent(last).unwrap_or(beans);
                let siblings = self.doc.children(parent);
                let next = siblings
                    .iter()
                    .position(|node| *node == last)
                    .and_then(|index| siblings.get(index + 1))
                    .copied();
                match next {
                    Some(next) => self.doc.insert_before(parent, import, next),
                    None => self.doc.append_child(parent, import),
                }
            }
            None => match self.doc.children(beans).first().copied() {
                Some(first) => self.doc.insert_before(beans, import, first),
                None => self.doc.append_child(beans, import),
            },
        }
    }

    /// Remove the import with exactly this resource; returns whether one was removed
    pub fn remove_import(&mut self, resource: &str) -> bool {
        let found = self
            .import_nodes()
            .into_iter()
            .find(|node| self.doc.attribute(*node, "resource") == Some(resource));
        match found.and_then(|node| self.doc.parent(node).map(|parent| (parent, node))) {
            Some((parent, node)) => self.doc.remove_parents_child(parent, node),
            None => false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn to_xml_string(&self) -> String {
        self.doc.pretty_print()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_skeleton_has_no_imports() {
        let ctx = SpringContext::new(None).unwrap();
        assert!(ctx.imports().is_empty());
        assert!(ctx.to_xml_string().contains("<!DOCTYPE beans PUBLIC"));
        assert!(ctx.to_xml_string().ends_with("<beans/>\n"));
    }

    #[test]
    fn test_add_import_appends_after_last_import() {
        let mut ctx = SpringContext::new(Some(
            r#"<beans><import resource="a"/><import resource="b"/><bean id="x"/></beans>"#,
        ))
        .unwrap();
        ctx.add_import("x");
        assert_eq!(ctx.imports(), vec!["a", "b", "x"]);
        ctx.add_import("x");
        assert_eq!(ctx.imports(), vec!["a", "b", "x"]);
        assert_eq!(
            ctx.to_xml_string(),
            r#"<beans>
  <import resource="a"/>
  <import resource="b"/>
  <import resource="x"/>
  <bean id="x"/>
</beans>
"#
        );
    }

    #[test]
    fn test_add_import_stays_above_comment_after_imports() {
        let mut ctx = SpringContext::new(Some(
            r#"<beans><import resource="a"/><!-- beans --><bean id="x"/></beans>"#,
        ))
        .unwrap();
        ctx.add_import("b");
        assert_eq!(
            ctx.to_xml_string(),
            r#"<beans>
  <import resource="a"/>
  <import resource="b"/>
  <!-- beans -->
  <bean id="x"/>
</beans>
"#
        );
    }

    #[test]
    fn test_first_import_goes_to_the_front() {
        let mut ctx = SpringContext::new(Some(r#"<beans><bean id="x"/></beans>"#)).unwrap();
        ctx.add_import("first");
        let beans = ctx.document().document_element();
        let first = ctx.document().child_elements(beans).next().unwrap();
        assert_eq!(ctx.document().name(first), "import");

        let mut empty = SpringContext::new(None).unwrap();
        empty.add_import("only");
        assert!(empty.has_import("only"));
    }

    #[test]
    fn test_namespaced_context_keeps_namespace() {
        let mut ctx = SpringContext::new(Some(
            r#"<beans xmlns="http://www.springframework.org/schema/beans"><import resource="a"/></beans>"#,
        ))
        .unwrap();
        ctx.add_import("b");
        assert!(!ctx.to_xml_string().contains("xmlns=\"\""));
    }

    #[test]
    fn test_remove_import() {
        let mut ctx =
            SpringContext::new(Some(r#"<beans><import resource="a"/><import resource="b"/></beans>"#))
                .unwrap();
        assert!(ctx.remove_import("a"));
        assert!(!ctx.remove_import("a"));
        assert!(!ctx.has_import("a"));
        assert_eq!(ctx.imports(), vec!["b"]);
    }
}
