//! Canonical serialization
//!
//! The printed form is the on-disk format for every generated file, so it must
//! be a fixed point: printing, parsing and printing again yields the same bytes.

use super::dom::{Document, NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape};

const INDENT: &str = "  ";

impl Document {
    /// Indented serialization of the whole document, newline terminated
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        if let Some(declaration) = &self.declaration {
            out.push_str("<?");
            out.push_str(declaration);
            out.push_str("?>\n");
        }
        for child in self.children(self.root()) {
            if self.is_ignorable(*child) {
                continue;
            }
            self.write_node(&mut out, *child, 0, None);
            out.push('\n');
        }
        out
    }

    /// Serialize a single node (and its subtree) without a trailing newline
    pub fn node_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        if id == self.root() {
            return self.pretty_print();
        }
        self.write_node(&mut out, id, 0, None);
        out
    }

    fn is_ignorable(&self, id: NodeId) -> bool {
        matches!(&self.nodes[id.0].kind, NodeKind::Text(t) if t.trim().is_empty())
    }

    fn write_node(&self, out: &mut String, id: NodeId, depth: usize, default_ns: Option<&str>) {
        let indent = INDENT.repeat(depth);
        match &self.nodes[id.0].kind {
            NodeKind::Document => {}
            NodeKind::Element(_) => self.write_element(out, id, depth, default_ns),
            NodeKind::Text(text) => {
                out.push_str(&indent);
                out.push_str(&partial_escape(text.trim()));
            }
            NodeKind::CData(text) => {
                out.push_str(&indent);
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str(&indent);
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::DocType(text) => {
                out.push_str(&indent);
                out.push_str("<!DOCTYPE ");
                out.push_str(text);
                out.push('>');
            }
            NodeKind::Instruction(text) => {
                out.push_str(&indent);
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
        }
    }

    fn write_element(&self, out: &mut String, id: NodeId, depth: usize, default_ns: Option<&str>) {
        let Some(element) = self.element_data(id) else {
            return;
        };
        let indent = INDENT.repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&element.name);

        let mut child_default = default_ns;
        let declared_default = element
            .attributes
            .iter()
            .find(|(key, _)| key == "xmlns")
            .map(|(_, value)| value.as_str());
        match declared_default {
            Some(uri) => child_default = (!uri.is_empty()).then_some(uri),
            None if !element.name.contains(':') => {
                let namespace = element.namespace.as_deref();
                if namespace != default_ns {
                    out.push_str(" xmlns=\"");
                    out.push_str(&escape(namespace.unwrap_or("")));
                    out.push('"');
                    child_default = namespace;
                }
            }
            None => {}
        }

        for (key, value) in &element.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        let children: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|c| !self.is_ignorable(*c))
            .collect();
        if children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');

        let text_only = children.iter().all(|c| {
            matches!(
                self.nodes[c.0].kind,
                NodeKind::Text(_) | NodeKind::CData(_)
            )
        });
        if text_only {
            for child in &children {
                match &self.nodes[child.0].kind {
                    NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
                    NodeKind::CData(text) => {
                        out.push_str("<![CDATA[");
                        out.push_str(text);
                        out.push_str("]]>");
                    }
                    _ => {}
                }
            }
        } else {
            out.push('\n');
            for child in &children {
                self.write_node(out, *child, depth + 1, child_default);
                out.push('\n');
            }
            out.push_str(&indent);
        }
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pretty_print_layout() {
        let doc = Document::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?><project xmlns="http://maven.apache.org/POM/4.0.0"><modules><module>a</module></modules><build/><!--note--><name>x &amp; y</name></project>"#,
        )
        .unwrap();
        assert_eq!(
            doc.pretty_print(),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modules>
    <module>a</module>
  </modules>
  <build/>
  <!--note-->
  <name>x &amp; y</name>
</project>
"#
        );
    }

    #[test]
    fn test_created_elements_inherit_the_default_namespace() {
        let mut doc =
            Document::parse(r#"<project xmlns="http://maven.apache.org/POM/4.0.0"/>"#).unwrap();
        let root = doc.document_element();
        let child = doc.create_element("modules", Some(crate::xml::POM_NAMESPACE));
        doc.append_child(root, child);
        let foreign = doc.create_element("other", Some(crate::xml::EXAMPLE_NAMESPACE));
        doc.append_child(child, foreign);
        assert_eq!(
            doc.pretty_print(),
            r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modules>
    <other xmlns="http://www.example.com/"/>
  </modules>
</project>
"#
        );
    }

    #[test]
    fn test_round_trip_is_stable() {
        let source = r#"<?xml version='1.0' encoding='UTF-8'?>
<!-- header -->
<!DOCTYPE beans PUBLIC "-//SPRING//DTD BEAN//EN" "http://www.springframework.org/dtd/spring-beans.dtd">
<beans>
    <import resource="a.xml"/>

    <bean id="x">  mixed <value>1</value> text </bean>
    <script><![CDATA[a < b]]></script>
</beans>"#;
        let first = Document::parse(source).unwrap().pretty_print();
        let second = Document::parse(&first).unwrap().pretty_print();
        assert_eq!(first, second);
        assert!(first.contains("<!DOCTYPE beans PUBLIC"));
        assert!(first.contains("    mixed\n"));
    }

    #[test]
    fn test_windows_line_endings_are_normalized() {
        let source = "<beans>\r\n  <!-- first\r\n       second -->\r\n  <bean id=\"x\"/>\r\n</beans>\r\n";
        let printed = Document::parse(source).unwrap().pretty_print();
        assert!(!printed.contains('\r'));
        assert!(printed.contains("<!-- first\n       second -->"));
    }

    #[test]
    fn test_node_to_string() {
        let doc = Document::parse(r#"<a><b c="1">t</b></a>"#).unwrap();
        let b = doc.child_elements(doc.document_element()).next().unwrap();
        assert_eq!(doc.node_to_string(b), r#"<b c="1">t</b>"#);
    }
}
