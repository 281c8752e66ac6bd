//! Arena-backed XML document model
//!
//! Nodes are never freed: removing a node detaches it from its parent, so a
//! `NodeId` obtained earlier stays valid (it just no longer has a parent).

use super::XmlError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Handle to a node inside a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Handle to a named attribute of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRef {
    pub element: NodeId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    /// Qualified name as written (may carry a prefix)
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    CData(String),
    Comment(String),
    DocType(String),
    Instruction(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) declaration: Option<String>,
    element: NodeId,
}

/// Prefix -> namespace URI bindings in scope; the empty prefix is the default namespace
type Scope = BTreeMap<String, String>;

fn utf8(bytes: &[u8], position: u64) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(|e| XmlError::Parse {
        position,
        message: e.to_string(),
    })
}

/// Line breaks in character data are normalized to `\n`
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

impl Document {
    /// Parse a string into a document. Fails on malformed XML.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut doc = Document {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
            element: NodeId(0),
        };
        let root = doc.root();
        let mut reader = Reader::from_str(text);
        let mut open: Vec<NodeId> = vec![root];
        let mut scopes: Vec<Scope> = vec![Scope::new()];
        let mut document_element: Option<NodeId> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let fail = |message: String| XmlError::Parse { position, message };
            let event = reader.read_event().map_err(|e| fail(e.to_string()))?;
            let parent = *open.last().unwrap_or(&root);

            match event {
                Event::Decl(decl) => {
                    doc.declaration = Some(utf8(&decl, position)?.trim().to_string());
                }
                Event::Start(start) | Event::Empty(start)
                    if parent == root && document_element.is_some() =>
                {
                    let name = utf8(start.name().as_ref(), position)?.to_string();
                    return Err(fail(format!("unexpected second root element <{}>", name)));
                }
                Event::Start(start) => {
                    let id = doc.open_element(&start, &mut scopes, position)?;
                    doc.append_child(parent, id);
                    if parent == root {
                        document_element = Some(id);
                    }
                    open.push(id);
                }
                Event::Empty(start) => {
                    let id = doc.open_element(&start, &mut scopes, position)?;
                    scopes.pop();
                    doc.append_child(parent, id);
                    if parent == root {
                        document_element = Some(id);
                    }
                }
                Event::End(_) => {
                    open.pop();
                    scopes.pop();
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| fail(e.to_string()))?;
                    if parent == root {
                        if !value.trim().is_empty() {
                            return Err(fail("text outside of the root element".to_string()));
                        }
                    } else {
                        let id = doc.push_node(NodeKind::Text(normalize_newlines(&value)));
                        doc.append_child(parent, id);
                    }
                }
                Event::CData(data) => {
                    let value = normalize_newlines(utf8(&data, position)?);
                    let id = doc.push_node(NodeKind::CData(value));
                    doc.append_child(parent, id);
                }
                Event::Comment(comment) => {
                    let value = normalize_newlines(utf8(&comment, position)?);
                    let id = doc.push_node(NodeKind::Comment(value));
                    doc.append_child(parent, id);
                }
                Event::DocType(doctype) => {
                    let value = normalize_newlines(utf8(&doctype, position)?.trim());
                    let id = doc.push_node(NodeKind::DocType(value));
                    doc.append_child(root, id);
                }
                Event::PI(instruction) => {
                    let value = normalize_newlines(utf8(&instruction, position)?);
                    let id = doc.push_node(NodeKind::Instruction(value));
                    doc.append_child(parent, id);
                }
                Event::Eof => break,
            }
        }

        if open.len() > 1 {
            let unclosed = open.last().map(|id| doc.name(*id).to_string());
            return Err(XmlError::Parse {
                position: text.len() as u64,
                message: format!("unclosed element <{}>", unclosed.unwrap_or_default()),
            });
        }
        doc.element = document_element.ok_or(XmlError::Parse {
            position: text.len() as u64,
            message: "document has no root element".to_string(),
        })?;
        Ok(doc)
    }

    fn open_element(
        &mut self,
        start: &BytesStart<'_>,
        scopes: &mut Vec<Scope>,
        position: u64,
    ) -> Result<NodeId, XmlError> {
        let name = utf8(start.name().as_ref(), position)?.to_string();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| XmlError::Parse {
                position,
                message: e.to_string(),
            })?;
            let key = utf8(attribute.key.as_ref(), position)?.to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| XmlError::Parse {
                    position,
                    message: e.to_string(),
                })?
                .into_owned();
            attributes.push((key, value));
        }

        let mut scope = scopes.last().cloned().unwrap_or_default();
        for (key, value) in &attributes {
            if key == "xmlns" {
                scope.insert(String::new(), value.clone());
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.insert(prefix.to_string(), value.clone());
            }
        }

        let prefix = name.split_once(':').map(|(p, _)| p).unwrap_or("");
        let namespace = match scope.get(prefix) {
            Some(uri) if !uri.is_empty() => Some(uri.clone()),
            Some(_) => None,
            None if prefix.is_empty() => None,
            None => {
                return Err(XmlError::Parse {
                    position,
                    message: format!("undeclared namespace prefix '{}'", prefix),
                })
            }
        };
        scopes.push(scope);

        Ok(self.push_node(NodeKind::Element(ElementData {
            name,
            namespace,
            attributes,
        })))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// The document node (parent of the root element and any prolog nodes)
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The root element
    pub fn document_element(&self) -> NodeId {
        self.element
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    pub(crate) fn element_data(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_data_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Qualified element name, empty for non-element nodes
    pub fn name(&self, id: NodeId) -> &str {
        self.element_data(id).map(|e| e.name.as_str()).unwrap_or("")
    }

    /// Element name without its prefix
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        name.split_once(':').map(|(_, local)| local).unwrap_or(name)
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.element_data(id).and_then(|e| e.namespace.as_deref())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    /// All elements below `id` in document order (excluding `id` itself)
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.is_element(next) {
                found.push(next);
                stack.extend(self.children(next).iter().rev().copied());
            }
        }
        found
    }

    /// Concatenated text of all descendant text and CDATA nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }

    fn collect_text(&self, id: NodeId, text: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) | NodeKind::CData(t) => text.push_str(t),
            NodeKind::Element(_) | NodeKind::Document => {
                for child in self.children(id) {
                    self.collect_text(*child, text);
                }
            }
            _ => {}
        }
    }

    /// Replace all children of `id` with a single text node (none when `text` is empty)
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            let node = self.push_node(NodeKind::Text(text.to_string()));
            self.append_child(id, node);
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element_data(id)?
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_data_mut(id) {
            match element.attributes.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => element
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
        }))
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Move `child` in front of `reference`; appends when `reference` is not a child of `parent`
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|s| *s == reference) {
            Some(index) => siblings.insert(index, child),
            None => siblings.push(child),
        }
    }

    /// Remove `child` from whatever parent it has
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != child);
        }
    }
}
