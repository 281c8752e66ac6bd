//! Restricted XPath evaluation
//!
//! Supported grammar (enough for build descriptors and context files):
//!
//! ```text
//! path      := ['/'] step (('/' | '//') step)* ['/' '@' name]
//! step      := ('*' | [prefix ':'] name) predicate*
//! predicate := '[' integer ']'
//!            | '[' [prefix ':'] name '=' quoted ']'
//!            | '[' '@' name '=' quoted ']'
//! ```
//!
//! Prefixes resolve through the fixed table in `xml::lookup_namespace_uri`.
//! An unprefixed name matches only elements without a namespace.

use super::dom::{AttrRef, Document, NodeId};
use super::{lookup_namespace_uri, XmlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone)]
enum NameTest {
    Any,
    Name {
        namespace: Option<&'static str>,
        local: String,
    },
}

impl NameTest {
    fn parse(expression: &str, text: &str) -> Result<Self, XmlError> {
        let text = text.trim();
        if text == "*" {
            return Ok(Self::Any);
        }
        let (namespace, local) = match text.split_once(':') {
            Some((prefix, local)) => {
                let uri = lookup_namespace_uri(prefix)
                    .ok_or_else(|| XmlError::UnknownPrefix(prefix.to_string()))?;
                (Some(uri), local)
            }
            None => (None, text),
        };
        if local.is_empty() || !local.chars().all(is_name_char) {
            return Err(invalid(expression, format!("bad name test '{}'", text)));
        }
        Ok(Self::Name {
            namespace,
            local: local.to_string(),
        })
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Self::Any => doc.is_element(node),
            Self::Name { namespace, local } => {
                doc.is_element(node)
                    && doc.local_name(node) == local
                    && doc.namespace_uri(node) == *namespace
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    /// 1-based position among the nodes matched so far
    Position(usize),
    ChildText { test: NameTest, value: String },
    Attribute { name: String, value: String },
}

impl Predicate {
    fn parse(expression: &str, text: &str) -> Result<Self, XmlError> {
        let text = text.trim();
        if let Ok(position) = text.parse::<usize>() {
            if position == 0 {
                return Err(invalid(expression, "positions start at 1".to_string()));
            }
            return Ok(Self::Position(position));
        }
        let (lhs, rhs) = split_outside_quotes(text, '=')
            .ok_or_else(|| invalid(expression, format!("unsupported predicate '{}'", text)))?;
        let value = unquote(rhs.trim())
            .ok_or_else(|| invalid(expression, format!("expected a quoted value in '{}'", text)))?;
        let lhs = lhs.trim();
        match lhs.strip_prefix('@') {
            Some(name) => Ok(Self::Attribute {
                name: name.to_string(),
                value,
            }),
            None => Ok(Self::ChildText {
                test: NameTest::parse(expression, lhs)?,
                value,
            }),
        }
    }

    fn filter(&self, doc: &Document, nodes: Vec<NodeId>) -> Vec<NodeId> {
        match self {
            Self::Position(position) => nodes.get(position - 1).copied().into_iter().collect(),
            Self::ChildText { test, value } => nodes
                .into_iter()
                .filter(|node| {
                    doc.child_elements(*node)
                        .any(|c| test.matches(doc, c) && doc.text_content(c) == *value)
                })
                .collect(),
            Self::Attribute { name, value } => nodes
                .into_iter()
                .filter(|node| doc.attribute(*node, name) == Some(value.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    test: NameTest,
    predicates: Vec<Predicate>,
}

/// A compiled expression
#[derive(Debug, Clone)]
struct XPath {
    absolute: bool,
    steps: Vec<Step>,
    attribute: Option<String>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn invalid(expression: &str, reason: String) -> XmlError {
    XmlError::InvalidXPath {
        expression: expression.to_string(),
        reason,
    }
}

fn unquote(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(quote)).then(|| inner.to_string())
}

fn split_outside_quotes(text: &str, separator: char) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (index, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == separator => return Some((&text[..index], &text[index + 1..])),
            None => {}
        }
    }
    None
}

impl XPath {
    fn compile(expression: &str) -> Result<Self, XmlError> {
        let raw_steps = Self::split_steps(expression)?;
        let absolute = expression.starts_with('/');
        let mut steps = Vec::new();
        let mut attribute = None;
        let count = raw_steps.len();

        for (index, (axis, text)) in raw_steps.into_iter().enumerate() {
            if let Some(name) = text.strip_prefix('@') {
                if index + 1 != count || axis != Axis::Child || name.is_empty() {
                    return Err(invalid(
                        expression,
                        "an attribute may only be selected by the last step".to_string(),
                    ));
                }
                attribute = Some(name.to_string());
                continue;
            }
            let (name, predicates) = match text.find('[') {
                Some(open) => (&text[..open], Self::split_predicates(expression, &text[open..])?),
                None => (text, Vec::new()),
            };
            steps.push(Step {
                axis,
                test: NameTest::parse(expression, name)?,
                predicates: predicates
                    .into_iter()
                    .map(|p| Predicate::parse(expression, p))
                    .collect::<Result<_, _>>()?,
            });
        }

        if steps.is_empty() && attribute.is_none() {
            return Err(invalid(expression, "no steps".to_string()));
        }
        Ok(Self {
            absolute,
            steps,
            attribute,
        })
    }

    /// Split on '/' outside brackets and quotes, marking steps introduced by '//'
    fn split_steps(expression: &str) -> Result<Vec<(Axis, &str)>, XmlError> {
        let mut steps = Vec::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut start = 0usize;
        let mut axis = Axis::Child;
        let mut chars = expression.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    '"' | '\'' => quote = Some(c),
                    '[' => depth += 1,
                    ']' => {
                        depth = depth
                            .checked_sub(1)
                            .ok_or_else(|| invalid(expression, "unbalanced ']'".to_string()))?
                    }
                    '/' if depth == 0 => {
                        if index > start {
                            steps.push((axis, &expression[start..index]));
                        } else if index > 0 && axis == Axis::Child && !steps.is_empty() {
                            return Err(invalid(expression, "empty step".to_string()));
                        }
                        axis = Axis::Child;
                        if let Some((_, '/')) = chars.peek() {
                            chars.next();
                            axis = Axis::Descendant;
                        }
                        start = index + 1 + usize::from(axis == Axis::Descendant);
                    }
                    _ => {}
                },
            }
        }
        if quote.is_some() || depth != 0 {
            return Err(invalid(expression, "unterminated quote or bracket".to_string()));
        }
        if start >= expression.len() {
            return Err(invalid(expression, "expression ends with '/'".to_string()));
        }
        steps.push((axis, &expression[start..]));
        Ok(steps)
    }

    fn split_predicates<'a>(expression: &str, text: &'a str) -> Result<Vec<&'a str>, XmlError> {
        let mut predicates = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let body = rest
                .strip_prefix('[')
                .ok_or_else(|| invalid(expression, format!("unexpected '{}'", rest)))?;
            let (inner, after) = split_outside_quotes(body, ']')
                .ok_or_else(|| invalid(expression, "unterminated predicate".to_string()))?;
            predicates.push(inner);
            rest = after;
        }
        Ok(predicates)
    }

    fn evaluate(&self, doc: &Document, context: NodeId) -> Vec<NodeId> {
        let mut current = vec![if self.absolute { doc.root() } else { context }];
        for step in &self.steps {
            let mut next: Vec<NodeId> = Vec::new();
            for node in &current {
                let matched: Vec<NodeId> = match step.axis {
                    Axis::Child => step.select_children(doc, *node),
                    Axis::Descendant => {
                        // positions count among siblings, then results go back to document order
                        let mut selected = step.select_children(doc, *node);
                        for scope in doc.descendant_elements(*node) {
                            selected.extend(step.select_children(doc, scope));
                        }
                        doc.descendant_elements(*node)
                            .into_iter()
                            .filter(|id| selected.contains(id))
                            .collect()
                    }
                };
                for m in matched {
                    if !next.contains(&m) {
                        next.push(m);
                    }
                }
            }
            current = next;
        }
        current
    }
}

impl Step {
    /// Children of `parent` passing the name test and every predicate
    fn select_children(&self, doc: &Document, parent: NodeId) -> Vec<NodeId> {
        let mut matched: Vec<NodeId> = doc
            .child_elements(parent)
            .filter(|c| self.test.matches(doc, *c))
            .collect();
        for predicate in &self.predicates {
            matched = predicate.filter(doc, matched);
        }
        matched
    }
}

impl Document {
    /// All elements matching an absolute or relative expression
    pub fn select_matching_xpath(
        &self,
        expression: &str,
        context: NodeId,
    ) -> Result<Vec<NodeId>, XmlError> {
        let xpath = XPath::compile(expression)?;
        if xpath.attribute.is_some() {
            return Err(invalid(
                expression,
                "selects an attribute, use select_attribute".to_string(),
            ));
        }
        Ok(xpath.evaluate(self, context))
    }

    /// First element matching the expression, if any
    pub fn first_node_matching_xpath(
        &self,
        expression: &str,
        context: NodeId,
    ) -> Result<Option<NodeId>, XmlError> {
        Ok(self
            .select_matching_xpath(expression, context)?
            .into_iter()
            .next())
    }

    /// First attribute selected by an expression ending in `/@name`
    pub fn select_attribute(
        &self,
        expression: &str,
        context: NodeId,
    ) -> Result<Option<AttrRef>, XmlError> {
        let xpath = XPath::compile(expression)?;
        let name = xpath.attribute.clone().ok_or_else(|| {
            invalid(expression, "does not select an attribute".to_string())
        })?;
        let owners = if xpath.steps.is_empty() {
            vec![context]
        } else {
            xpath.evaluate(self, context)
        };
        Ok(owners
            .into_iter()
            .find(|owner| self.attribute(*owner, &name).is_some())
            .map(|element| AttrRef {
                element,
                name: name.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
  <profiles>
    <profile>
      <id>other</id>
    </profile>
    <profile>
      <id>functional-testing</id>
      <build>
        <plugins>
          <plugin><artifactId>first</artifactId></plugin>
          <plugin><artifactId>second</artifactId></plugin>
        </plugins>
      </build>
    </profile>
  </profiles>
</project>"#;

    #[test]
    fn test_descendant_position_counts_per_parent() {
        let doc = Document::parse("<r><a><x>1</x></a><b><x>2</x><x>3</x></b></r>").unwrap();
        let texts = |path: &str| -> Vec<String> {
            doc.select_matching_xpath(path, doc.root())
                .unwrap()
                .into_iter()
                .map(|id| doc.text_content(id))
                .collect()
        };
        assert_eq!(texts("//x[1]"), vec!["1", "2"]);
        assert_eq!(texts("//x[2]"), vec!["3"]);
        assert!(texts("//x[3]").is_empty());
        assert_eq!(texts("/r//x"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_absolute_path_with_predicates() {
        let doc = Document::parse(POM).unwrap();
        let plugin = doc
            .first_node_matching_xpath(
                "/pom:project/pom:profiles/pom:profile[pom:id=\"functional-testing\"]/pom:build/pom:plugins/pom:plugin[1]",
                doc.root(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(doc.text_content(plugin), "first");

        let second = doc
            .first_node_matching_xpath("//pom:plugin[2]", doc.root())
            .unwrap()
            .unwrap();
        assert_eq!(doc.text_content(second), "second");
    }

    #[test]
    fn test_relative_path() {
        let doc = Document::parse(POM).unwrap();
        let profiles = doc
            .first_node_matching_xpath("pom:profiles", doc.document_element())
            .unwrap()
            .unwrap();
        let ids = doc.select_matching_xpath("pom:profile/pom:id", profiles).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(doc.text_content(ids[0]), "other");
    }

    #[test]
    fn test_unprefixed_names_do_not_match_namespaced_elements() {
        let doc = Document::parse(POM).unwrap();
        assert!(doc
            .first_node_matching_xpath("/project", doc.root())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_attribute_selection() {
        let doc = Document::parse(
            r#"<Context><Loader virtualClasspath="a;b"/><Resources extraResourcePaths=""/></Context>"#,
        )
        .unwrap();
        let attr = doc
            .select_attribute("/Context/Loader/@virtualClasspath", doc.root())
            .unwrap()
            .unwrap();
        assert_eq!(attr.name, "virtualClasspath");
        assert_eq!(doc.attribute(attr.element, &attr.name), Some("a;b"));

        let property =
            Document::parse(r#"<beans><bean><property name="moduleId" value="x"/></bean></beans>"#)
                .unwrap();
        let found = property
            .first_node_matching_xpath("//property[@name='moduleId']", property.root())
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_invalid_expressions() {
        let doc = Document::parse(POM).unwrap();
        assert!(matches!(
            doc.select_matching_xpath("/pom:project/", doc.root()),
            Err(XmlError::InvalidXPath { .. })
        ));
        assert!(matches!(
            doc.select_matching_xpath("foo:bar", doc.root()),
            Err(XmlError::UnknownPrefix(_))
        ));
        assert!(matches!(
            doc.select_matching_xpath("pom:a[pom:b=\"x]", doc.root()),
            Err(XmlError::InvalidXPath { .. })
        ));
        assert!(matches!(
            doc.select_matching_xpath("/Context/@a", doc.root()),
            Err(XmlError::InvalidXPath { .. })
        ));
    }
}
