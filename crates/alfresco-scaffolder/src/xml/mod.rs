//! Namespace-aware XML document editing
//!
//! This module provides:
//! - A small arena DOM (`Document`) parsed with quick-xml
//! - A restricted XPath evaluator over the fixed namespace prefixes below
//! - Fetch-or-create / set-or-clear editing primitives
//! - The canonical pretty printer used for every file we write

mod dom;
mod print;
mod utils;
mod xpath;

pub use dom::{AttrRef, Document, NodeId};

/// Maven POM namespace
pub const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Generic namespace used by tests and ad hoc documents
pub const EXAMPLE_NAMESPACE: &str = "http://www.example.com/";

/// Prefixes understood by every namespaced lookup. There is no dynamic discovery.
const NAMESPACES: &[(&str, &str)] = &[
    ("ns", EXAMPLE_NAMESPACE),
    ("pom", POM_NAMESPACE),
    ("xsi", XSI_NAMESPACE),
];

/// Resolve one of the fixed prefixes to its namespace URI
pub fn lookup_namespace_uri(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

/// Errors raised while parsing, querying or editing XML
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("Malformed XML at byte {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("Unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    #[error("Invalid XPath expression '{expression}': {reason}")]
    InvalidXPath { expression: String, reason: String },

    #[error("All parameters to {0} are required")]
    MissingArgument(&'static str),

    #[error("Document has no node matching {0}")]
    MissingNode(String),
}
