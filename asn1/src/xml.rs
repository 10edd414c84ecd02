//! Representation of the XML AST description emitted by the external ASN.1
//! compiler (NOT the ASN.1 grammar itself)

mod error;
mod reader;

use std::fmt::Display;

pub use self::error::{Result, XmlError};
pub use self::reader::XmlReader;

/// A single XML element with its attributes and child elements.  Text content
/// is not kept, the AST description carries all data in attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name of the element
    pub tag: String,

    /// Attributes in document order, with entities already decoded
    pub attributes: Vec<(String, String)>,

    /// Child elements in document order
    pub children: Vec<Element>,

    /// 1-based line of the element's start tag within the XML document
    pub line: usize,
}

impl Element {
    /// Parse a whole XML document and return its root element
    pub fn parse(source: &str) -> Result<Element> {
        XmlReader::new(source).read_document()
    }

    /// Get the value of an attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get the first child element with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Iterate over all child elements with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = ElementFormatter {
            node: self,
            prefix: String::new(),
            child_prefix: String::new(),
        };

        write!(f, "{fmt}")
    }
}

struct ElementFormatter<'a> {
    node: &'a Element,
    prefix: String,
    child_prefix: String,
}

impl Display for ElementFormatter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix, self.node.tag)?;
        for (key, value) in &self.node.attributes {
            write!(f, " {key}={value:?}")?;
        }
        writeln!(f)?;

        let Some((last, head)) = self.node.children.split_last() else {
            return Ok(());
        };

        for node in head {
            let fmt = ElementFormatter {
                node,
                prefix: self.child_prefix.clone() + "|-- ",
                child_prefix: self.child_prefix.clone() + "|   ",
            };

            write!(f, "{fmt}")?;
        }

        let fmt = ElementFormatter {
            node: last,
            prefix: self.child_prefix.clone() + "`-- ",
            child_prefix: self.child_prefix.clone() + "    ",
        };

        write!(f, "{fmt}")
    }
}
