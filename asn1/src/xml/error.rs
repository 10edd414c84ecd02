use crate::diagnostic::{Diagnostic, ErrorKind, Label};

/// Any error that can be emitted while reading an XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The document ended inside of some markup
    UnexpectedEof { line: usize },

    /// A character was found that cannot start or continue the expected item
    Expected {
        expected: &'static str,
        got: char,
        line: usize,
    },

    /// A closing tag did not match the most recently opened tag
    MismatchedTag {
        open: String,
        close: String,
        line: usize,
    },

    /// A closing tag was found with no element open
    UnexpectedEndTag { tag: String, line: usize },

    /// An entity reference that is neither predefined nor numeric
    UnknownEntity { entity: String, line: usize },

    /// The document does not contain a root element
    NoRootElement,

    /// Something other than whitespace, comments or processing instructions
    /// follows the root element
    TrailingContent { line: usize },
}

pub type Result<T, E = XmlError> = std::result::Result<T, E>;

impl XmlError {
    /// Line that the error was found on, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            XmlError::UnexpectedEof { line }
            | XmlError::Expected { line, .. }
            | XmlError::MismatchedTag { line, .. }
            | XmlError::UnexpectedEndTag { line, .. }
            | XmlError::UnknownEntity { line, .. }
            | XmlError::TrailingContent { line } => Some(*line),
            XmlError::NoRootElement => None,
        }
    }

    /// Human readable description of the error
    pub fn message(&self) -> String {
        match self {
            XmlError::UnexpectedEof { .. } => "unexpected end of document".to_string(),
            XmlError::Expected { expected, got, .. } => {
                format!("expected {expected}, found {got:?}")
            }
            XmlError::MismatchedTag { open, close, .. } => {
                format!("closing tag </{close}> does not match opening tag <{open}>")
            }
            XmlError::UnexpectedEndTag { tag, .. } => {
                format!("closing tag </{tag}> without a matching opening tag")
            }
            XmlError::UnknownEntity { entity, .. } => format!("unknown entity &{entity};"),
            XmlError::NoRootElement => "document has no root element".to_string(),
            XmlError::TrailingContent { .. } => "content after the root element".to_string(),
        }
    }
}

impl From<XmlError> for Diagnostic {
    fn from(value: XmlError) -> Self {
        let mut label = Label::new().message(value.message());
        if let Some(line) = value.line() {
            label = label.line(line);
        }

        Diagnostic::error(ErrorKind::Malformed, "0100")
            .name("unable to read the XML AST document")
            .label(label)
    }
}
