use std::{error::Error, fmt::Display};

/// Any kind of error reported while building, checking or mapping a type AST
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Unique error code reference
    pub error_code: String,

    /// Severity of the error
    pub level: Level,

    /// Which part of the error taxonomy this diagnostic belongs to
    pub kind: ErrorKind,

    /// Name of the diagnostic
    pub name: String,

    /// All labels with information about this diagnostic
    pub labels: Vec<Label>,
}

/// Reference to a location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Name of the file the label points into.  This is either an ASN.1
    /// grammar file (when the location came from the AST) or the XML AST
    /// document itself (when the XML structure was wrong).
    pub file: Option<String>,

    /// 1-based line within the file.
    pub line: Option<usize>,

    /// The message to display to the user.
    pub message: String,
}

/// Severity of a given diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// A fatal error
    Error,

    /// Should be fixed but generation can still continue.
    Warning,
}

/// The class of problem a diagnostic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// Missing XML structure, unsupported construct or reference to a
    /// non-existent name
    Malformed,

    /// A mandatory size or range constraint is missing
    Constraint,

    /// A reserved or disallowed name is used for a type or field
    Naming,

    /// Type resolution reached a fixed point with unresolved types
    Resolution,

    /// A bug in the engine or in a backend, not in the input grammar
    Internal,
}

/// A result containing a diagnostic, the default error type for the crate
pub type Result<T = ()> = std::result::Result<T, Diagnostic>;

impl Diagnostic {
    /// Create a new diagnostic
    fn new(level: Level, kind: ErrorKind, code: String) -> Self {
        Diagnostic {
            error_code: code,
            level,
            kind,
            name: String::new(),
            labels: vec![],
        }
    }

    /// Create an error diagnostic
    pub(crate) fn error(kind: ErrorKind, code: impl Into<String>) -> Self {
        Self::new(Level::Error, kind, code.into())
    }

    /// Create a warning diagnostic
    pub(crate) fn warning(kind: ErrorKind, code: impl Into<String>) -> Self {
        Self::new(Level::Warning, kind, code.into())
    }

    /// Create an internal error.  These are never caused by the input grammar
    /// so the user is asked to report them.
    pub(crate) fn internal(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self::error(ErrorKind::Internal, code)
            .name(name)
            .label("this is an internal error, please report it to the tool maintainers")
    }

    /// Set the descriptive name of an error
    pub(crate) fn name(self, value: impl Into<String>) -> Self {
        Self {
            name: value.into(),
            ..self
        }
    }

    /// Add a label to the diagnostic
    pub(crate) fn label(mut self, label: impl Into<Label>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Point every label that has no file yet at the given file
    pub(crate) fn in_file(mut self, file: &str) -> Self {
        for label in &mut self.labels {
            if label.file.is_none() {
                label.file = Some(file.to_string());
            }
        }
        self
    }

    /// Is this diagnostic fatal
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl Label {
    /// Create a new source label
    pub(crate) fn new() -> Label {
        Label {
            file: None,
            line: None,
            message: String::new(),
        }
    }

    /// Set the message for this label
    pub(crate) fn message(self, value: impl Into<String>) -> Self {
        Self {
            message: value.into(),
            ..self
        }
    }

    /// Set the source file for this label
    pub fn file(self, name: impl Into<String>) -> Self {
        Self {
            file: Some(name.into()),
            ..self
        }
    }

    /// Set the line within the source file for this label
    pub fn line(self, line: usize) -> Self {
        Self {
            line: Some(line),
            ..self
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:04}: {}", self.level, self.error_code, self.name)?;

        for label in &self.labels {
            if let Some(file) = &label.file {
                writeln!(f)?;

                write!(f, "\t{:?} [{file}", self.level)?;
                if let Some(line) = label.line {
                    write!(f, ":{line}")?;
                }
                write!(f, "]: {}", label.message)?;
            }
        }

        for label in &self.labels {
            if label.file.is_none() {
                writeln!(f)?;
                write!(f, "\t{:?}: {}", self.level, label.message)?;
            }
        }

        Ok(())
    }
}

impl Error for Diagnostic {}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::new().message(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::new().message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_puts_located_labels_first() {
        let diag = Diagnostic::error(ErrorKind::Constraint, "0201")
            .name("INTEGER must have a range constraint")
            .label("no file here")
            .label(
                Label::new()
                    .file("test.asn")
                    .line(4)
                    .message("declared here"),
            );

        let text = diag.to_string();
        assert_eq!(
            text,
            "Error 0201: INTEGER must have a range constraint\n\
             \tError [test.asn:4]: declared here\n\
             \tError: no file here"
        );
    }

    #[test]
    fn internal_errors_ask_for_a_report() {
        let diag = Diagnostic::internal("0900", "missing method");
        assert_eq!(diag.kind, ErrorKind::Internal);
        assert!(diag.is_error());
        assert!(diag.labels[0].message.contains("report"));
    }
}
