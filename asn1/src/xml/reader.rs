use std::{iter::Peekable, str::CharIndices};

use super::{Element, Result, XmlError};

/// A single markup event produced while reading a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An opening tag, `empty` is set for self-closing tags `<a/>`
    Start {
        tag: String,
        attributes: Vec<(String, String)>,
        empty: bool,
        line: usize,
    },

    /// A closing tag `</a>`
    End { tag: String, line: usize },
}

/// State for converting an XML document into a stream of tag events
#[derive(Debug, Clone)]
pub struct XmlReader<'a> {
    /// Iterator over all chars in the document
    chars: Peekable<CharIndices<'a>>,

    /// The original source text
    source: &'a str,

    /// Current 1-based line number
    line: usize,
}

impl<'a> XmlReader<'a> {
    /// Create a new reader for a given document
    pub fn new(source: &'a str) -> Self {
        // skip byte order mark
        let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);

        Self {
            chars: source.char_indices().peekable(),
            source,
            line: 1,
        }
    }

    /// Return the next start or end tag in the document.  Text, comments,
    /// CDATA sections, processing instructions and doctype declarations are
    /// skipped.  Returns `None` at the end of the document.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            while let Some(&(_, c)) = self.chars.peek() {
                if c == '<' {
                    break;
                }
                self.bump();
            }

            if self.chars.peek().is_none() {
                return Ok(None);
            }

            if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<![CDATA[") {
                self.skip_past("]]>")?;
            } else if self.starts_with("<!") {
                self.skip_past(">")?;
            } else if self.starts_with("</") {
                return self.end_tag().map(Some);
            } else {
                return self.start_tag().map(Some);
            }
        }
    }

    /// Read a whole document into a tree of elements, checking that all tags
    /// are balanced.
    pub fn read_document(mut self) -> Result<Element> {
        let mut stack: Vec<Element> = vec![];
        let mut root = None;

        while let Some(event) = self.next_event()? {
            match event {
                Event::Start {
                    tag,
                    attributes,
                    empty,
                    line,
                } => {
                    if root.is_some() {
                        return Err(XmlError::TrailingContent { line });
                    }

                    let element = Element {
                        tag,
                        attributes,
                        children: vec![],
                        line,
                    };

                    if empty {
                        close(&mut stack, &mut root, element);
                    } else {
                        stack.push(element);
                    }
                }
                Event::End { tag, line } => {
                    let Some(element) = stack.pop() else {
                        return Err(XmlError::UnexpectedEndTag { tag, line });
                    };

                    if element.tag != tag {
                        return Err(XmlError::MismatchedTag {
                            open: element.tag,
                            close: tag,
                            line,
                        });
                    }

                    close(&mut stack, &mut root, element);
                }
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::UnexpectedEof { line: self.line });
        }

        root.ok_or(XmlError::NoRootElement)
    }

    /// Parse `<name attr="value" ...>` or `<name .../>`
    fn start_tag(&mut self) -> Result<Event> {
        let line = self.line;
        self.expect('<', "'<'")?;
        let tag = self.name("an element name")?;

        let mut attributes = vec![];
        let empty = loop {
            self.skip_whitespace();

            match self.peek_char()? {
                '/' => {
                    self.bump();
                    self.expect('>', "'>' after '/'")?;
                    break true;
                }
                '>' => {
                    self.bump();
                    break false;
                }
                _ => attributes.push(self.attribute()?),
            }
        };

        Ok(Event::Start {
            tag,
            attributes,
            empty,
            line,
        })
    }

    /// Parse `</name>`
    fn end_tag(&mut self) -> Result<Event> {
        let line = self.line;
        self.expect('<', "'<'")?;
        self.expect('/', "'/'")?;
        let tag = self.name("an element name")?;
        self.skip_whitespace();
        self.expect('>', "'>'")?;

        Ok(Event::End { tag, line })
    }

    /// Parse `name = "value"`, with either quote character
    fn attribute(&mut self) -> Result<(String, String)> {
        let name = self.name("an attribute name")?;
        self.skip_whitespace();
        self.expect('=', "'=' after attribute name")?;
        self.skip_whitespace();

        let quote = self.peek_char()?;
        if quote != '"' && quote != '\'' {
            return Err(XmlError::Expected {
                expected: "a quoted attribute value",
                got: quote,
                line: self.line,
            });
        }
        self.bump();

        let mut value = String::new();
        loop {
            let c = self.peek_char()?;
            if c == quote {
                self.bump();
                break;
            }

            if c == '&' {
                value.push(self.entity()?);
            } else {
                self.bump();
                value.push(c);
            }
        }

        Ok((name, value))
    }

    /// Decode `&name;` or `&#123;` / `&#x7B;`
    fn entity(&mut self) -> Result<char> {
        let line = self.line;
        self.expect('&', "'&'")?;

        let mut entity = String::new();
        loop {
            let c = self.peek_char()?;
            self.bump();
            if c == ';' {
                break;
            }
            entity.push(c);
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
            }
        };

        decoded.ok_or(XmlError::UnknownEntity { entity, line })
    }

    /// Parse an XML name
    fn name(&mut self, expected: &'static str) -> Result<String> {
        let first = self.peek_char()?;
        if !(first.is_alphabetic() || first == '_' || first == ':') {
            return Err(XmlError::Expected {
                expected,
                got: first,
                line: self.line,
            });
        }

        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !(c.is_alphanumeric() || "_-.:".contains(c)) {
                break;
            }
            name.push(c);
            self.bump();
        }

        Ok(name)
    }

    /// Consume characters until just after the given terminator
    fn skip_past(&mut self, terminator: &str) -> Result<()> {
        let line = self.line;
        loop {
            if self.starts_with(terminator) {
                for _ in terminator.chars() {
                    self.bump();
                }
                return Ok(());
            }

            if self.bump().is_none() {
                return Err(XmlError::UnexpectedEof { line });
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    /// Consume a specific character or return an error
    fn expect(&mut self, c: char, expected: &'static str) -> Result<()> {
        let got = self.peek_char()?;
        if got != c {
            return Err(XmlError::Expected {
                expected,
                got,
                line: self.line,
            });
        }
        self.bump();
        Ok(())
    }

    /// Peek the next character, which must exist
    fn peek_char(&mut self) -> Result<char> {
        self.chars
            .peek()
            .map(|&(_, c)| c)
            .ok_or(XmlError::UnexpectedEof { line: self.line })
    }

    /// Consume one character, keeping track of the line number
    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Does the remaining source start with the given string
    fn starts_with(&mut self, value: &str) -> bool {
        let offset = self
            .chars
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len());
        self.source[offset..].starts_with(value)
    }
}

/// Attach a finished element to its parent, or make it the root
fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else {
        *root = Some(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_skip_markup() {
        let source = "<?xml version=\"1.0\"?>\n<!-- hi -->\n<!DOCTYPE a>\n<a k='v &amp; &#65;'>text<![CDATA[<x>]]></a>";
        let mut reader = XmlReader::new(source);

        assert_eq!(
            reader.next_event(),
            Ok(Some(Event::Start {
                tag: "a".to_string(),
                attributes: vec![("k".to_string(), "v & A".to_string())],
                empty: false,
                line: 4,
            }))
        );
        assert_eq!(
            reader.next_event(),
            Ok(Some(Event::End {
                tag: "a".to_string(),
                line: 4
            }))
        );
        assert_eq!(reader.next_event(), Ok(None));
    }

    #[test]
    fn nested_lines() {
        let root = Element::parse("<a>\n  <b>\n    <c/>\n  </b>\n</a>\n").unwrap();
        assert_eq!(root.line, 1);
        assert_eq!(root.children[0].line, 2);
        assert_eq!(root.children[0].children[0].line, 3);
    }

    #[test]
    fn mismatched_tags() {
        let err = Element::parse("<a>\n<b></a>").unwrap_err();
        assert_eq!(
            err,
            XmlError::MismatchedTag {
                open: "b".to_string(),
                close: "a".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn unterminated_document() {
        assert_eq!(
            Element::parse("<a><b/>"),
            Err(XmlError::UnexpectedEof { line: 1 })
        );
        assert_eq!(
            Element::parse("<a x=\"1"),
            Err(XmlError::UnexpectedEof { line: 1 })
        );
        assert_eq!(Element::parse("  "), Err(XmlError::NoRootElement));
    }

    #[test]
    fn bad_entities_and_trailing_elements() {
        assert!(matches!(
            Element::parse("<a x=\"&nope;\"/>"),
            Err(XmlError::UnknownEntity { .. })
        ));
        assert_eq!(
            Element::parse("<a/>\n<b/>"),
            Err(XmlError::TrailingContent { line: 2 })
        );
        assert_eq!(
            Element::parse("</a>"),
            Err(XmlError::UnexpectedEndTag {
                tag: "a".to_string(),
                line: 1
            })
        );
    }
}
