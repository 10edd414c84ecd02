use std::str::FromStr;

use crate::{
    ast::{
        BasicKind, BasicNode, Bounds, Collection, Composite, Enumerant, Enumerated, Location,
        Member, Node, Reference,
    },
    diagnostic::{Diagnostic, ErrorKind, Label, Result},
    mapper::clean_name,
    symbols::{ImportedModule, Module, SourceId, SymbolTable},
    xml::Element,
};

/// Reads the XML AST description of parsed grammar files into a symbol table.
/// Aliases are kept as [`Node::MetaType`] and anonymous inner types are kept
/// inline, the analysis passes deal with both.
pub(crate) struct AstBuilder<'a> {
    table: &'a mut SymbolTable,

    /// Name of the XML document, for errors in the document structure
    document: &'a str,
}

impl<'a> AstBuilder<'a> {
    pub(crate) fn new(table: &'a mut SymbolTable, document: &'a str) -> Self {
        Self { table, document }
    }

    /// Load every grammar file described by an `ASN1AST` root element
    pub(crate) fn load(&mut self, root: &Element) -> Result {
        if root.tag != "ASN1AST" {
            return Err(self
                .structure_error("0101", root, "the root element must be <ASN1AST>")
                .name(format!("unexpected root element <{}>", root.tag)));
        }

        for file in root.children_named("Asn1File") {
            self.file(file)?;
        }

        Ok(())
    }

    fn file(&mut self, elem: &Element) -> Result {
        let name = self.attr(elem, "FileName")?;
        let file = self.table.add_file(name);
        log::trace!("reading grammar file {name}");

        for module in elem.children_named("Asn1Module") {
            self.module(module, file)?;
        }

        Ok(())
    }

    fn module(&mut self, elem: &Element, file: SourceId) -> Result {
        let mut module = Module {
            name: self.attr(elem, "ID")?.to_string(),
            ..Default::default()
        };

        if let Some(exports) = elem.child("ExportedTypes") {
            for export in exports.children_named("ExportedType") {
                module
                    .exported_types
                    .push(self.attr(export, "Name")?.to_string());
            }
        }

        if let Some(imports) = elem.child("ImportedModules") {
            for import in imports.children_named("ImportedModule") {
                let mut imported = ImportedModule {
                    name: self.attr(import, "ID")?.to_string(),
                    types: vec![],
                };
                if let Some(types) = import.child("ImportedTypes") {
                    for ty in types.children_named("ImportedType") {
                        imported.types.push(self.attr(ty, "Name")?.to_string());
                    }
                }
                module.imported.push(imported);
            }
        }

        let assignments = self.child(elem, &["TypeAssignments"])?;
        for assignment in assignments.children_named("TypeAssignment") {
            self.type_assignment(assignment, file)?;
        }

        self.table.file_mut(file).modules.push(module);

        Ok(())
    }

    /// `Name ::= Type`
    fn type_assignment(&mut self, elem: &Element, file: SourceId) -> Result {
        let name = self.attr(elem, "Name")?;
        let line = self.line(elem, 0)?;
        let ty = self.child(elem, &["Type"])?;
        let node = self.ty(ty, file, line, true)?;
        let location = node.location();

        let id = self.table.names.intern(name);
        let previous = self
            .table
            .names
            .entry(id)
            .filter(|entry| entry.node.is_some())
            .and_then(|entry| entry.file);

        if let Some(previous) = previous {
            self.table.file_mut(previous).types.retain(|&t| t != id);
            let warning = Diagnostic::warning(ErrorKind::Naming, "0501")
                .name(format!("type {name} is defined more than once"))
                .label(
                    self.table
                        .label(location)
                        .message("this definition replaces the earlier one"),
                );
            log::debug!("{warning}");
            self.table.warnings.push(warning);
        }

        self.table.names.define(id, node, file);
        self.table.file_mut(file).types.push(id);

        Ok(())
    }

    /// Interpret a `Type` element.  References become [`Node::MetaType`] at
    /// the top level of an assignment and [`Node::MetaMember`] anywhere else.
    fn ty(&mut self, elem: &Element, file: SourceId, line: usize, top_level: bool) -> Result<Node> {
        let line = self.line(elem, line)?;
        let location = Location { file, line };

        let Some(inner) = elem.children.first() else {
            return Err(self
                .structure_error("0101", elem, "expected a type constructor element")
                .name("<Type> element is empty"));
        };

        let basic = |kind: BasicKind, range: Option<Bounds>| {
            Node::Basic(BasicNode {
                kind,
                range,
                location,
            })
        };

        let node = match inner.tag.as_str() {
            "BooleanType" => basic(BasicKind::Boolean, None),
            "IntegerType" => {
                let range = self.bounds::<i128>(inner)?;
                basic(
                    BasicKind::Integer,
                    range.map(|(min, max)| Bounds::Integer { min, max }),
                )
            }
            "RealType" => {
                let range = self.bounds::<f64>(inner)?;
                basic(
                    BasicKind::Real,
                    range.map(|(min, max)| Bounds::Real { min, max }),
                )
            }
            "OctetStringType" => basic(BasicKind::OctetString, self.size(inner)?),
            "IA5StringType" | "NumericStringType" => {
                basic(BasicKind::AsciiString, self.size(inner)?)
            }
            "EnumeratedType" => Node::Enumerated(self.enumerated(inner, location)?),
            "SequenceType" => {
                Node::Sequence(self.composite(inner, "SequenceOrSetChild", false, location)?)
            }
            "SetType" => Node::Set(self.composite(inner, "SequenceOrSetChild", false, location)?),
            "ChoiceType" => Node::Choice(self.composite(inner, "ChoiceChild", true, location)?),
            "SequenceOfType" => Node::SequenceOf(self.collection(inner, location)?),
            "SetOfType" => Node::SetOf(self.collection(inner, location)?),
            "ReferenceType" => {
                let reference = self.reference(inner, location)?;
                if top_level {
                    Node::MetaType(reference)
                } else {
                    Node::MetaMember(reference)
                }
            }
            "BitStringType" => {
                return Err(Diagnostic::error(ErrorKind::Malformed, "0105")
                    .name("BIT STRINGs are not supported")
                    .label(
                        self.table
                            .label(location)
                            .message("use SEQUENCE (SIZE(..)) OF BOOLEAN instead"),
                    ))
            }
            other => {
                return Err(Diagnostic::error(ErrorKind::Malformed, "0104")
                    .name(format!("unsupported ASN.1 construct <{other}>"))
                    .label(self.table.label(location).message("used here")))
            }
        };

        Ok(node)
    }

    /// Members of a SEQUENCE, SET or CHOICE
    fn composite(
        &mut self,
        elem: &Element,
        child_tag: &str,
        choice: bool,
        location: Location,
    ) -> Result<Composite> {
        let mut members = vec![];

        for child in elem.children_named(child_tag) {
            let name = self.attr(child, "VarName")?.to_string();
            let line = self.line(child, location.line)?;
            let ty = self.child(child, &["Type"])?;
            let node = self.ty(ty, location.file, line, false)?;

            let optional = child
                .attr("Optional")
                .is_some_and(|o| o.eq_ignore_ascii_case("true"));
            let discriminant = choice.then(|| {
                child
                    .attr("EnumID")
                    .map_or_else(|| format!("{}_PRESENT", clean_name(&name)), str::to_string)
            });

            members.push(Member {
                name,
                node,
                optional,
                discriminant,
                location: Location {
                    file: location.file,
                    line,
                },
            });
        }

        Ok(Composite { members, location })
    }

    fn enumerated(&mut self, elem: &Element, location: Location) -> Result<Enumerated> {
        let values = self.child(elem, &["EnumValues"])?;

        let mut members = vec![];
        for value in values.children_named("EnumValue") {
            let name = self.attr(value, "StringValue")?.to_string();
            let int_value = match value.attr("IntValue") {
                Some(text) => Some(self.number::<i64>(value, "IntValue", text)?),
                None => None,
            };

            members.push(Enumerant {
                name,
                value: int_value,
                id: value.attr("EnumID").map(str::to_string),
                location: Location {
                    file: location.file,
                    line: self.line(value, location.line)?,
                },
            });
        }

        Ok(Enumerated { members, location })
    }

    fn collection(&mut self, elem: &Element, location: Location) -> Result<Collection> {
        let size = self.size(elem)?;
        let ty = self.child(elem, &["Type"])?;
        let element = self.ty(ty, location.file, location.line, false)?;

        Ok(Collection {
            element: Box::new(element),
            size,
            location,
        })
    }

    fn reference(&mut self, elem: &Element, location: Location) -> Result<Reference> {
        let name = self.attr(elem, "ReferencedTypeName")?;
        let target = self.table.names.intern(name);

        // the referenced type is not known yet, so keep integer bounds exact
        // when possible and fall back to reals otherwise
        let bounds = match self.bounds::<i128>(elem) {
            Ok(Some((min, max))) => Some(Bounds::Integer { min, max }),
            _ => self
                .bounds::<f64>(elem)?
                .map(|(min, max)| Bounds::Real { min, max }),
        };

        Ok(Reference {
            target,
            bounds,
            location,
        })
    }

    /// SIZE constraint from `Min`/`Max` attributes
    fn size(&self, elem: &Element) -> Result<Option<Bounds>> {
        Ok(self
            .bounds::<u64>(elem)?
            .map(|(min, max)| Bounds::Size { min, max }))
    }

    /// Read the `Min` and `Max` attributes.  Missing attributes and the
    /// `MIN`/`MAX` keywords mean the range is not fully constrained.
    fn bounds<T: FromStr>(&self, elem: &Element) -> Result<Option<(T, T)>> {
        let (Some(min), Some(max)) = (elem.attr("Min"), elem.attr("Max")) else {
            return Ok(None);
        };

        if min == "MIN" || max == "MAX" {
            return Ok(None);
        }

        Ok(Some((
            self.number(elem, "Min", min)?,
            self.number(elem, "Max", max)?,
        )))
    }

    fn number<T: FromStr>(&self, elem: &Element, attr: &str, value: &str) -> Result<T> {
        value.trim().parse().map_err(|_| {
            self.structure_error(
                "0103",
                elem,
                format!("attribute {attr} of <{}> is {value:?}", elem.tag),
            )
            .name(format!("{value:?} is not a valid number"))
        })
    }

    /// Line number from a `Line` attribute, or the default if there is none
    fn line(&self, elem: &Element, default: usize) -> Result<usize> {
        match elem.attr("Line") {
            Some(line) => self.number(elem, "Line", line),
            None => Ok(default),
        }
    }

    /// Get a required attribute
    fn attr<'e>(&self, elem: &'e Element, name: &str) -> Result<&'e str> {
        elem.attr(name).ok_or_else(|| {
            self.structure_error("0102", elem, format!("add the {name} attribute"))
                .name(format!("<{}> is missing the {name} attribute", elem.tag))
        })
    }

    /// Get the first child element with one of the given tags
    fn child<'e>(&self, elem: &'e Element, tags: &[&str]) -> Result<&'e Element> {
        elem.children
            .iter()
            .find(|c| tags.iter().any(|&tag| tag == c.tag))
            .ok_or_else(|| {
                self.structure_error(
                    "0101",
                    elem,
                    format!("expected one of <{}> inside", tags.join(">, <")),
                )
                .name(format!("<{}> is missing a child element", elem.tag))
            })
    }

    /// An error in the structure of the XML document itself
    fn structure_error(
        &self,
        code: &'static str,
        elem: &Element,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic::error(ErrorKind::Malformed, code).label(
            Label::new()
                .file(self.document)
                .line(elem.line)
                .message(message),
        )
    }
}
