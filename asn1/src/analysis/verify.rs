use std::collections::HashSet;

use crate::{
    ast::{BasicNode, Bounds, Node},
    diagnostic::{Diagnostic, ErrorKind, Result},
    symbols::{LeafCategory, SymbolTable, TypeId},
};

/// Check that every numeric, string and collection type reachable from a
/// named type carries the range or SIZE constraint code generation needs,
/// and that every enumerant has a value.  Stops at the first problem.
pub fn verify_ranges(table: &SymbolTable, id: TypeId) -> Result {
    Verifier {
        table,
        visited: HashSet::new(),
    }
    .named(id)
}

/// [`verify_ranges`] for a node that is not (necessarily) in the table
pub fn verify_node(table: &SymbolTable, node: &Node) -> Result {
    Verifier {
        table,
        visited: HashSet::new(),
    }
    .node(node)
}

struct Verifier<'a> {
    table: &'a SymbolTable,

    /// Named types already checked, references are followed once
    visited: HashSet<TypeId>,
}

impl Verifier<'_> {
    fn named(&mut self, id: TypeId) -> Result {
        if !self.visited.insert(id) {
            return Ok(());
        }

        let table = self.table;
        let node = table.names.node(id).ok_or_else(|| {
            Diagnostic::internal(
                "0902",
                format!("type {} has no definition", table.names.name(id)),
            )
        })?;

        self.node(node)
    }

    fn node(&mut self, node: &Node) -> Result {
        match node {
            Node::Basic(b) => self.basic(node, b),
            Node::Enumerated(e) => {
                for member in &e.members {
                    if member.value.is_none() {
                        return Err(Diagnostic::error(ErrorKind::Constraint, "0206")
                            .name(format!("enumerant '{}' has no value", member.name))
                            .label(
                                self.table
                                    .label(member.location)
                                    .message("give the value explicitly, e.g. red(0)"),
                            ));
                    }
                }
                Ok(())
            }
            Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => {
                for member in &c.members {
                    self.node(&member.node)?;
                }
                Ok(())
            }
            Node::SequenceOf(c) | Node::SetOf(c) => {
                if !matches!(c.size, Some(Bounds::Size { .. })) {
                    return Err(self.missing(
                        "0205",
                        node,
                        "add a SIZE constraint, e.g. SEQUENCE (SIZE(1..10)) OF",
                    ));
                }
                self.node(&c.element)
            }
            Node::MetaType(r) | Node::MetaMember(r) => self.named(r.target),
        }
    }

    fn basic(&self, node: &Node, b: &BasicNode) -> Result {
        match self.table.leaf_types.basic(b.kind) {
            Some(LeafCategory::Integer) => match b.range {
                Some(Bounds::Integer { .. }) => Ok(()),
                _ => Err(self.missing("0201", node, "add a range constraint, e.g. (0..255)")),
            },
            Some(LeafCategory::Real) => match b.range {
                Some(Bounds::Real { min, max }) if min.is_finite() && max.is_finite() => Ok(()),
                Some(Bounds::Integer { .. }) => Ok(()),
                Some(Bounds::Real { .. }) => Err(Diagnostic::error(ErrorKind::Constraint, "0203")
                    .name("REAL range exceeds the limits of a double")
                    .label(
                        self.table
                            .label(b.location)
                            .message("both bounds must be representable as a 64 bit float"),
                    )),
                _ => Err(self.missing("0202", node, "add a range constraint, e.g. (-1.0..1.0)")),
            },
            Some(LeafCategory::OctetString) => match b.range {
                Some(Bounds::Size { .. }) => Ok(()),
                _ => Err(self.missing("0204", node, "add a SIZE constraint, e.g. (SIZE(1..20))")),
            },
            Some(LeafCategory::Boolean) => Ok(()),
            other => Err(Diagnostic::internal(
                "0901",
                format!(
                    "basic type {:?} has leaf category {}",
                    b.kind,
                    other.map_or("<none>", |c| c.as_str())
                ),
            )),
        }
    }

    fn missing(&self, code: &str, node: &Node, hint: &str) -> Diagnostic {
        Diagnostic::error(ErrorKind::Constraint, code)
            .name(format!("{} is missing a mandatory constraint", node.describe()))
            .label(self.table.label(node.location()).message(hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BasicKind, Collection, Composite, Enumerant, Enumerated, Location, Member, Reference},
        symbols::SourceId,
    };

    fn table() -> (SymbolTable, SourceId) {
        let mut table = SymbolTable::new();
        let file = table.add_file("ranges.asn");
        (table, file)
    }

    fn basic(file: SourceId, kind: BasicKind, range: Option<Bounds>) -> Node {
        Node::Basic(BasicNode {
            kind,
            range,
            location: Location { file, line: 4 },
        })
    }

    #[test]
    fn integers_need_ranges() {
        let (table, file) = table();
        let err = verify_node(&table, &basic(file, BasicKind::Integer, None)).unwrap_err();
        assert_eq!(err.error_code, "0201");
        assert_eq!(err.kind, ErrorKind::Constraint);
        assert_eq!(err.labels[0].file.as_deref(), Some("ranges.asn"));
        assert_eq!(err.labels[0].line, Some(4));

        let range = Bounds::Integer { min: 0, max: 100 };
        let ok = basic(file, BasicKind::Integer, Some(range));
        verify_node(&table, &ok).unwrap();
    }

    #[test]
    fn reals_must_be_finite() {
        let (table, file) = table();
        let inf = basic(
            file,
            BasicKind::Real,
            Some(Bounds::Real {
                min: f64::NEG_INFINITY,
                max: 1.0,
            }),
        );
        assert_eq!(verify_node(&table, &inf).unwrap_err().error_code, "0203");
        assert_eq!(
            verify_node(&table, &basic(file, BasicKind::Real, None))
                .unwrap_err()
                .error_code,
            "0202"
        );
    }

    #[test]
    fn strings_and_collections_need_sizes() {
        let (table, file) = table();
        let text = basic(file, BasicKind::AsciiString, None);
        assert_eq!(verify_node(&table, &text).unwrap_err().error_code, "0204");

        let list = Node::SetOf(Collection {
            element: Box::new(basic(file, BasicKind::Boolean, None)),
            size: None,
            location: Location { file, line: 8 },
        });
        let err = verify_node(&table, &list).unwrap_err();
        assert_eq!(err.error_code, "0205");
        assert_eq!(err.labels[0].line, Some(8));
    }

    #[test]
    fn enumerants_need_values() {
        let (table, file) = table();
        let location = Location { file, line: 1 };
        let colors = Node::Enumerated(Enumerated {
            members: vec![
                Enumerant {
                    name: "red".to_string(),
                    value: Some(0),
                    id: None,
                    location,
                },
                Enumerant {
                    name: "green".to_string(),
                    value: None,
                    id: None,
                    location,
                },
            ],
            location,
        });
        let err = verify_node(&table, &colors).unwrap_err();
        assert_eq!(err.error_code, "0206");
        assert!(err.name.contains("green"));
    }

    #[test]
    fn references_are_followed() {
        let (mut table, file) = table();
        let inner = table.names.intern("Inner");
        table
            .names
            .define(inner, basic(file, BasicKind::OctetString, None), file);

        let outer = table.names.intern("Outer");
        let node = Node::Sequence(Composite {
            members: vec![Member {
                name: "data".to_string(),
                node: Node::MetaMember(Reference {
                    target: inner,
                    bounds: None,
                    location: Location { file, line: 2 },
                }),
                optional: true,
                discriminant: None,
                location: Location { file, line: 2 },
            }],
            location: Location { file, line: 1 },
        });
        table.names.define(outer, node, file);

        assert_eq!(verify_ranges(&table, outer).unwrap_err().error_code, "0204");

        let missing = table.names.intern("Missing");
        let err = verify_ranges(&table, missing).unwrap_err();
        assert_eq!(err.error_code, "0902");
    }
}
