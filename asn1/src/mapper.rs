//! The recursive dispatch contract shared by every backend.
//!
//! A backend implements [`RecursiveMapper`] by providing one `map_*` method
//! per ASN.1 constructor.  [`RecursiveMapper::map`] resolves names and member
//! references and then calls exactly one of those methods.  Methods a backend
//! does not provide fail with an internal error naming the method, so an
//! incomplete backend stops at the first construct it cannot handle.

use crate::{
    ast::{BasicNode, Collection, Composite, Enumerated, Node},
    diagnostic::{Diagnostic, Result},
    symbols::{LeafCategory, LeafTypes, Names, TypeId},
};

/// What to map: a node, or a named type to look up first
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    Node(&'a Node),
    Id(TypeId),
    Name(&'a str),
}

impl<'a> From<&'a Node> for Target<'a> {
    fn from(value: &'a Node) -> Self {
        Target::Node(value)
    }
}

impl From<TypeId> for Target<'_> {
    fn from(value: TypeId) -> Self {
        Target::Id(value)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(value: &'a str) -> Self {
        Target::Name(value)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(value: &'a String) -> Self {
        Target::Name(value)
    }
}

/// Generate the error for a capability method a backend did not provide
fn unimplemented(method: &str) -> Diagnostic {
    Diagnostic::internal(
        "0900",
        format!("RecursiveMapper: unimplemented method '{method}'"),
    )
}

/// A backend that emits something for each ASN.1 constructor.  `src` and
/// `dest` are backend defined expressions, usually the variable being read
/// and the one being written.
pub trait RecursiveMapper {
    /// What the backend emits, usually one line of generated code
    type Line;

    /// Dispatch to the capability method matching the target's constructor
    fn map<'a>(
        &mut self,
        src: &str,
        dest: &str,
        target: Target<'a>,
        leaf_types: &LeafTypes,
        names: &'a Names,
    ) -> Result<Vec<Self::Line>> {
        let node = match target {
            Target::Node(node) => node,
            Target::Id(id) => names.node(id).ok_or_else(|| {
                Diagnostic::internal(
                    "0902",
                    format!("type {} has no definition", names.name(id)),
                )
            })?,
            Target::Name(name) => names.resolve(name).ok_or_else(|| {
                Diagnostic::internal("0902", format!("type {name} has no definition"))
            })?,
        };

        match node {
            Node::MetaMember(r) => self.map(src, dest, Target::Id(r.target), leaf_types, names),
            Node::Basic(b) => match leaf_types.basic(b.kind) {
                Some(LeafCategory::Integer) => self.map_integer(src, dest, b, leaf_types, names),
                Some(LeafCategory::Real) => self.map_real(src, dest, b, leaf_types, names),
                Some(LeafCategory::Boolean) => self.map_boolean(src, dest, b, leaf_types, names),
                Some(LeafCategory::OctetString) => {
                    self.map_octet_string(src, dest, b, leaf_types, names)
                }
                other => Err(Diagnostic::internal(
                    "0901",
                    format!(
                        "basic type {:?} has leaf category {} which can't be mapped",
                        b.kind,
                        other.map_or("<none>", |c| c.as_str())
                    ),
                )),
            },
            Node::Enumerated(e) => self.map_enumerated(src, dest, e, leaf_types, names),
            Node::Sequence(c) => self.map_sequence(src, dest, c, leaf_types, names),
            Node::Set(c) => self.map_set(src, dest, c, leaf_types, names),
            Node::Choice(c) => self.map_choice(src, dest, c, leaf_types, names),
            Node::SequenceOf(c) => self.map_sequence_of(src, dest, c, leaf_types, names),
            Node::SetOf(c) => self.map_set_of(src, dest, c, leaf_types, names),
            Node::MetaType(r) => Err(Diagnostic::internal(
                "0901",
                format!(
                    "unresolved alias of {} reached the mapper",
                    names.name(r.target)
                ),
            )),
        }
    }

    fn map_integer(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &BasicNode,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapInteger"))
    }

    fn map_real(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &BasicNode,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapReal"))
    }

    fn map_boolean(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &BasicNode,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapBoolean"))
    }

    /// Also receives the ASCII string types, check [`BasicNode::kind`] to
    /// tell them apart.
    fn map_octet_string(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &BasicNode,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapOctetString"))
    }

    fn map_enumerated(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Enumerated,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapEnumerated"))
    }

    fn map_sequence(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Composite,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapSequence"))
    }

    fn map_set(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Composite,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapSet"))
    }

    fn map_choice(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Composite,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapChoice"))
    }

    fn map_sequence_of(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Collection,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapSequenceOf"))
    }

    fn map_set_of(
        &mut self,
        _src: &str,
        _dest: &str,
        _node: &Collection,
        _leaf_types: &LeafTypes,
        _names: &Names,
    ) -> Result<Vec<Self::Line>> {
        Err(unimplemented("MapSetOf"))
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Prefix for the `child_no`th (1-based) branch of an if/else-if chain
pub fn maybe_else(child_no: usize) -> &'static str {
    if child_no == 1 {
        ""
    } else {
        "else "
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BasicKind, Bounds, Location, Member, Reference},
        symbols::{SourceId, SymbolTable},
    };

    fn loc() -> Location {
        Location {
            file: SourceId::new(0),
            line: 1,
        }
    }

    fn basic(kind: BasicKind, range: Option<Bounds>) -> Node {
        Node::Basic(BasicNode {
            kind,
            range,
            location: loc(),
        })
    }

    /// Records which capability was invoked
    struct Sentinel;

    impl RecursiveMapper for Sentinel {
        type Line = &'static str;

        fn map_integer(
            &mut self,
            _: &str,
            _: &str,
            _: &BasicNode,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["integer"])
        }

        fn map_real(
            &mut self,
            _: &str,
            _: &str,
            _: &BasicNode,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["real"])
        }

        fn map_boolean(
            &mut self,
            _: &str,
            _: &str,
            _: &BasicNode,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["boolean"])
        }

        fn map_octet_string(
            &mut self,
            _: &str,
            _: &str,
            _: &BasicNode,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["octet string"])
        }

        fn map_enumerated(
            &mut self,
            _: &str,
            _: &str,
            _: &Enumerated,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["enumerated"])
        }

        fn map_sequence(
            &mut self,
            _: &str,
            _: &str,
            _: &Composite,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["sequence"])
        }

        fn map_set(
            &mut self,
            _: &str,
            _: &str,
            _: &Composite,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["set"])
        }

        fn map_choice(
            &mut self,
            _: &str,
            _: &str,
            _: &Composite,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["choice"])
        }

        fn map_sequence_of(
            &mut self,
            _: &str,
            _: &str,
            _: &Collection,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["sequence of"])
        }

        fn map_set_of(
            &mut self,
            _: &str,
            _: &str,
            _: &Collection,
            _: &LeafTypes,
            _: &Names,
        ) -> Result<Vec<&'static str>> {
            Ok(vec!["set of"])
        }
    }

    /// A backend that implements nothing
    struct Empty;

    impl RecursiveMapper for Empty {
        type Line = String;
    }

    #[test]
    fn each_variant_hits_one_capability() {
        let table = SymbolTable::new();
        let composite = || Composite {
            members: vec![],
            location: loc(),
        };
        let collection = || Collection {
            element: Box::new(basic(BasicKind::Boolean, None)),
            size: Some(Bounds::Size { min: 1, max: 2 }),
            location: loc(),
        };

        let cases = [
            (basic(BasicKind::Integer, None), "integer"),
            (basic(BasicKind::Real, None), "real"),
            (basic(BasicKind::Boolean, None), "boolean"),
            (basic(BasicKind::OctetString, None), "octet string"),
            (basic(BasicKind::AsciiString, None), "octet string"),
            (
                Node::Enumerated(Enumerated {
                    members: vec![],
                    location: loc(),
                }),
                "enumerated",
            ),
            (Node::Sequence(composite()), "sequence"),
            (Node::Set(composite()), "set"),
            (Node::Choice(composite()), "choice"),
            (Node::SequenceOf(collection()), "sequence of"),
            (Node::SetOf(collection()), "set of"),
        ];

        for (node, expected) in &cases {
            let lines = Sentinel
                .map("s", "d", node.into(), &table.leaf_types, &table.names)
                .unwrap();
            assert_eq!(lines, [*expected], "{node:?}");
        }
    }

    #[test]
    fn meta_members_are_transparent() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let x = table.names.intern("X");
        let range = Bounds::Integer { min: 0, max: 10 };
        table
            .names
            .define(x, basic(BasicKind::Integer, Some(range)), file);

        let member = Node::MetaMember(Reference {
            target: x,
            bounds: None,
            location: loc(),
        });

        let direct = Sentinel
            .map("s", "d", "X".into(), &table.leaf_types, &table.names)
            .unwrap();
        let indirect = Sentinel
            .map("s", "d", (&member).into(), &table.leaf_types, &table.names)
            .unwrap();
        let by_id = Sentinel
            .map("s", "d", x.into(), &table.leaf_types, &table.names)
            .unwrap();

        assert_eq!(direct, indirect);
        assert_eq!(direct, by_id);
        assert_eq!(direct, ["integer"]);
    }

    #[test]
    fn missing_capabilities_fail_loudly() {
        let table = SymbolTable::new();
        let seq = Node::Sequence(Composite {
            members: vec![Member {
                name: "a".to_string(),
                node: basic(BasicKind::Boolean, None),
                optional: false,
                discriminant: None,
                location: loc(),
            }],
            location: loc(),
        });

        let err = Empty
            .map("s", "d", (&seq).into(), &table.leaf_types, &table.names)
            .unwrap_err();
        assert!(err.name.contains("'MapSequence'"));
        assert_eq!(err.kind, crate::ErrorKind::Internal);

        let err = Empty
            .map(
                "s",
                "d",
                (&basic(BasicKind::Real, None)).into(),
                &table.leaf_types,
                &table.names,
            )
            .unwrap_err();
        assert!(err.name.contains("'MapReal'"));
    }

    #[test]
    fn corrupt_input_is_an_internal_error() {
        let mut table = SymbolTable::new();
        let missing = table.names.intern("Missing");

        let err = Sentinel
            .map("s", "d", "Nope".into(), &table.leaf_types, &table.names)
            .unwrap_err();
        assert_eq!(err.error_code, "0902");

        let err = Sentinel
            .map("s", "d", missing.into(), &table.leaf_types, &table.names)
            .unwrap_err();
        assert_eq!(err.error_code, "0902");

        let alias = Node::MetaType(Reference {
            target: missing,
            bounds: None,
            location: loc(),
        });
        let err = Sentinel
            .map("s", "d", (&alias).into(), &table.leaf_types, &table.names)
            .unwrap_err();
        assert_eq!(err.error_code, "0901");

        let int = basic(BasicKind::Integer, None);
        let err = Sentinel
            .map("s", "d", (&int).into(), &LeafTypes::empty(), &table.names)
            .unwrap_err();
        assert_eq!(err.error_code, "0901");
    }

    #[test]
    fn clean_names() {
        assert_eq!(clean_name("my-type.v2"), "my_type_v2");
        assert_eq!(clean_name("Ünïcode"), "_n_code");
        for s in ["", "a b", "--x--", "ok_1", "日本"] {
            let once = clean_name(s);
            assert_eq!(clean_name(&once), once);
            assert!(once.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn else_chains() {
        assert_eq!(maybe_else(1), "");
        assert_eq!(maybe_else(2), "else ");
        assert_eq!(maybe_else(7), "else ");
    }
}
