use itertools::Itertools;

use crate::{
    ast::{Node, Reference},
    symbols::{Names, SourceId, SymbolTable, TypeId},
};

/// Give every anonymous constructed type nested in a named type a name of
/// its own.  Returns the newly created types.
pub fn hoist_anonymous_types(table: &mut SymbolTable) -> Vec<TypeId> {
    hoist_types(table, |node| node.structural_category().is_some())
}

/// Move every inline member or element matching `predicate` into a new
/// artificial named type and replace it by a reference.  Members are named
/// `<Enclosing>_<field>` and elements `<Enclosing>_elm`, with a numeric
/// suffix added when the name is taken.  Repeats until a sweep hoists nothing
/// so that types nested inside hoisted types are named too.
pub fn hoist_types(table: &mut SymbolTable, predicate: impl Fn(&Node) -> bool) -> Vec<TypeId> {
    let mut hoisted = vec![];
    let mut sweep = 0;

    loop {
        sweep += 1;
        let before = hoisted.len();

        let ids = table.names.defined().map(|(id, _, _)| id).collect_vec();
        for id in ids {
            let Some(mut node) = table.names.take(id) else {
                continue;
            };

            let enclosing = table.names.name(id).to_string();
            let file = table.names.entry(id).and_then(|e| e.file);

            match &mut node {
                Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => {
                    for member in &mut c.members {
                        if hoistable(&member.node, &predicate) {
                            let base = format!("{enclosing}_{}", member.name);
                            hoisted.push(hoist(table, &mut member.node, base, file));
                        }
                    }
                }
                Node::SequenceOf(c) | Node::SetOf(c) => {
                    if hoistable(&c.element, &predicate) {
                        let base = format!("{enclosing}_elm");
                        hoisted.push(hoist(table, &mut c.element, base, file));
                    }
                }
                _ => (),
            }

            table.names.restore(id, node);
        }

        log::debug!(
            "hoisting sweep {sweep}: {} new types",
            hoisted.len() - before
        );
        if hoisted.len() == before {
            break;
        }
    }

    hoisted
}

/// References are never hoisted, they already name a type
fn hoistable(node: &Node, predicate: impl Fn(&Node) -> bool) -> bool {
    !matches!(node, Node::MetaMember(_) | Node::MetaType(_)) && predicate(node)
}

/// Register an inline node as a new named type and point its old place at it
fn hoist(
    table: &mut SymbolTable,
    slot: &mut Node,
    base: String,
    file: Option<SourceId>,
) -> TypeId {
    let name = unique_name(&table.names, base);
    let location = slot.location();
    let category = table.leaf_types.category_of(slot);

    let inline = std::mem::replace(
        slot,
        Node::MetaMember(Reference {
            target: table.names.intern(&name),
            bounds: None,
            location,
        }),
    );

    let id = table.names.insert_artificial(&name, inline, file);
    if let Some(category) = category {
        table.leaf_types.insert(id, category);
    }
    if let Some(file) = file {
        table.file_mut(file).types.push(id);
    }

    log::trace!("hoisted {name}");
    id
}

/// `base`, or `base_1`, `base_2`, ... if `base` is already in use
fn unique_name(names: &Names, base: String) -> String {
    let mut name = base.clone();
    let mut suffix = 0;

    while names.lookup(&name).is_some() {
        suffix += 1;
        name = format!("{base}_{suffix}");
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BasicKind, BasicNode, Bounds, Collection, Composite, Location, Member},
        symbols::LeafCategory,
    };

    fn loc(file: SourceId) -> Location {
        Location { file, line: 5 }
    }

    fn boolean(file: SourceId) -> Node {
        Node::Basic(BasicNode {
            kind: BasicKind::Boolean,
            range: None,
            location: loc(file),
        })
    }

    fn list_of(file: SourceId, element: Node) -> Node {
        Node::SequenceOf(Collection {
            element: Box::new(element),
            size: Some(Bounds::Size { min: 0, max: 8 }),
            location: loc(file),
        })
    }

    fn sequence(file: SourceId, members: Vec<(&str, Node)>) -> Node {
        Node::Sequence(Composite {
            members: members
                .into_iter()
                .map(|(name, node)| Member {
                    name: name.to_string(),
                    node,
                    optional: false,
                    discriminant: None,
                    location: loc(file),
                })
                .collect(),
            location: loc(file),
        })
    }

    #[test]
    fn inline_members_get_names() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let outer = table.names.intern("Outer");
        let node = sequence(
            file,
            vec![
                ("items", list_of(file, boolean(file))),
                ("flag", boolean(file)),
            ],
        );
        table.names.define(outer, node, file);
        table.file_mut(file).types.push(outer);

        let hoisted = hoist_anonymous_types(&mut table);
        assert_eq!(hoisted.len(), 1);

        let items = table.names.lookup("Outer_items").unwrap();
        assert_eq!(hoisted[0], items);
        assert!(table.names.is_artificial(items));
        assert_eq!(table.leaf_types.get(items), Some(LeafCategory::SequenceOf));
        assert_eq!(table.types_of_file(file), [outer, items]);

        let Some(Node::Sequence(c)) = table.names.node(outer) else {
            panic!("Outer changed shape")
        };
        assert!(matches!(&c.members[0].node, Node::MetaMember(r) if r.target == items));
        assert_eq!(c.members[1].node, boolean(file));

        // second run finds nothing to do
        let before = table.names.len();
        assert!(hoist_anonymous_types(&mut table).is_empty());
        assert_eq!(table.names.len(), before);
    }

    #[test]
    fn nested_types_are_hoisted_in_later_sweeps() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let top = table.names.intern("Top");
        let inner = sequence(file, vec![("x", boolean(file))]);
        table
            .names
            .define(top, list_of(file, list_of(file, inner)), file);

        let hoisted = hoist_anonymous_types(&mut table);
        let names = hoisted.iter().map(|&id| table.names.name(id)).collect_vec();
        assert_eq!(names, ["Top_elm", "Top_elm_elm"]);
        assert_eq!(table.leaf_type("Top_elm"), Some(LeafCategory::SequenceOf));
        assert_eq!(table.leaf_type("Top_elm_elm"), Some(LeafCategory::Sequence));
    }

    #[test]
    fn collisions_get_suffixes() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let taken = table.names.intern("Outer_items");
        table.names.define(taken, boolean(file), file);
        let outer = table.names.intern("Outer");
        table.names.define(
            outer,
            sequence(file, vec![("items", list_of(file, boolean(file)))]),
            file,
        );

        let hoisted = hoist_anonymous_types(&mut table);
        assert_eq!(table.names.name(hoisted[0]), "Outer_items_1");
        assert!(!table.names.is_artificial(taken));
    }

    #[test]
    fn custom_predicates() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let outer = table.names.intern("Outer");
        table
            .names
            .define(outer, sequence(file, vec![("flag", boolean(file))]), file);

        let hoisted = hoist_types(&mut table, |node| matches!(node, Node::Basic(_)));
        assert_eq!(table.names.name(hoisted[0]), "Outer_flag");
        assert_eq!(table.leaf_type("Outer_flag"), Some(LeafCategory::Boolean));
    }

    #[test]
    fn references_are_not_hoisted_again() {
        let mut table = SymbolTable::new();
        let file = table.add_file("a.asn");
        let outer = table.names.intern("Outer");
        let node = sequence(
            file,
            vec![
                ("items", list_of(file, boolean(file))),
                ("flag", boolean(file)),
            ],
        );
        table.names.define(outer, node, file);

        let hoisted = hoist_types(&mut table, |_| true);
        let names = hoisted.iter().map(|&id| table.names.name(id)).collect_vec();
        assert_eq!(names, ["Outer_items", "Outer_flag", "Outer_items_elm"]);

        assert!(hoist_types(&mut table, |_| true).is_empty());
    }
}
