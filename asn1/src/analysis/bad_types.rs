use std::collections::BTreeSet;

use crate::{
    ast::{BasicKind, Node},
    symbols::{SymbolTable, TypeId},
};

/// The default policy for backends that cannot handle ASCII strings
pub fn ascii_strings(node: &Node) -> bool {
    matches!(node, Node::Basic(b) if b.kind == BasicKind::AsciiString)
}

/// Find every named type that is `unsupported` itself or contains such a
/// type anywhere, directly or through references.  Backends skip these
/// types silently.
pub fn bad_types(table: &SymbolTable, unsupported: impl Fn(&Node) -> bool) -> BTreeSet<TypeId> {
    let mut bad = BTreeSet::new();
    let mut sweep = 0;

    loop {
        sweep += 1;
        let mut found = 0;

        for (id, _, node) in table.names.defined() {
            if bad.contains(&id) {
                continue;
            }

            if contaminated(node, &bad, &unsupported) {
                log::trace!("{} is a bad type", table.names.name(id));
                bad.insert(id);
                found += 1;
            }
        }

        log::debug!("bad type sweep {sweep}: {found} new bad types");
        if found == 0 {
            break;
        }
    }

    bad
}

/// Is the node unsupported or does it contain a known bad type
fn contaminated(
    node: &Node,
    bad: &BTreeSet<TypeId>,
    unsupported: &impl Fn(&Node) -> bool,
) -> bool {
    if unsupported(node) {
        return true;
    }

    match node {
        Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => c
            .members
            .iter()
            .any(|m| contaminated(&m.node, bad, unsupported)),
        Node::SequenceOf(c) | Node::SetOf(c) => contaminated(&c.element, bad, unsupported),
        Node::MetaType(r) | Node::MetaMember(r) => bad.contains(&r.target),
        Node::Basic(_) | Node::Enumerated(_) => false,
    }
}
