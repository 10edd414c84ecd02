use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    ast::{BasicKind, Bounds, Node},
    diagnostic::{Diagnostic, ErrorKind, Label, Result},
    symbols::{LeafCategory, LeafTypes, SymbolTable, TypeId},
};

/// Find the leaf category of every named type.  Aliases take the category of
/// their target, containers become known once every type they reference is
/// known.  Sweeps repeat until nothing new is learned, anything still unknown
/// at that point is either undefined or part of a reference cycle.
pub fn resolve_leaf_types(table: &mut SymbolTable) -> Result {
    let mut known: HashMap<TypeId, LeafCategory> = HashMap::new();
    let mut sweep = 0;

    loop {
        sweep += 1;
        let mut learned = 0;

        for (id, _, node) in table.names.defined() {
            if known.contains_key(&id) {
                continue;
            }

            if let Some(category) = category(table, &known, id, node)? {
                known.insert(id, category);
                learned += 1;
            }
        }

        log::debug!("leaf type sweep {sweep}: {learned} newly known types");
        if learned == 0 {
            break;
        }
    }

    let unknown = table
        .names
        .ids()
        .filter(|id| !known.contains_key(id))
        .collect_vec();

    if !unknown.is_empty() {
        let names = unknown.iter().map(|&id| table.names.name(id)).format(", ");
        let mut diag = Diagnostic::error(ErrorKind::Resolution, "0401")
            .name(format!("types remain unknown: {names}"));

        for &id in &unknown {
            let name = table.names.name(id);
            let label = match table.names.node(id) {
                Some(node) => table
                    .label(node.location())
                    .message(format!("{name} is part of a reference cycle")),
                None => Label::from(format!("{name} is referenced but never defined")),
            };
            diag = diag.label(label);
        }

        return Err(diag);
    }

    table.leaf_types.replace_types(known);
    Ok(())
}

/// The leaf category of a top-level definition, or `None` if it depends on a
/// type that is not known yet
fn category(
    table: &SymbolTable,
    known: &HashMap<TypeId, LeafCategory>,
    id: TypeId,
    node: &Node,
) -> Result<Option<LeafCategory>> {
    let category = match node {
        Node::Basic(b) => table.leaf_types.basic(b.kind),
        Node::MetaType(r) => known.get(&r.target).copied(),
        Node::MetaMember(_) => {
            return Err(Diagnostic::internal(
                "0903",
                format!(
                    "type {} is defined as a member reference",
                    table.names.name(id)
                ),
            ))
        }
        Node::Enumerated(_) => Some(LeafCategory::Enumerated),
        _ => references_known(known, node)
            .then(|| node.structural_category())
            .flatten(),
    };

    Ok(category)
}

/// Are all named types referenced from within a node known
fn references_known(known: &HashMap<TypeId, LeafCategory>, node: &Node) -> bool {
    match node {
        Node::Basic(_) | Node::Enumerated(_) => true,
        Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => c
            .members
            .iter()
            .all(|m| references_known(known, &m.node)),
        Node::SequenceOf(c) | Node::SetOf(c) => references_known(known, &c.element),
        Node::MetaType(r) | Node::MetaMember(r) => known.contains_key(&r.target),
    }
}

/// Replace every alias `A ::= B` with a copy of the definition at the end of
/// its alias chain.  The alias keeps its own declaration site and its own,
/// narrower, range constraint.  The direct alias edges are kept in
/// [`SymbolTable::metatypes`].
pub fn collapse_aliases(table: &mut SymbolTable) -> Result {
    let aliases = table
        .names
        .defined()
        .filter_map(|(id, _, node)| match node {
            Node::MetaType(r) => Some((id, r.clone())),
            _ => None,
        })
        .collect_vec();

    for (id, alias) in aliases {
        table.metatypes.insert(id, alias.target);

        let mut bounds = alias.bounds;
        let mut current = alias.target;
        let mut steps = 0;

        let mut node = loop {
            let node = table.names.node(current).ok_or_else(|| {
                let target = table.names.name(current);
                Diagnostic::internal(
                    "0902",
                    format!("alias target {target} has no definition"),
                )
            })?;

            match node {
                Node::MetaType(next) => {
                    bounds = bounds.or(next.bounds);
                    current = next.target;
                }
                other => break other.clone(),
            }

            steps += 1;
            if steps > table.names.len() {
                return Err(Diagnostic::internal(
                    "0903",
                    format!("alias chain of {} does not end", table.names.name(id)),
                ));
            }
        };

        if let Some(bounds) = bounds {
            narrow(&mut node, bounds, &table.leaf_types);
        }
        node.set_location(alias.location);

        log::trace!(
            "collapsed alias {} to {}",
            table.names.name(id),
            table.names.name(current)
        );
        table.names.restore(id, node);
    }

    Ok(())
}

/// Apply the constraint written on an alias to the aliased definition
fn narrow(node: &mut Node, bounds: Bounds, leaf_types: &LeafTypes) {
    match node {
        Node::Basic(b) => match (leaf_types.basic(b.kind), bounds) {
            (Some(LeafCategory::Integer), Bounds::Integer { .. }) => b.range = Some(bounds),
            (Some(LeafCategory::Real), Bounds::Real { .. }) => b.range = Some(bounds),
            (Some(LeafCategory::Real), Bounds::Integer { min, max }) => {
                b.range = Some(Bounds::Real {
                    min: min as f64,
                    max: max as f64,
                })
            }
            (Some(LeafCategory::OctetString), _) => {
                if let Some(size) = size_of(bounds) {
                    b.range = Some(size);
                }
            }
            _ if b.kind == BasicKind::AsciiString => {
                if let Some(size) = size_of(bounds) {
                    b.range = Some(size);
                }
            }
            _ => (),
        },
        Node::SequenceOf(c) | Node::SetOf(c) => {
            if let Some(size) = size_of(bounds) {
                c.size = Some(size);
            }
        }
        _ => (),
    }
}

/// Interpret bounds read from a reference as a SIZE constraint
fn size_of(bounds: Bounds) -> Option<Bounds> {
    match bounds {
        Bounds::Size { .. } => Some(bounds),
        Bounds::Integer { min, max } => Some(Bounds::Size {
            min: u64::try_from(min).ok()?,
            max: u64::try_from(max).ok()?,
        }),
        Bounds::Real { .. } => None,
    }
}
