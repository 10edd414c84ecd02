use std::collections::HashSet;

use crate::{
    ast::{Location, Node},
    diagnostic::{Diagnostic, ErrorKind, Result},
    symbols::{SymbolTable, TypeId},
};

/// Words that cannot be used as type or field names because they are
/// keywords in at least one of the generated languages.  Each entry is a
/// whitespace separated word list, compared case-insensitively.
const RESERVED: [&str; 5] = [
    C_KEYWORDS,
    ADA_KEYWORDS,
    PYTHON_KEYWORDS,
    SQL_KEYWORDS,
    VHDL_KEYWORDS,
];

const C_KEYWORDS: &str = "
    auto bool break case catch char class const continue default delete do
    double else enum extern float for friend goto if inline int long namespace
    new operator private protected public register return short signed sizeof
    static struct switch template this throw try typedef typename union unsigned
    using virtual void volatile while
";

const ADA_KEYWORDS: &str = "
    abort abs abstract accept access aliased all and array at begin body
    constant declare delay delta digits elsif end entry exception exit function
    generic in interface is limited loop mod not null of or others out
    overriding package pragma procedure raise range record rem renames requeue
    reverse select separate subtype synchronized tagged task terminate then type
    until use when with xor
";

const PYTHON_KEYWORDS: &str = "
    as assert def del elif except exec finally from global import lambda
    nonlocal pass print yield
";

const SQL_KEYWORDS: &str = "
    create drop insert into key primary references table update values where
";

const VHDL_KEYWORDS: &str = "
    architecture attribute block buffer bus component configuration disconnect
    downto entity file guarded impure inertial label library linkage literal map
    nand next nor open port postponed process pure reject report shared signal
    sla sll sra srl to transport unaffected units variable wait xnor
";

/// Suffix reserved for the buffer types generated next to every type
const RESERVED_SUFFIX: &str = "-buffer";

/// Check every type name and every field name reachable from the named types
/// against the reserved words
pub fn check_reserved_names(table: &SymbolTable) -> Result {
    let mut checked = HashSet::new();

    for (id, _, _) in table.names.defined() {
        check_type(table, id, &mut checked)?;
    }

    Ok(())
}

fn check_type(table: &SymbolTable, id: TypeId, checked: &mut HashSet<TypeId>) -> Result {
    if !checked.insert(id) {
        return Ok(());
    }

    let Some(node) = table.names.node(id) else {
        return Ok(());
    };

    check_name(table, table.names.name(id), "type", node.location())?;
    check_node(table, node, checked)
}

fn check_node(table: &SymbolTable, node: &Node, checked: &mut HashSet<TypeId>) -> Result {
    match node {
        Node::Basic(_) | Node::Enumerated(_) => Ok(()),
        Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => {
            for member in &c.members {
                check_name(table, &member.name, "field", member.location)?;
                check_node(table, &member.node, checked)?;
            }
            Ok(())
        }
        Node::SequenceOf(c) | Node::SetOf(c) => check_node(table, &c.element, checked),
        Node::MetaType(r) | Node::MetaMember(r) => check_type(table, r.target, checked),
    }
}

fn check_name(table: &SymbolTable, name: &str, what: &str, location: Location) -> Result {
    let lower = name.to_lowercase();

    if is_reserved(&lower) {
        let message = format!("rename this {what}, '{name}' is a keyword in a generated language");
        return Err(Diagnostic::error(ErrorKind::Naming, "0301")
            .name(format!("{what} name '{name}' is a reserved word"))
            .label(table.label(location).message(message)));
    }

    if lower.ends_with(RESERVED_SUFFIX) {
        let message = format!("names ending in '{RESERVED_SUFFIX}' are used by generated types");
        return Err(Diagnostic::error(ErrorKind::Naming, "0302")
            .name(format!("{what} name '{name}' ends with '{RESERVED_SUFFIX}'"))
            .label(table.label(location).message(message)));
    }

    Ok(())
}

fn is_reserved(lower: &str) -> bool {
    RESERVED
        .iter()
        .flat_map(|words| words.split_whitespace())
        .any(|word| word == lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BasicKind, BasicNode, Composite, Member};

    fn table_with(name: &str, field: &str) -> SymbolTable {
        let mut table = SymbolTable::new();
        let file = table.add_file("names.asn");
        let location = Location { file, line: 2 };
        let id = table.names.intern(name);
        let node = Node::Choice(Composite {
            members: vec![Member {
                name: field.to_string(),
                node: Node::Basic(BasicNode {
                    kind: BasicKind::Boolean,
                    range: None,
                    location,
                }),
                optional: false,
                discriminant: Some(format!("{field}_PRESENT")),
                location: Location { file, line: 3 },
            }],
            location,
        });
        table.names.define(id, node, file);
        table
    }

    #[test]
    fn ordinary_names_pass() {
        check_reserved_names(&table_with("Telemetry", "value")).unwrap();
        check_reserved_names(&table_with("My-Type", "buffer-size")).unwrap();
    }

    #[test]
    fn keywords_are_rejected_in_any_case() {
        let err = check_reserved_names(&table_with("Record", "value")).unwrap_err();
        assert_eq!(err.error_code, "0301");
        assert_eq!(err.kind, ErrorKind::Naming);
        assert_eq!(err.labels[0].line, Some(2));

        let err = check_reserved_names(&table_with("Msg", "Signal")).unwrap_err();
        assert_eq!(err.labels[0].line, Some(3));
        assert!(err.name.contains("field"));
    }

    #[test]
    fn every_language_is_checked() {
        for word in ["volatile", "renames", "lambda", "values", "downto"] {
            assert!(is_reserved(word), "{word} is not reserved");
        }
        assert!(!is_reserved("telemetry"));
    }

    #[test]
    fn buffer_suffix_is_rejected() {
        let err = check_reserved_names(&table_with("Frame-Buffer", "x")).unwrap_err();
        assert_eq!(err.error_code, "0302");

        let err = check_reserved_names(&table_with("Frame", "data-buffer")).unwrap_err();
        assert_eq!(err.error_code, "0302");
    }

    #[test]
    fn undefined_references_are_skipped() {
        let mut table = table_with("Frame", "x");
        table.names.intern("Dangling");
        check_reserved_names(&table).unwrap();
    }
}
