//! Reference backend generating C printer functions for every type.

use std::fmt::Write;

use convert_case::{Case, Casing};

use crate::{
    analysis::{ascii_strings, bad_types},
    ast::{BasicKind, BasicNode, Bounds, Collection, Composite, Enumerated},
    diagnostic::{Diagnostic, Result},
    mapper::{clean_name, maybe_else, RecursiveMapper},
    symbols::{LeafTypes, Names, SymbolTable},
};

/// Emits the statements printing one value of a type.  `src` is the C
/// expression holding the value, `dest` the label printed in front of it.
#[derive(Debug, Clone, Default)]
pub struct CPrinter {
    /// Nesting depth of SEQUENCE OF loops, for unique loop variables
    depth: usize,
}

impl SymbolTable {
    /// Generate a C printer function for every type the user declared.  Bad
    /// types are skipped.
    pub fn c_printers(&self) -> Result<String> {
        let bad = bad_types(self, ascii_strings);
        let mut result = String::new();

        for file in self.file_ids() {
            for &id in self.types_of_file(file) {
                let name = self.names.name(id);
                if bad.contains(&id) {
                    log::debug!("skipping printer for bad type {name}");
                    continue;
                }
                if self.names.is_artificial(id) {
                    continue;
                }

                let lines = CPrinter::default().map(
                    "(*pVal)",
                    name,
                    id.into(),
                    &self.leaf_types,
                    &self.names,
                )?;

                let clean = clean_name(name);
                writeln!(
                    result,
                    "void Print{}(const asn1Scc{clean} *pVal)\n{{",
                    clean.to_case(Case::Pascal)
                )?;
                for line in indent(lines) {
                    writeln!(result, "{line}")?;
                }
                writeln!(result, "}}\n")?;
            }
        }

        Ok(result)
    }
}

impl RecursiveMapper for CPrinter {
    type Line = String;

    fn map_integer(
        &mut self,
        src: &str,
        dest: &str,
        _: &BasicNode,
        _: &LeafTypes,
        _: &Names,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "printf(\"{dest} %lld\\n\", (long long) {src});"
        )])
    }

    fn map_real(
        &mut self,
        src: &str,
        dest: &str,
        _: &BasicNode,
        _: &LeafTypes,
        _: &Names,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("printf(\"{dest} %f\\n\", (double) {src});")])
    }

    fn map_boolean(
        &mut self,
        src: &str,
        dest: &str,
        _: &BasicNode,
        _: &LeafTypes,
        _: &Names,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "printf(\"{dest} %s\\n\", {src} ? \"TRUE\" : \"FALSE\");"
        )])
    }

    fn map_octet_string(
        &mut self,
        src: &str,
        dest: &str,
        node: &BasicNode,
        _: &LeafTypes,
        _: &Names,
    ) -> Result<Vec<String>> {
        if node.kind == BasicKind::AsciiString {
            return Ok(vec![format!("printf(\"{dest} %s\\n\", {src});")]);
        }

        let i = self.index();
        let count = length(src, node.range);
        Ok(vec![
            "{".to_string(),
            format!("    int {i};"),
            format!("    printf(\"{dest} \");"),
            format!("    for ({i} = 0; {i} < {count}; {i}++)"),
            format!("        printf(\"%02x\", {src}.arr[{i}]);"),
            "    printf(\"\\n\");".to_string(),
            "}".to_string(),
        ])
    }

    fn map_enumerated(
        &mut self,
        src: &str,
        dest: &str,
        _: &Enumerated,
        _: &LeafTypes,
        _: &Names,
    ) -> Result<Vec<String>> {
        Ok(vec![format!("printf(\"{dest} %d\\n\", (int) {src});")])
    }

    fn map_sequence(
        &mut self,
        src: &str,
        dest: &str,
        node: &Composite,
        leaf_types: &LeafTypes,
        names: &Names,
    ) -> Result<Vec<String>> {
        let mut lines = vec![];

        for member in &node.members {
            let field = clean_name(&member.name);
            let inner = self.map(
                &format!("{src}.{field}"),
                &format!("{dest}::{}", member.name),
                (&member.node).into(),
                leaf_types,
                names,
            )?;

            if member.optional {
                lines.push(format!("if ({src}.exist.{field}) {{"));
                lines.extend(indent(inner));
                lines.push("}".to_string());
            } else {
                lines.extend(inner);
            }
        }

        Ok(lines)
    }

    fn map_set(
        &mut self,
        src: &str,
        dest: &str,
        node: &Composite,
        leaf_types: &LeafTypes,
        names: &Names,
    ) -> Result<Vec<String>> {
        self.map_sequence(src, dest, node, leaf_types, names)
    }

    fn map_choice(
        &mut self,
        src: &str,
        dest: &str,
        node: &Composite,
        leaf_types: &LeafTypes,
        names: &Names,
    ) -> Result<Vec<String>> {
        let mut lines = vec![];

        for (idx, member) in node.members.iter().enumerate() {
            let field = clean_name(&member.name);
            let discriminant = member
                .discriminant
                .clone()
                .unwrap_or_else(|| format!("{field}_PRESENT"));

            lines.push(format!(
                "{}if ({src}.kind == {discriminant}) {{",
                maybe_else(idx + 1)
            ));
            lines.extend(indent(self.map(
                &format!("{src}.u.{field}"),
                &format!("{dest}::{}", member.name),
                (&member.node).into(),
                leaf_types,
                names,
            )?));
            lines.push("}".to_string());
        }

        Ok(lines)
    }

    fn map_sequence_of(
        &mut self,
        src: &str,
        dest: &str,
        node: &Collection,
        leaf_types: &LeafTypes,
        names: &Names,
    ) -> Result<Vec<String>> {
        let i = self.index();
        let count = length(src, node.size);
        let mut lines = vec![
            "{".to_string(),
            format!("    int {i};"),
            format!("    for ({i} = 0; {i} < {count}; {i}++) {{"),
        ];

        self.depth += 1;
        let element = self.map(
            &format!("{src}.arr[{i}]"),
            &format!("{dest}[]"),
            (&*node.element).into(),
            leaf_types,
            names,
        );
        self.depth -= 1;

        lines.extend(indent(indent(element?)));
        lines.push("    }".to_string());
        lines.push("}".to_string());

        Ok(lines)
    }

    fn map_set_of(
        &mut self,
        src: &str,
        dest: &str,
        node: &Collection,
        leaf_types: &LeafTypes,
        names: &Names,
    ) -> Result<Vec<String>> {
        self.map_sequence_of(src, dest, node, leaf_types, names)
    }
}

impl CPrinter {
    /// Loop variable for the current nesting depth
    fn index(&self) -> String {
        format!("i{}", self.depth)
    }
}

/// Number of elements to print, fixed sizes do not store a count
fn length(src: &str, size: Option<Bounds>) -> String {
    match size {
        Some(bounds @ Bounds::Size { max, .. }) if bounds.is_fixed() => max.to_string(),
        _ => format!("{src}.nCount"),
    }
}

fn indent(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| format!("    {line}"))
        .collect()
}

impl From<std::fmt::Error> for Diagnostic {
    fn from(value: std::fmt::Error) -> Self {
        Diagnostic::internal("0904", format!("unable to write generated code: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{Location, Member, Node, Reference},
        symbols::SourceId,
    };

    fn location() -> Location {
        Location {
            file: SourceId::new(0),
            line: 1,
        }
    }

    fn basic(kind: BasicKind, range: Option<Bounds>) -> Node {
        Node::Basic(BasicNode {
            kind,
            range,
            location: location(),
        })
    }

    fn member(name: &str, node: Node, optional: bool, discriminant: Option<&str>) -> Member {
        Member {
            name: name.to_string(),
            node,
            optional,
            discriminant: discriminant.map(str::to_string),
            location: location(),
        }
    }

    fn print(node: &Node, names: &Names) -> Vec<String> {
        CPrinter::default()
            .map("v", "x", node.into(), &LeafTypes::default(), names)
            .unwrap()
    }

    #[test]
    fn optional_members_are_guarded() {
        let node = Node::Sequence(Composite {
            members: vec![
                member("a", basic(BasicKind::Boolean, None), false, None),
                member("my-b", basic(BasicKind::Real, None), true, None),
            ],
            location: location(),
        });

        assert_eq!(
            print(&node, &Names::default()),
            [
                "printf(\"x::a %s\\n\", v.a ? \"TRUE\" : \"FALSE\");",
                "if (v.exist.my_b) {",
                "    printf(\"x::my-b %f\\n\", (double) v.my_b);",
                "}",
            ]
        );
    }

    #[test]
    fn choices_build_else_chains() {
        let node = Node::Choice(Composite {
            members: vec![
                member(
                    "a",
                    basic(BasicKind::Boolean, None),
                    false,
                    Some("a_PRESENT"),
                ),
                member("b", basic(BasicKind::Boolean, None), false, Some("b_sel")),
            ],
            location: location(),
        });

        let lines = print(&node, &Names::default());
        assert_eq!(lines[0], "if (v.kind == a_PRESENT) {");
        assert_eq!(lines[3], "else if (v.kind == b_sel) {");
        assert_eq!(
            lines[4],
            "    printf(\"x::b %s\\n\", v.u.b ? \"TRUE\" : \"FALSE\");"
        );
    }

    #[test]
    fn nested_loops_use_distinct_indices() {
        let inner = Node::SequenceOf(Collection {
            element: Box::new(basic(BasicKind::Integer, None)),
            size: Some(Bounds::Size { min: 4, max: 4 }),
            location: location(),
        });
        let outer = Node::SequenceOf(Collection {
            element: Box::new(inner),
            size: Some(Bounds::Size { min: 0, max: 9 }),
            location: location(),
        });

        let lines = print(&outer, &Names::default());
        assert_eq!(lines[2], "    for (i0 = 0; i0 < v.nCount; i0++) {");
        assert!(lines.contains(&"            for (i1 = 0; i1 < 4; i1++) {".to_string()));
        assert!(lines
            .iter()
            .any(|l| l.contains("(long long) v.arr[i0].arr[i1]")));
    }

    #[test]
    fn references_print_inline() {
        let mut names = Names::default();
        let target = names.intern("Octets");
        names.define(
            target,
            basic(
                BasicKind::OctetString,
                Some(Bounds::Size { min: 2, max: 2 }),
            ),
            SourceId::new(0),
        );
        let node = Node::MetaMember(Reference {
            target,
            bounds: None,
            location: location(),
        });

        let lines = print(&node, &names);
        assert_eq!(lines[3], "    for (i0 = 0; i0 < 2; i0++)");
        assert_eq!(lines[4], "        printf(\"%02x\", v.arr[i0]);");
    }
}
