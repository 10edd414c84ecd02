//! The symbol table produced by AST construction and read by every backend.

use std::{collections::HashMap, fmt::Display};

use crate::{
    ast::{BasicKind, Location, Node},
    diagnostic::{Diagnostic, Label},
};

/// Handle to a named type within a [`Names`] table.  Handles are only
/// meaningful for the table that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(usize);

/// Reference to a single ASN.1 grammar file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(usize);

/// The ultimate structural kind of a type, after following all aliases
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeafCategory {
    Integer,
    Real,
    Boolean,
    OctetString,
    Enumerated,
    Sequence,
    Set,
    Choice,
    SequenceOf,
    SetOf,
}

/// A single named type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    /// The ASN.1 name of the type
    pub name: String,

    /// Definition of the type.  `None` while a name has been referenced but
    /// not (yet) defined.
    pub node: Option<Node>,

    /// The type was synthesized and not declared by the user
    pub artificial: bool,

    /// File the type was declared in
    pub file: Option<SourceId>,
}

/// Arena of all named types.  Names are interned on first mention so that
/// references can be created before the referenced definition is read.
#[derive(Debug, Clone, Default)]
pub struct Names {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, TypeId>,
}

/// Mapping from named types and basic node kinds to their leaf category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafTypes {
    basics: HashMap<BasicKind, LeafCategory>,
    types: HashMap<TypeId, LeafCategory>,
}

/// A grammar file mentioned by the AST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name as given by the external compiler
    pub name: String,

    /// Modules declared in the file
    pub modules: Vec<Module>,

    /// Types declared in the file, in declaration order, followed by the
    /// pseudo-types hoisted out of them
    pub types: Vec<TypeId>,
}

/// An ASN.1 module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub name: String,
    pub exported_types: Vec<String>,
    pub imported: Vec<ImportedModule>,
}

/// Types imported from one other module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportedModule {
    pub name: String,
    pub types: Vec<String>,
}

/// Everything known about the types of one generation run
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Every named type, including hoisted pseudo-types
    pub names: Names,

    /// Leaf category of every named type
    pub leaf_types: LeafTypes,

    /// Direct alias edges `A ::= B`, kept after the aliases were collapsed
    pub metatypes: HashMap<TypeId, TypeId>,

    /// Grammar files in the order they appeared in the AST
    pub files: Vec<SourceFile>,

    /// Non-fatal diagnostics gathered while building the table
    pub warnings: Vec<Diagnostic>,
}

impl SourceId {
    /// Refer to a file without registering it, for hand-built test nodes
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        SourceId(index)
    }
}

impl LeafCategory {
    /// The ASN.1 spelling of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            LeafCategory::Integer => "INTEGER",
            LeafCategory::Real => "REAL",
            LeafCategory::Boolean => "BOOLEAN",
            LeafCategory::OctetString => "OCTET STRING",
            LeafCategory::Enumerated => "ENUMERATED",
            LeafCategory::Sequence => "SEQUENCE",
            LeafCategory::Set => "SET",
            LeafCategory::Choice => "CHOICE",
            LeafCategory::SequenceOf => "SEQUENCEOF",
            LeafCategory::SetOf => "SETOF",
        }
    }
}

impl Display for LeafCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Names {
    /// Get the handle for a name, creating an undefined entry if the name has
    /// not been seen before.
    pub fn intern(&mut self, name: &str) -> TypeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }

        let id = TypeId(self.entries.len());
        self.entries.push(TypeEntry {
            name: name.to_string(),
            node: None,
            artificial: false,
            file: None,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Find the handle of a name, if it was ever mentioned
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the definition of a type
    pub fn node(&self, id: TypeId) -> Option<&Node> {
        self.entries.get(id.0)?.node.as_ref()
    }

    /// Get the definition of a type by name
    pub fn resolve(&self, name: &str) -> Option<&Node> {
        self.node(self.lookup(name)?)
    }

    /// Get the entry of a type
    pub fn entry(&self, id: TypeId) -> Option<&TypeEntry> {
        self.entries.get(id.0)
    }

    /// Get the name of a type
    pub fn name(&self, id: TypeId) -> &str {
        self.entries
            .get(id.0)
            .map_or("<invalid type id>", |e| &e.name)
    }

    /// Was the type synthesized rather than declared by the user
    pub fn is_artificial(&self, id: TypeId) -> bool {
        self.entries.get(id.0).is_some_and(|e| e.artificial)
    }

    /// Iterate over every mentioned name, defined or not, in order of first
    /// mention.
    pub fn ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.entries.len()).map(TypeId)
    }

    /// Iterate over every defined type in order of first mention
    pub fn defined(&self) -> impl Iterator<Item = (TypeId, &TypeEntry, &Node)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| Some((TypeId(idx), entry, entry.node.as_ref()?)))
    }

    /// Number of defined types
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a new type that was not declared by the user.  The caller must make
    /// sure the name is not in use yet.
    pub fn insert_artificial(&mut self, name: &str, node: Node, file: Option<SourceId>) -> TypeId {
        let id = self.intern(name);
        let entry = &mut self.entries[id.0];
        entry.node = Some(node);
        entry.artificial = true;
        entry.file = file;
        id
    }

    /// Set the definition of a type, returning the previous definition
    pub(crate) fn define(&mut self, id: TypeId, node: Node, file: SourceId) -> Option<Node> {
        let entry = &mut self.entries[id.0];
        entry.file = Some(file);
        entry.node.replace(node)
    }

    /// Temporarily remove a definition so it can be edited while the table
    /// grows.  Must be followed by [`Names::restore`].
    pub(crate) fn take(&mut self, id: TypeId) -> Option<Node> {
        self.entries.get_mut(id.0)?.node.take()
    }

    pub(crate) fn restore(&mut self, id: TypeId, node: Node) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.node = Some(node);
        }
    }

    pub(crate) fn set_artificial(&mut self, id: TypeId, artificial: bool) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.artificial = artificial;
        }
    }
}

impl Default for LeafTypes {
    fn default() -> Self {
        let basics = HashMap::from([
            (BasicKind::Integer, LeafCategory::Integer),
            (BasicKind::Real, LeafCategory::Real),
            (BasicKind::Boolean, LeafCategory::Boolean),
            (BasicKind::OctetString, LeafCategory::OctetString),
            (BasicKind::AsciiString, LeafCategory::OctetString),
        ]);

        LeafTypes {
            basics,
            types: HashMap::new(),
        }
    }
}

impl LeafTypes {
    /// A table without any basic kind mappings
    pub fn empty() -> Self {
        LeafTypes {
            basics: HashMap::new(),
            types: HashMap::new(),
        }
    }

    /// Leaf category of a basic node kind
    pub fn basic(&self, kind: BasicKind) -> Option<LeafCategory> {
        self.basics.get(&kind).copied()
    }

    /// Change the leaf category a basic node kind maps to
    pub fn set_basic(&mut self, kind: BasicKind, category: LeafCategory) {
        self.basics.insert(kind, category);
    }

    /// Leaf category of a named type
    pub fn get(&self, id: TypeId) -> Option<LeafCategory> {
        self.types.get(&id).copied()
    }

    /// Leaf category of any node, following references through this table
    pub fn category_of(&self, node: &Node) -> Option<LeafCategory> {
        match node {
            Node::Basic(b) => self.basic(b.kind),
            Node::MetaType(r) | Node::MetaMember(r) => self.get(r.target),
            _ => node.structural_category(),
        }
    }

    /// Number of named types with a known category
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn insert(&mut self, id: TypeId, category: LeafCategory) {
        self.types.insert(id, category);
    }

    pub(crate) fn replace_types(&mut self, types: HashMap<TypeId, LeafCategory>) {
        self.types = types;
    }
}

impl SymbolTable {
    /// Create a new, empty, symbol table
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a grammar file
    pub(crate) fn add_file(&mut self, name: &str) -> SourceId {
        let id = SourceId(self.files.len());
        self.files.push(SourceFile {
            name: name.to_string(),
            modules: vec![],
            types: vec![],
        });
        id
    }

    /// Get a grammar file
    pub fn file(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Iterate over all grammar file ids
    pub fn file_ids(&self) -> impl Iterator<Item = SourceId> {
        (0..self.files.len()).map(SourceId)
    }

    /// Names of the types declared in a file, in declaration order
    pub fn types_of_file(&self, file: SourceId) -> &[TypeId] {
        self.files.get(file.0).map_or(&[], |f| &f.types)
    }

    /// Definitions of the types declared in a file, in declaration order
    pub fn ast_of_file(&self, file: SourceId) -> impl Iterator<Item = (TypeId, &Node)> + '_ {
        self.types_of_file(file)
            .iter()
            .filter_map(|&id| Some((id, self.names.node(id)?)))
    }

    pub(crate) fn file_mut(&mut self, id: SourceId) -> &mut SourceFile {
        &mut self.files[id.0]
    }

    /// Leaf category of a type by name
    pub fn leaf_type(&self, name: &str) -> Option<LeafCategory> {
        self.leaf_types.get(self.names.lookup(name)?)
    }

    /// Name of the type that `name` was declared as an alias of
    pub fn metatype(&self, name: &str) -> Option<&str> {
        let target = self.metatypes.get(&self.names.lookup(name)?)?;
        Some(self.names.name(*target))
    }

    /// Create a diagnostic label pointing at a location in the grammar
    pub fn label(&self, location: Location) -> Label {
        let mut label = Label::new();
        if let Some(file) = self.file(location.file) {
            label = label.file(&file.name);
        }
        if location.line > 0 {
            label = label.line(location.line);
        }
        label
    }

    /// Mark every type missing from `unfiltered` as artificial.  `unfiltered`
    /// is a table read from the AST of the same grammar with every type
    /// visible, so anything absent from it was not declared by the user.
    pub fn mark_artificial(&mut self, unfiltered: &SymbolTable) {
        let absent: Vec<TypeId> = self
            .names
            .defined()
            .filter(|(_, entry, _)| unfiltered.names.lookup(&entry.name).is_none())
            .map(|(id, _, _)| id)
            .collect();

        for id in absent {
            log::debug!("marking {} as artificial", self.names.name(id));
            self.names.set_artificial(id, true);
        }
    }
}
