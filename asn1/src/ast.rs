//! Node model for ASN.1 type definitions, after they have been read from the
//! XML AST description.

pub(crate) mod builder;

use crate::symbols::{LeafCategory, SourceId, TypeId};

/// Where a node was declared in the ASN.1 grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// The grammar file
    pub file: SourceId,

    /// 1-based line number, or 0 if the AST did not provide one
    pub line: usize,
}

/// A single ASN.1 type, one variant per constructor
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// INTEGER, REAL, BOOLEAN, OCTET STRING or one of the ASCII string types
    Basic(BasicNode),

    /// ENUMERATED
    Enumerated(Enumerated),

    /// SEQUENCE
    Sequence(Composite),

    /// SET
    Set(Composite),

    /// CHOICE
    Choice(Composite),

    /// SEQUENCE OF
    SequenceOf(Collection),

    /// SET OF
    SetOf(Collection),

    /// Type level alias `A ::= B`.  Removed from the symbol table before any
    /// backend runs.
    MetaType(Reference),

    /// Reference to another named type from inside a member or collection
    MetaMember(Reference),
}

/// Kind of a basic node.  The leaf category of a basic node is found by
/// looking this tag up in [`crate::LeafTypes`], never from the tag directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BasicKind {
    Integer,
    Real,
    Boolean,
    OctetString,

    /// IA5String, NumericString and friends
    AsciiString,
}

/// A basic, non-structured type
#[derive(Debug, Clone, PartialEq)]
pub struct BasicNode {
    /// Which kind of basic type this is
    pub kind: BasicKind,

    /// Value range (INTEGER, REAL) or SIZE range (strings)
    pub range: Option<Bounds>,

    /// Declaration site
    pub location: Location,
}

/// An inclusive pair of bounds from a range or SIZE constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// Value range of an INTEGER
    Integer { min: i128, max: i128 },

    /// Value range of a REAL
    Real { min: f64, max: f64 },

    /// SIZE constraint of a string or a collection
    Size { min: u64, max: u64 },
}

/// An ENUMERATED type
#[derive(Debug, Clone, PartialEq)]
pub struct Enumerated {
    /// All enumerants in declaration order
    pub members: Vec<Enumerant>,

    /// Declaration site
    pub location: Location,
}

/// A single value of an ENUMERATED type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerant {
    /// The ASN.1 name of the value
    pub name: String,

    /// Integer value, if the AST provided one
    pub value: Option<i64>,

    /// Identifier the external compiler assigned to this value
    pub id: Option<String>,

    /// Declaration site
    pub location: Location,
}

/// The members of a SEQUENCE, SET or CHOICE
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// Members in declaration order.  The order is the field order of every
    /// generated structure.
    pub members: Vec<Member>,

    /// Declaration site
    pub location: Location,
}

/// A single field of a SEQUENCE, SET or CHOICE
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Field name
    pub name: String,

    /// The type of the field, either a basic node or a [`Node::MetaMember`]
    /// once anonymous types have been hoisted
    pub node: Node,

    /// OPTIONAL field of a SEQUENCE or SET
    pub optional: bool,

    /// Discriminant tag name of a CHOICE alternative
    pub discriminant: Option<String>,

    /// Declaration site
    pub location: Location,
}

/// A SEQUENCE OF or SET OF
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Element type, either inline or a [`Node::MetaMember`]
    pub element: Box<Node>,

    /// SIZE constraint on the number of elements
    pub size: Option<Bounds>,

    /// Declaration site
    pub location: Location,
}

/// Reference to a named type, used for both type aliases and member references
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// The referenced type
    pub target: TypeId,

    /// Constraint applied on top of the referenced type, e.g. `MyInt (0..10)`
    pub bounds: Option<Bounds>,

    /// Declaration site
    pub location: Location,
}

impl Node {
    /// Where this node was declared
    pub fn location(&self) -> Location {
        match self {
            Node::Basic(b) => b.location,
            Node::Enumerated(e) => e.location,
            Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => c.location,
            Node::SequenceOf(c) | Node::SetOf(c) => c.location,
            Node::MetaType(r) | Node::MetaMember(r) => r.location,
        }
    }

    /// Change where this node claims to be declared
    pub(crate) fn set_location(&mut self, location: Location) {
        match self {
            Node::Basic(b) => b.location = location,
            Node::Enumerated(e) => e.location = location,
            Node::Sequence(c) | Node::Set(c) | Node::Choice(c) => c.location = location,
            Node::SequenceOf(c) | Node::SetOf(c) => c.location = location,
            Node::MetaType(r) | Node::MetaMember(r) => r.location = location,
        }
    }

    /// The leaf category implied by the shape of the node alone.  Basic nodes
    /// and references return `None`, their category depends on other tables.
    pub fn structural_category(&self) -> Option<LeafCategory> {
        match self {
            Node::Enumerated(_) => Some(LeafCategory::Enumerated),
            Node::Sequence(_) => Some(LeafCategory::Sequence),
            Node::Set(_) => Some(LeafCategory::Set),
            Node::Choice(_) => Some(LeafCategory::Choice),
            Node::SequenceOf(_) => Some(LeafCategory::SequenceOf),
            Node::SetOf(_) => Some(LeafCategory::SetOf),
            Node::Basic(_) | Node::MetaType(_) | Node::MetaMember(_) => None,
        }
    }

    /// Human readable name of the constructor, for error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Node::Basic(b) => match b.kind {
                BasicKind::Integer => "INTEGER",
                BasicKind::Real => "REAL",
                BasicKind::Boolean => "BOOLEAN",
                BasicKind::OctetString => "OCTET STRING",
                BasicKind::AsciiString => "IA5String",
            },
            Node::Enumerated(_) => "ENUMERATED",
            Node::Sequence(_) => "SEQUENCE",
            Node::Set(_) => "SET",
            Node::Choice(_) => "CHOICE",
            Node::SequenceOf(_) => "SEQUENCE OF",
            Node::SetOf(_) => "SET OF",
            Node::MetaType(_) => "type alias",
            Node::MetaMember(_) => "type reference",
        }
    }
}

impl Bounds {
    /// Are both bounds fixed and equal, e.g. `SIZE(4)`
    pub fn is_fixed(&self) -> bool {
        match *self {
            Bounds::Integer { min, max } => min == max,
            Bounds::Real { min, max } => min == max,
            Bounds::Size { min, max } => min == max,
        }
    }
}
