#![forbid(unsafe_code)]

pub mod analysis;
pub mod ast;
pub mod codegen;
mod compiler;
mod diagnostic;
pub mod mapper;
pub mod symbols;
pub mod xml;

pub use compiler::{AsnCompiler, Features};
pub use diagnostic::{Diagnostic, ErrorKind, Label, Level, Result};
pub use mapper::{RecursiveMapper, Target};
pub use symbols::{LeafCategory, LeafTypes, Names, SourceId, SymbolTable, TypeId};
