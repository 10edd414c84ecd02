//! The primary interface to reading, resolving and checking the type AST of a
//! set of ASN.1 grammars.

use std::ops::{Deref, DerefMut};

use crate::{
    analysis::{
        check_reserved_names, collapse_aliases, hoist_anonymous_types, resolve_leaf_types,
        verify_ranges,
    },
    ast::builder::AstBuilder,
    diagnostic::{Diagnostic, Result},
    symbols::SymbolTable,
    xml::Element,
};

/// Store of all XML AST documents describing one generation run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AsnCompiler {
    /// List of all added XML documents.
    sources: Vec<Source>,

    /// The enabled features.
    features: Features,
}

/// All features that can be enabled within the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Features {
    /// Allow type and field names that are keywords in a generated language.
    pub skip_keyword_check: bool,

    /// Do not require range and SIZE constraints on every type.
    pub skip_range_check: bool,
}

/// Information relating to a single XML AST document
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Source {
    /// File name and path.
    pub(crate) file_name: String,

    /// Parsed document
    pub(crate) root: Element,
}

impl AsnCompiler {
    /// Create a new compiler
    pub fn new() -> Self {
        Default::default()
    }

    /// Add an XML AST document.  Only the XML syntax is checked here, the
    /// content is read by [`AsnCompiler::symbols`] and [`AsnCompiler::build`].
    pub fn add_file(&mut self, file_name: String, source: &str) -> Result<usize> {
        let root = Element::parse(source).map_err(|e| Diagnostic::from(e).in_file(&file_name))?;
        let id = self.sources.len();

        self.sources.push(Source { file_name, root });

        Ok(id)
    }

    /// Read every added document into a symbol table, without any analysis.
    /// Aliases are still present and anonymous types are still inline.
    pub fn symbols(&self) -> Result<SymbolTable> {
        let mut table = SymbolTable::new();

        for source in &self.sources {
            AstBuilder::new(&mut table, &source.file_name).load(&source.root)?;
        }

        log::info!(
            "read {} types from {} grammar files",
            table.names.len(),
            table.files.len()
        );

        Ok(table)
    }

    /// Read every added document and run the full analysis, producing the
    /// symbol table backends consume
    pub fn build(&self) -> Result<SymbolTable> {
        let mut table = self.symbols()?;

        resolve_leaf_types(&mut table)?;
        log::info!("resolved leaf types of {} types", table.leaf_types.len());

        let hoisted = hoist_anonymous_types(&mut table);
        log::info!("hoisted {} anonymous types", hoisted.len());

        collapse_aliases(&mut table)?;
        log::info!("collapsed {} aliases", table.metatypes.len());

        if !self.skip_keyword_check {
            check_reserved_names(&table)?;
        }

        if !self.skip_range_check {
            let ids = table
                .names
                .defined()
                .map(|(id, _, _)| id)
                .collect::<Vec<_>>();
            for id in ids {
                verify_ranges(&table, id)?;
            }
        }

        Ok(table)
    }

    /// Convert the XML element tree of a document into a string
    pub fn print_tree(&self, id: usize) -> Option<String> {
        Some(self.sources.get(id)?.root.to_string())
    }
}

impl Deref for AsnCompiler {
    type Target = Features;

    fn deref(&self) -> &Self::Target {
        &self.features
    }
}

impl DerefMut for AsnCompiler {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.features
    }
}
