mod error;

use std::{
    error::Error,
    fmt::Write,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use asn1_typegen::{analysis, AsnCompiler, Diagnostic, SymbolTable};
use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;

use crate::error::{to_error, GrammarCache};

/// Read the XML AST description of ASN.1 grammars, resolve and check every
/// type, and print what a code generator would see
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// XML AST document produced by the ASN.1 compiler
    ast: PathBuf,

    /// XML AST document of the same grammars with every type visible, used
    /// to tell declared types from ones the ASN.1 compiler created
    #[arg(long)]
    unfiltered: Option<PathBuf>,

    /// What to output
    #[arg(long, value_enum, default_value_t = Emit::Summary)]
    emit: Emit,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Allow type and field names that are keywords in a generated language
    #[arg(long)]
    allow_keywords: bool,

    /// Do not require range and SIZE constraints
    #[arg(long)]
    allow_unconstrained: bool,

    /// Increase logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    color: concolor_clap::Color,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    /// Leaf category, alias and status of every type
    Summary,

    /// C printer functions for every declared type
    Printers,

    /// The XML element tree, without any analysis
    Tree,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.apply();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut cache = GrammarCache::new();

    match run(&cli, &mut cache) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Diagnostic>() {
                Some(diag) => report(diag, &mut cache),
                None => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, cache: &mut GrammarCache) -> Result<(), Box<dyn Error>> {
    let mut compiler = load(cli, &cli.ast)?;

    let output = if cli.emit == Emit::Tree {
        compiler.print_tree(0).unwrap_or_default()
    } else {
        compiler.skip_keyword_check = cli.allow_keywords;
        compiler.skip_range_check = cli.allow_unconstrained;

        let mut table = compiler.build()?;
        for warning in &table.warnings {
            report(warning, cache);
        }

        if let Some(path) = &cli.unfiltered {
            let unfiltered = load(cli, path)?.symbols()?;
            table.mark_artificial(&unfiltered);
        }

        match cli.emit {
            Emit::Printers => table.c_printers()?,
            _ => summary(&table)?,
        }
    };

    match &cli.output {
        Some(path) => fs::write(path, output)
            .map_err(|e| format!("unable to write {}: {e}", path.display()))?,
        None => print!("{output}"),
    }

    Ok(())
}

/// Read one XML AST document into a new compiler
fn load(cli: &Cli, path: &Path) -> Result<AsnCompiler, Box<dyn Error>> {
    log::info!("reading {} ({:?} mode)", path.display(), cli.emit);

    let source = fs::read_to_string(path)
        .map_err(|e| format!("unable to read {}: {e}", path.display()))?;

    let mut compiler = AsnCompiler::new();
    compiler.add_file(path.display().to_string(), &source)?;

    Ok(compiler)
}

/// One line per type, grouped by grammar file
fn summary(table: &SymbolTable) -> Result<String, std::fmt::Error> {
    let bad = analysis::bad_types(table, analysis::ascii_strings);
    let mut result = String::new();

    for file in table.file_ids() {
        let Some(source) = table.file(file) else {
            continue;
        };
        writeln!(result, "{}", source.name)?;

        for module in &source.modules {
            writeln!(result, "  module {}", module.name)?;
            for import in &module.imported {
                writeln!(
                    result,
                    "    imports {} from {}",
                    import.types.join(", "),
                    import.name
                )?;
            }
        }

        for &id in table.types_of_file(file) {
            let name = table.names.name(id);
            let category = table
                .leaf_types
                .get(id)
                .map_or("<unknown>", |c| c.as_str());
            write!(result, "  {name}: {category}")?;

            if let Some(target) = table.metatype(name) {
                write!(result, " (alias of {target})")?;
            }
            if table.names.is_artificial(id) {
                write!(result, " [artificial]")?;
            }
            if bad.contains(&id) {
                write!(result, " [bad]")?;
            }
            writeln!(result)?;
        }
    }

    Ok(result)
}

fn report(diag: &Diagnostic, cache: &mut GrammarCache) {
    let printed = to_error(diag, cache).is_some_and(|report| report.eprint(&mut *cache).is_ok());

    if !printed {
        eprintln!("{diag}");
    }
}
