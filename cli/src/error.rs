use std::{collections::HashMap, fmt, fs, ops::Range};

use ariadne::{Config, IndexType, ReportKind};
use asn1_typegen::{Diagnostic, Level};

type Report = ariadne::Report<'static, (String, Range<usize>)>;

/// Helper function to convert type generator diagnostics to a prettier
/// format.  Returns `None` when no label points into a readable grammar file.
pub fn to_error(diag: &Diagnostic, cache: &mut GrammarCache) -> Option<Report> {
    let kind = match diag.level {
        Level::Error => ReportKind::Error,
        Level::Warning => ReportKind::Warning,
    };

    let spans: Vec<_> = diag
        .labels
        .iter()
        .map(|label| {
            let file = label.file.as_ref()?;
            let span = cache.span(file, label.line?)?;
            Some((file.clone(), span))
        })
        .collect();

    let (file, first) = spans.iter().flatten().next()?.clone();

    let mut report = Report::build(kind, file, first.start)
        .with_code(&diag.error_code)
        .with_message(&diag.name)
        .with_config(Config::default().with_index_type(IndexType::Byte));

    let mut note: Option<String> = None;
    for (label, span) in diag.labels.iter().zip(spans) {
        let Some(span) = span else {
            note = Some(match note {
                Some(note) => note + "\n" + &label.message,
                None => label.message.clone(),
            });
            continue;
        };
        report.add_label(ariadne::Label::new(span).with_message(&label.message))
    }

    if let Some(note) = note {
        report.set_note(note);
    }

    Some(report.finish())
}

/// Grammar file cache provider for diagnostics, keyed by file name
#[derive(Default)]
pub struct GrammarCache {
    texts: HashMap<String, Option<String>>,
    sources: HashMap<String, ariadne::Source<String>>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Default::default()
    }

    fn text(&mut self, file: &str) -> Option<&str> {
        self.texts
            .entry(file.to_string())
            .or_insert_with(|| fs::read_to_string(file).ok())
            .as_deref()
    }

    /// Byte range of a 1-based line within a file
    fn span(&mut self, file: &str, line: usize) -> Option<Range<usize>> {
        let text = self.text(file)?;

        let start: usize = text
            .split_inclusive('\n')
            .take(line.checked_sub(1)?)
            .map(str::len)
            .sum();
        if start >= text.len() {
            return None;
        }

        let len = text[start..].find('\n').unwrap_or(text.len() - start);
        Some(start..start + len)
    }
}

impl ariadne::Cache<String> for GrammarCache {
    type Storage = String;

    fn fetch(
        &mut self,
        id: &String,
    ) -> Result<&ariadne::Source<Self::Storage>, Box<dyn fmt::Debug + '_>> {
        let Some(text) = self.text(id).map(str::to_string) else {
            return Err(Box::new(format!("unable to read {id}")));
        };

        Ok(self
            .sources
            .entry(id.clone())
            .or_insert_with(|| ariadne::Source::from(text)))
    }

    fn display<'b>(&self, id: &'b String) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(id))
    }
}
