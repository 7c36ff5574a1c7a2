//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use indexmap::IndexMap;

use super::Diagnostics;
use super::message::{DiagnosticMessage, Severity};

/// Builder for rendering diagnostics with various options.
///
/// Diagnostics whose file has a registered source are rendered as annotated snippets;
/// the rest fall back to one `severity: file:line: message` line each.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    sources: IndexMap<&'s str, &'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            sources: IndexMap::new(),
            colored: false,
        }
    }

    /// Register the text of an IDL file so its diagnostics get snippets.
    pub fn source(mut self, file: &'s str, text: &'s str) -> Self {
        self.sources.insert(file, text);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            let snippet_source = self
                .sources
                .get(diag.location.file.as_str())
                .and_then(|text| line_range(text, diag.location.line).map(|r| (*text, r)));
            match snippet_source {
                Some((text, range)) => self.format_snippet(w, &renderer, diag, text, range)?,
                None => write!(w, "{}", diag)?,
            }
        }

        Ok(())
    }

    fn format_snippet(
        &self,
        w: &mut impl Write,
        renderer: &Renderer,
        diag: &DiagnosticMessage,
        text: &str,
        range: Range<usize>,
    ) -> std::fmt::Result {
        let mut snippet = Snippet::source(text)
            .line_start(1)
            .path(diag.location.file.as_str())
            .annotation(AnnotationKind::Primary.span(range).label(&diag.message));

        for related in &diag.related {
            if related.location.file != diag.location.file {
                continue;
            }
            if let Some(range) = line_range(text, related.location.line) {
                snippet = snippet.annotation(
                    AnnotationKind::Context
                        .span(range)
                        .label(&related.message),
                );
            }
        }

        let level = severity_to_level(diag.severity());
        let report: Vec<Group> = vec![level.primary_title(&diag.message).element(snippet)];
        write!(w, "{}", renderer.render(&report))
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

/// Byte range of a 1-based line, without its terminator.
fn line_range(text: &str, line: u32) -> Option<Range<usize>> {
    if line == 0 {
        return None;
    }
    let mut start = 0;
    for (index, segment) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line as usize {
            let content = segment.trim_end_matches(['\n', '\r']);
            let end = start + content.len().max(1).min(segment.len());
            return Some(start..end);
        }
        start += segment.len();
    }
    None
}
