//! Terminal rendering of diagnostics

use std::collections::HashMap;
use std::io::{self, Write};
use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use vela_sema::{Diagnostic, DiagnosticKind};

/// Stable code printed with each diagnostic category
pub fn error_code(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::MemoryLeak => "E0101",
        DiagnosticKind::DoubleFree => "E0102",
        DiagnosticKind::UseAfterFree => "E0103",
        DiagnosticKind::UndefinedIdentifier => "E0201",
        DiagnosticKind::UndefinedType => "E0202",
        DiagnosticKind::DuplicateSymbol => "E0203",
        DiagnosticKind::DuplicateModule => "E0204",
        DiagnosticKind::UnknownField => "E0205",
        DiagnosticKind::TypeMismatch => "E0301",
        DiagnosticKind::ArgumentTypeError => "E0302",
        DiagnosticKind::ArgumentCountError => "E0303",
        DiagnosticKind::MissingType => "E0304",
        DiagnosticKind::InvalidOperation => "E0305",
        DiagnosticKind::NotCallable => "E0306",
        DiagnosticKind::ImmutableAssignment => "E0307",
        DiagnosticKind::UnresolvedModule => "E0401",
        DiagnosticKind::CircularDependency => "E0402",
    }
}

/// Source text of every unit taking part in a check, by path
#[derive(Debug, Default)]
pub struct SourceCache {
    sources: HashMap<String, String>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }

    /// Source of `path`, if it was recorded and is not empty
    pub fn get(&self, path: &str) -> Option<&str> {
        self.sources
            .get(path)
            .map(String::as_str)
            .filter(|source| !source.is_empty())
    }
}

/// Char range of the diagnostic's token within `source`
fn char_range(source: &str, line: u32, column: u32, len: u32) -> Range<usize> {
    let total = source.chars().count();
    let mut start = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        let width = text.trim_end_matches(['\n', '\r']).chars().count();
        if i + 1 == line as usize {
            start += (column.saturating_sub(1) as usize).min(width);
            break;
        }
        start += text.chars().count();
    }
    let start = start.min(total);
    let end = (start + len.max(1) as usize).min(total).max(start);
    start..end
}

pub fn build_report(
    diag: &Diagnostic,
    source: &str,
    color: bool,
) -> Report<'static, (String, Range<usize>)> {
    let span = (
        diag.file_path.clone(),
        char_range(source, diag.line, diag.column, diag.token_length),
    );
    let label = diag.label.clone().unwrap_or_else(|| diag.message.clone());

    let mut report = Report::build(ReportKind::Error, span.clone())
        .with_config(Config::default().with_color(color))
        .with_code(error_code(diag.kind))
        .with_message(format!("{}: {}", diag.kind, diag.message))
        .with_label(Label::new(span).with_message(label).with_color(Color::Red));
    if let Some(note) = &diag.note {
        report = report.with_note(note);
    }
    if let Some(help) = &diag.help {
        report = report.with_help(help);
    }
    report.finish()
}

/// Write one diagnostic to `out`. Diagnostics whose unit has no recorded
/// source fall back to a single line plus the quoted source line.
pub fn write_diagnostic<W: Write>(
    diag: &Diagnostic,
    sources: &SourceCache,
    color: bool,
    mut out: W,
) -> io::Result<()> {
    match sources.get(&diag.file_path) {
        Some(source) => build_report(diag, source, color)
            .write((diag.file_path.clone(), Source::from(source)), out),
        None => {
            writeln!(out, "error[{}]: {}", error_code(diag.kind), diag)?;
            if !diag.source_line_text.is_empty() {
                writeln!(out, "  | {}", diag.source_line_text)?;
            }
            Ok(())
        }
    }
}

pub fn print_diagnostic(diag: &Diagnostic, sources: &SourceCache, color: bool) -> io::Result<()> {
    write_diagnostic(diag, sources, color, io::stderr().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_ast::Span;

    fn leak() -> Diagnostic {
        let mut diag = Diagnostic::new(
            DiagnosticKind::MemoryLeak,
            "memory allocated to 'p' is never freed",
            Span::new(2, 17, 5),
        )
        .with_help("free 'p' before the end of the module");
        diag.file_path = "main.vl".to_string();
        diag.source_line_text = "  let p: int* = alloc(8);".to_string();
        diag
    }

    #[test]
    fn test_char_range() {
        let source = "module main {\n  let p: int* = alloc(8);\n}\n";
        let range = char_range(source, 2, 17, 5);
        let text: String = source.chars().skip(range.start).take(range.len()).collect();
        assert_eq!(text, "alloc");

        // past the end of the line and of the source
        assert_eq!(char_range(source, 1, 99, 1), 13..14);
        assert_eq!(char_range("ab", 7, 1, 3), 2..2);
    }

    #[test]
    fn test_rendered_report() {
        let mut sources = SourceCache::new();
        sources.insert("main.vl", "module main {\n  let p: int* = alloc(8);\n}\n");

        let mut out = Vec::new();
        write_diagnostic(&leak(), &sources, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("E0101"));
        assert!(text.contains("Memory Leak: memory allocated to 'p' is never freed"));
        assert!(text.contains("free 'p' before the end of the module"));
        assert!(text.contains("main.vl"));
    }

    #[test]
    fn test_fallback_without_source() {
        let mut out = Vec::new();
        write_diagnostic(&leak(), &SourceCache::new(), false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("error[E0101]: main.vl:2:17: Memory Leak:"));
        assert!(text.contains("  | ") && text.contains("alloc(8)"));
    }
}
