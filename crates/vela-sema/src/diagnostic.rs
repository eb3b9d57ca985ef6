//! Diagnostic records and the sink they are pushed to

use std::fmt;
use vela_ast::{Program, Span};

/// Diagnostic categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MemoryLeak,
    DoubleFree,
    UseAfterFree,
    UndefinedIdentifier,
    UndefinedType,
    DuplicateSymbol,
    DuplicateModule,
    TypeMismatch,
    ArgumentTypeError,
    ArgumentCountError,
    MissingType,
    InvalidOperation,
    NotCallable,
    UnknownField,
    ImmutableAssignment,
    UnresolvedModule,
    CircularDependency,
}

impl DiagnosticKind {
    /// Category string reported as `error_type`
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MemoryLeak => "Memory Leak",
            DiagnosticKind::DoubleFree => "Double Free",
            DiagnosticKind::UseAfterFree => "Use After Free",
            DiagnosticKind::UndefinedIdentifier => "Undefined Identifier",
            DiagnosticKind::UndefinedType => "Undefined Type",
            DiagnosticKind::DuplicateSymbol => "Duplicate Symbol",
            DiagnosticKind::DuplicateModule => "Duplicate Module",
            DiagnosticKind::TypeMismatch => "Type Mismatch",
            DiagnosticKind::ArgumentTypeError => "Argument Type Error",
            DiagnosticKind::ArgumentCountError => "Argument Count Error",
            DiagnosticKind::MissingType => "Missing Type",
            DiagnosticKind::InvalidOperation => "Invalid Operation",
            DiagnosticKind::NotCallable => "Not Callable",
            DiagnosticKind::UnknownField => "Unknown Field",
            DiagnosticKind::ImmutableAssignment => "Immutable Assignment",
            DiagnosticKind::UnresolvedModule => "Unresolved Module",
            DiagnosticKind::CircularDependency => "Circular Module Dependency",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single reported problem with its source context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub token_length: u32,
    pub label: Option<String>,
    pub note: Option<String>,
    pub help: Option<String>,
    pub source_line_text: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: String::new(),
            line: span.line,
            column: span.column,
            token_length: span.len.max(1),
            label: None,
            note: None,
            help: None,
            source_line_text: String::new(),
        }
    }

    /// Category string, e.g. "Memory Leak"
    pub fn error_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Attach the file path and quoted source line of the unit it came from
    pub fn in_program(mut self, program: &Program) -> Self {
        self.file_path = program.path.clone();
        self.source_line_text = program.line_text(self.line).unwrap_or_default().to_string();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file_path, self.line, self.column, self.kind, self.message
        )
    }
}

/// Destination for diagnostics produced by a check
pub trait DiagnosticSink {
    fn push(&mut self, diagnostic: Diagnostic);
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Option<&Diagnostic>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory diagnostic sink
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics of one category
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| d.kind == kind).collect()
    }
}

impl DiagnosticSink for Diagnostics {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.items.get(index)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
