//! # Vela AST
//!
//! Syntax tree definitions for the Vela compiler. Trees are produced by the
//! parser and consumed by semantic analysis; every node carries the line and
//! column it was parsed from.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Source location information (1-based line and column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    /// Length of the token the node starts with
    #[serde(default)]
    pub len: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, len: u32) -> Self {
        Self { line, column, len }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<T> {
    #[serde(default)]
    pub span: Span,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod types;
pub mod expr;
pub mod stmt;
pub mod module;

pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use module::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 14, 2).to_string(), "3:14");
    }

    #[test]
    fn test_program_from_json() {
        let json = r#"{
            "path": "main.vl",
            "source": "module main {\n  let x: int = 1;\n}\n",
            "modules": [{
                "span": { "line": 1, "column": 1, "len": 6 },
                "value": {
                    "name": { "value": "main" },
                    "body": [{
                        "span": { "line": 2, "column": 3, "len": 3 },
                        "value": { "VarDecl": {
                            "name": { "value": "x" },
                            "ty": { "value": { "Named": "int" } },
                            "init": { "value": { "Literal": { "Int": 1 } } }
                        } }
                    }]
                }
            }]
        }"#;

        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.modules.len(), 1);
        let module = &program.modules[0].value;
        assert_eq!(module.name.value.name, "main");
        match &module.body[0].value {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.name.value.name, "x");
                assert!(!decl.is_public);
                assert!(decl.is_mutable);
            }
            other => panic!("expected VarDecl, got {:?}", other),
        }
        assert_eq!(program.line_text(2), Some("  let x: int = 1;"));
    }

    #[test]
    fn test_module_imports() {
        let json = r#"{
            "name": { "value": "main" },
            "body": [
                { "value": { "Use": { "module": { "value": "geo" } } } },
                { "value": { "Expr": { "value": { "Literal": { "Int": 1 } } } } },
                { "value": { "Use": {
                    "module": { "value": "io" },
                    "alias": { "value": "out" }
                } } }
            ]
        }"#;

        let module: ModuleDecl = serde_json::from_str(json).unwrap();
        let imports: Vec<(&str, Option<&str>)> = module
            .imports()
            .map(|(m, alias)| (m.value.name.as_str(), alias.map(|a| a.value.name.as_str())))
            .collect();
        assert_eq!(imports, vec![("geo", None), ("io", Some("out"))]);
    }
}
