//! Module system definitions for the AST

use super::*;
use crate::stmt::Stmt;

/// A compilation unit: one source file holding one or more modules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub path: String,
    /// Source text the tree was parsed from, used to quote lines in diagnostics
    #[serde(default)]
    pub source: String,
    pub modules: Vec<Node<ModuleDecl>>,
}

impl Program {
    /// Text of the given 1-based source line, without its line terminator
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.source
            .lines()
            .nth(line as usize - 1)
    }
}

/// Module declaration (`module geo { ... }`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: Node<Ident>,
    pub body: Vec<Node<Stmt>>,
}

impl ModuleDecl {
    /// `use` directives of this module as (module, alias), in order of
    /// appearance
    pub fn imports(&self) -> impl Iterator<Item = (&Node<Ident>, Option<&Node<Ident>>)> {
        self.body.iter().filter_map(|stmt| match &stmt.value {
            Stmt::Use { module, alias } => Some((module, alias.as_ref())),
            _ => None,
        })
    }
}
