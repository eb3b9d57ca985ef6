//! Main type checker struct

use std::collections::HashSet;

use log::{debug, trace};
use vela_ast::{ModuleDecl, Node, Program, Span, Stmt};

use crate::config::CheckConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::ownership::OwnershipAnalyzer;
use crate::scope::{ScopeId, ScopeKind, ScopeTable, Symbol, SymbolKind};
use crate::types::Type;

pub(crate) type CheckResult<T> = Result<T, Diagnostic>;

/// Everything a check reports into: the unit being checked, the active
/// options and the diagnostic sink
pub struct CheckContext<'a> {
    pub program: &'a Program,
    pub config: &'a CheckConfig,
    pub sink: &'a mut dyn DiagnosticSink,
}

impl<'a> CheckContext<'a> {
    pub fn new(
        program: &'a Program,
        config: &'a CheckConfig,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self {
            program,
            config,
            sink,
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        debug!("{}: {}", diagnostic.kind, diagnostic.message);
        self.sink.push(diagnostic.in_program(self.program));
    }
}

/// Checks the body of one module against a shared scope table
pub struct TypeChecker<'a> {
    pub(crate) scopes: &'a mut ScopeTable,
    pub(crate) ctx: CheckContext<'a>,
    pub(crate) ownership: OwnershipAnalyzer,
    /// Innermost scope of the statement being checked
    pub(crate) scope: ScopeId,
    /// Declared return type of the function being checked
    pub(crate) current_return_type: Option<Type>,
    /// Whether the function being checked hands its result to the caller
    pub(crate) returns_ownership: bool,
    /// Record names declared in the module but not yet registered
    pub(crate) pending_records: HashSet<String>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(scopes: &'a mut ScopeTable, module_scope: ScopeId, ctx: CheckContext<'a>) -> Self {
        Self {
            scopes,
            ctx,
            ownership: OwnershipAnalyzer::new(),
            scope: module_scope,
            current_return_type: None,
            returns_ownership: false,
            pending_records: HashSet::new(),
        }
    }

    /// Check one module body and, when memory checking is on, report what the
    /// ownership analyzer found. Returns the analyzer for inspection.
    pub fn check_module(mut self, module: &ModuleDecl) -> OwnershipAnalyzer {
        debug!("checking module '{}'", module.name.value);

        self.hoist_declarations(&module.body);
        for stmt in &module.body {
            if matches!(stmt.value, Stmt::Use { .. }) {
                continue;
            }
            if let Err(err) = self.check_stmt(&stmt.value, &stmt.span) {
                self.report(err);
            }
        }

        if self.ctx.config.check_mem {
            for issue in self.ownership.report() {
                self.ctx.report(issue.to_diagnostic());
            }
        }
        self.ownership
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.ctx.report(diagnostic);
    }

    /// Check a statement list, reporting each failing statement and moving on
    pub(crate) fn check_stmts(&mut self, stmts: &[Node<Stmt>]) {
        for stmt in stmts {
            if let Err(err) = self.check_stmt(&stmt.value, &stmt.span) {
                self.report(err);
            }
        }
    }

    pub(crate) fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.create_child_scope(self.scope, kind);
        trace!("enter {:?} scope {} (parent {})", kind, id, self.scope);
        self.scope = id;
        id
    }

    /// Leave the current scope. Variables declared in it go out of scope, so
    /// their allocations pass to a live alias or become unreachable.
    pub(crate) fn exit_scope(&mut self) {
        let ended = self.scope;
        let parent = self.scopes.scope(ended).parent.unwrap_or(ScopeTable::GLOBAL);
        trace!("exit scope {} (back to {})", ended, parent);

        let names: Vec<String> = self
            .scopes
            .symbols_in(ended)
            .iter()
            .filter(|s| s.kind == SymbolKind::Variable)
            .map(|s| s.name.clone())
            .collect();
        let scopes = &*self.scopes;
        for name in &names {
            self.ownership.invalidate(name, ended, |alias, alias_scope| {
                scopes.lookup(parent, alias).map(|symbol| symbol.scope) == Some(alias_scope)
            });
        }
        self.scope = parent;
    }

    /// Add a symbol to the current scope, turning a collision into a
    /// diagnostic at `span`
    pub(crate) fn declare(&mut self, symbol: Symbol, span: Span) -> CheckResult<()> {
        self.scopes
            .add_symbol(self.scope, symbol)
            .map_err(|err| Diagnostic::new(DiagnosticKind::DuplicateSymbol, err.to_string(), span))
    }

    pub(crate) fn in_module_scope(&self) -> bool {
        self.scopes.scope(self.scope).kind == ScopeKind::Module
    }
}
