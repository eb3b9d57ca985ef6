//! # Vela Semantic Analysis
//!
//! Type checking, module resolution and static ownership analysis for Vela
//! programs. A check takes a parsed [`Program`], resolves its modules in
//! dependency order, type checks every module body and reports leaks and
//! double releases found by the ownership analyzer. Problems are pushed to a
//! [`DiagnosticSink`]; the check itself never stops at the first one.

mod types;
mod diagnostic;
mod config;
mod scope;
mod ownership;
mod helpers;
mod checker;
mod decl_checker;
mod stmt_checker;
mod expr_checker;
mod dep_graph;
mod resolver;

// Re-export public API
pub use types::{arithmetic_result, is_builtin, match_types, ArraySize, ExprId, Type, TypeMatch, BUILTIN_TYPES};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics};
pub use config::CheckConfig;
pub use scope::{ImportBinding, Scope, ScopeError, ScopeId, ScopeKind, ScopeTable, Symbol, SymbolKind};
pub use ownership::{AllocationRecord, OwnershipAnalyzer, OwnershipIssue, ReleaseOutcome, Snapshot};
pub use checker::{CheckContext, TypeChecker};
pub use dep_graph::{CheckOrder, CycleEdge, DepGraph, Dependency, ModuleNode};
pub use resolver::{ModuleLoader, ModuleResolver, NoLoader};

use vela_ast::Program;

// =============================================================================
// Public API
// =============================================================================

/// Check a single compilation unit. Returns true when no diagnostic was
/// reported.
pub fn check_program(
    program: &Program,
    config: &CheckConfig,
    sink: &mut dyn DiagnosticSink,
) -> bool {
    check_program_with_loader(program, config, sink, &mut NoLoader)
}

/// Check a compilation unit, asking `loader` for modules it imports but does
/// not declare
pub fn check_program_with_loader(
    program: &Program,
    config: &CheckConfig,
    sink: &mut dyn DiagnosticSink,
    loader: &mut dyn ModuleLoader,
) -> bool {
    ModuleResolver::new(config, sink, loader).resolve(program)
}

// =============================================================================
// Tests
// =============================================================================
