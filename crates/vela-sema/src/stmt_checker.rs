//! Statement checking methods

use vela_ast::{Expr, Node, Span, Stmt};

use crate::checker::{CheckResult, TypeChecker};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::expr_checker::undefined_identifier;
use crate::helpers::ExprHelpers;
use crate::scope::ScopeKind;
use crate::types::match_types;

impl<'a> TypeChecker<'a> {
    pub(crate) fn check_stmt(&mut self, stmt: &Stmt, span: &Span) -> CheckResult<()> {
        match stmt {
            // bound by the resolver before any body is checked
            Stmt::Use { .. } => Ok(()),
            Stmt::VarDecl(decl) => self.check_var_decl(decl, span),
            Stmt::FnDecl(decl) => self.check_fn_decl(decl),
            Stmt::RecordDecl(decl) => {
                if self.in_module_scope() {
                    Ok(())
                } else {
                    self.declare_record(decl)
                }
            }
            Stmt::EnumDecl(decl) => {
                if self.in_module_scope() {
                    Ok(())
                } else {
                    self.declare_enum(decl)
                }
            }
            Stmt::Assign { target, value } => self.check_assign(target, value),
            Stmt::Expr(expr) => {
                self.check_expr(&expr.value, &expr.span);
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // conditions are truthy; only their sub-expressions are checked
                self.check_expr(&condition.value, &condition.span);

                let before = self.ownership.snapshot();
                self.check_block(then_branch);
                self.ownership.restore(before);

                if let Some(else_branch) = else_branch {
                    let before = self.ownership.snapshot();
                    self.check_block(else_branch);
                    self.ownership.restore(before);
                }
                Ok(())
            }
            Stmt::While { condition, body } => {
                self.check_expr(&condition.value, &condition.span);
                self.check_block(body);
                Ok(())
            }
            Stmt::Return(value) => self.check_return(value.as_ref(), span),
            Stmt::Block(stmts) => {
                self.check_block(stmts);
                Ok(())
            }
        }
    }

    /// Check statements in a fresh block scope
    pub(crate) fn check_block(&mut self, stmts: &[Node<Stmt>]) {
        self.enter_scope(ScopeKind::Block);
        self.check_stmts(stmts);
        self.exit_scope();
    }

    fn check_assign(&mut self, target: &Node<Expr>, value: &Node<Expr>) -> CheckResult<()> {
        let value_ty = self.check_expr(&value.value, &value.span);

        let target_ty = match &target.value {
            Expr::Ident(ident) => {
                let symbol = self
                    .scopes
                    .lookup(self.scope, &ident.name)
                    .ok_or_else(|| undefined_identifier(&ident.name, target.span))?;
                if !symbol.is_mutable {
                    return Err(Diagnostic::new(
                        DiagnosticKind::ImmutableAssignment,
                        format!("cannot assign twice to immutable '{}'", ident.name),
                        target.span,
                    )
                    .with_help(format!("declare '{}' as mutable", ident.name)));
                }
                symbol.ty.clone()
            }
            Expr::Deref(_) | Expr::Index { .. } | Expr::Member { .. } => {
                self.check_expr(&target.value, &target.span)
            }
            _ => {
                return Err(Diagnostic::new(
                    DiagnosticKind::InvalidOperation,
                    "invalid assignment target",
                    target.span,
                ));
            }
        };

        if !target_ty.is_error()
            && !value_ty.is_error()
            && !match_types(&value_ty, &target_ty).is_match()
        {
            return Err(Diagnostic::new(
                DiagnosticKind::TypeMismatch,
                format!("cannot assign '{}' to a target of type '{}'", value_ty, target_ty),
                value.span,
            ));
        }

        if let Expr::Ident(ident) = &target.value {
            let effect = self.store_effect(value);
            self.track_store(&ident.name, effect);
        }
        Ok(())
    }

    fn check_return(&mut self, value: Option<&Node<Expr>>, span: &Span) -> CheckResult<()> {
        let Some(expected) = self.current_return_type.clone() else {
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                "'return' outside of a function",
                *span,
            ));
        };

        let Some(value) = value else {
            if expected.is_basic_named("void") || expected.is_error() {
                return Ok(());
            }
            return Err(Diagnostic::new(
                DiagnosticKind::TypeMismatch,
                format!("missing return value of type '{}'", expected),
                *span,
            ));
        };

        let found = self.check_expr(&value.value, &value.span);
        if !found.is_error()
            && !expected.is_error()
            && !match_types(&found, &expected).is_match()
        {
            return Err(Diagnostic::new(
                DiagnosticKind::TypeMismatch,
                format!("expected return type '{}', found '{}'", expected, found),
                value.span,
            ));
        }

        if self.returns_ownership {
            let returned = ExprHelpers::place_name(&value.value)
                .and_then(|name| Some((name, self.binding_scope(name)?)));
            if let Some((name, scope)) = returned {
                self.ownership.track_return(name, scope);
            }
        }
        Ok(())
    }
}

