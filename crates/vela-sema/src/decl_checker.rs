//! Declaration checking methods

use vela_ast::{EnumDecl, FnDecl, Node, RecordDecl, Span, Stmt, VarDecl};

use crate::checker::{CheckResult, TypeChecker};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::helpers::StoreEffect;
use crate::scope::{ScopeKind, Symbol, SymbolKind};
use crate::types::{match_types, Type};

impl<'a> TypeChecker<'a> {
    /// Declare the types and function signatures of a module body before any
    /// statement in it is checked, so declaration order does not matter
    pub(crate) fn hoist_declarations(&mut self, body: &[Node<Stmt>]) {
        self.pending_records = body
            .iter()
            .filter_map(|stmt| match &stmt.value {
                Stmt::RecordDecl(decl) => Some(decl.name.value.name.clone()),
                _ => None,
            })
            .collect();

        for stmt in body {
            if let Stmt::EnumDecl(decl) = &stmt.value {
                if let Err(err) = self.declare_enum(decl) {
                    self.report(err);
                }
            }
        }
        for stmt in body {
            if let Stmt::RecordDecl(decl) = &stmt.value {
                if let Err(err) = self.declare_record(decl) {
                    self.report(err);
                }
            }
        }
        for stmt in body {
            if let Stmt::FnDecl(decl) = &stmt.value {
                if let Err(err) = self.declare_function(decl) {
                    self.report(err);
                }
            }
        }
    }

    /// `enum E { A, B }` declares the type `E` and the values `E.A`, `E.B`
    pub(crate) fn declare_enum(&mut self, decl: &EnumDecl) -> CheckResult<()> {
        let name = &decl.name.value.name;
        let ty = Type::basic(name.clone());
        let symbol = Symbol::new(name.clone(), ty.clone(), SymbolKind::Type, decl.name.span)
            .public(decl.is_public);
        self.declare(symbol, decl.name.span)?;

        for variant in &decl.variants {
            let symbol = Symbol::variable(
                format!("{}.{}", name, variant.value.name),
                ty.clone(),
                variant.span,
            )
            .public(decl.is_public);
            if let Err(err) = self.declare(symbol, variant.span) {
                self.report(err);
            }
        }
        Ok(())
    }

    pub(crate) fn declare_record(&mut self, decl: &RecordDecl) -> CheckResult<()> {
        let name = &decl.name.value.name;
        self.pending_records.insert(name.clone());

        let mut fields: Vec<(String, Type)> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let ty = self.resolve_type_or_error(&field.ty);
            if fields.iter().any(|(n, _)| *n == field.name.value.name) {
                self.report(Diagnostic::new(
                    DiagnosticKind::DuplicateSymbol,
                    format!("field '{}' is declared twice in record '{}'", field.name.value, name),
                    field.name.span,
                ));
                continue;
            }
            fields.push((field.name.value.name.clone(), ty));
        }

        self.pending_records.remove(name);
        let ty = Type::Record {
            name: name.clone(),
            fields,
        };
        let symbol =
            Symbol::new(name.clone(), ty, SymbolKind::Type, decl.name.span).public(decl.is_public);
        self.declare(symbol, decl.name.span)
    }

    pub(crate) fn declare_function(&mut self, decl: &FnDecl) -> CheckResult<()> {
        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            params.push(self.resolve_type_or_error(&param.ty));
        }
        let return_type = match &decl.return_type {
            Some(ty) => self.resolve_type_or_error(ty),
            None => Type::void(),
        };

        let symbol = Symbol::new(
            decl.name.value.name.clone(),
            Type::Function {
                params,
                return_type: Box::new(return_type),
            },
            SymbolKind::Function,
            decl.name.span,
        )
        .public(decl.is_public)
        .with_ownership(decl.returns_ownership, decl.takes_ownership);
        self.declare(symbol, decl.name.span)
    }

    pub(crate) fn check_fn_decl(&mut self, decl: &FnDecl) -> CheckResult<()> {
        if !self.in_module_scope() {
            self.declare_function(decl)?;
        }
        // externally defined
        let Some(body) = &decl.body else {
            return Ok(());
        };

        // signature problems were reported when it was declared
        let return_type = match &decl.return_type {
            Some(ty) => self.resolve_type(ty).unwrap_or(Type::Error),
            None => Type::void(),
        };

        self.enter_scope(ScopeKind::Function);
        for param in &decl.params {
            let ty = self.resolve_type(&param.ty).unwrap_or(Type::Error);
            let symbol = Symbol::variable(param.name.value.name.clone(), ty, param.name.span)
                .mutable(true);
            if let Err(err) = self.declare(symbol, param.name.span) {
                self.report(err);
            }
        }

        let prev_return_type = self.current_return_type.replace(return_type);
        let prev_returns_ownership =
            std::mem::replace(&mut self.returns_ownership, decl.returns_ownership);

        self.check_stmts(body);

        self.current_return_type = prev_return_type;
        self.returns_ownership = prev_returns_ownership;
        self.exit_scope();
        Ok(())
    }

    pub(crate) fn check_var_decl(&mut self, decl: &VarDecl, _span: &Span) -> CheckResult<()> {
        let name = &decl.name.value.name;
        let init_ty = decl
            .init
            .as_ref()
            .map(|init| self.check_expr(&init.value, &init.span));
        let declared = decl.ty.as_ref().map(|ty| self.resolve_type_or_error(ty));

        let mut mismatch = None;
        let ty = match (declared, init_ty) {
            (Some(declared), Some(init_ty)) => {
                if !declared.is_error()
                    && !init_ty.is_error()
                    && !match_types(&init_ty, &declared).is_match()
                {
                    let span = decl.init.as_ref().map_or(decl.name.span, |init| init.span);
                    mismatch = Some(Diagnostic::new(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "'{}' is declared as '{}' but initialized with '{}'",
                            name, declared, init_ty
                        ),
                        span,
                    ));
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init_ty)) => init_ty,
            (None, None) => {
                self.report(
                    Diagnostic::new(
                        DiagnosticKind::MissingType,
                        format!("cannot infer a type for '{}'", name),
                        decl.name.span,
                    )
                    .with_help("add a type annotation or an initializer"),
                );
                Type::Error
            }
        };

        // `let p = p;` moves from the variable the new one shadows
        let effect = decl
            .init
            .as_ref()
            .map_or(StoreEffect::None, |init| self.store_effect(init));

        let symbol = Symbol::variable(name.clone(), ty, decl.name.span)
            .public(decl.is_public)
            .mutable(decl.is_mutable);
        self.declare(symbol, decl.name.span)?;
        self.track_store(name, effect);

        match mismatch {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
