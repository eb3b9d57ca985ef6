//! Expression checking methods

use vela_ast::{BinaryOp, Expr, FieldInit, Ident, Literal, Node, Span, TypeExpr, UnaryOp};

use crate::checker::{CheckResult, TypeChecker};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::helpers::ExprHelpers;
use crate::scope::SymbolKind;
use crate::types::{arithmetic_result, match_types, Type};

impl<'a> TypeChecker<'a> {
    /// Type an expression. A failing expression is reported and types to
    /// [`Type::Error`], which later checks accept silently.
    pub(crate) fn check_expr(&mut self, expr: &Expr, span: &Span) -> Type {
        match self.infer_expr(expr, span) {
            Ok(ty) => ty,
            Err(err) => {
                self.report(err);
                Type::Error
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr, span: &Span) -> CheckResult<Type> {
        match expr {
            Expr::Literal(lit) => Ok(Self::check_literal(lit)),
            Expr::Ident(ident) => self.check_ident(ident, span),
            Expr::Binary { left, op, right } => self.check_binary(left, *op, right, span),
            Expr::Unary { op, expr } => self.check_unary(*op, expr, span),
            Expr::Call { callee, args } => self.check_call(callee, args, span),
            Expr::Member { object, member } => self.check_member(object, member, span),
            Expr::ModuleAccess { module, name } => self.check_module_access(module, name, span),
            Expr::Index { object, index } => self.check_index(object, index, span),
            Expr::Deref(inner) => match self.check_expr(&inner.value, &inner.span) {
                Type::Pointer(Some(pointee)) => Ok(*pointee),
                Type::Error => Ok(Type::Error),
                Type::Pointer(None) => Err(Diagnostic::new(
                    DiagnosticKind::InvalidOperation,
                    "cannot dereference an opaque pointer",
                    *span,
                )
                .with_help("cast it to a typed pointer first")),
                other => Err(Diagnostic::new(
                    DiagnosticKind::InvalidOperation,
                    format!("cannot dereference non-pointer type '{}'", other),
                    *span,
                )),
            },
            Expr::AddrOf(inner) => match self.check_expr(&inner.value, &inner.span) {
                Type::Error => Ok(Type::Error),
                ty => Ok(Type::pointer_to(ty)),
            },
            Expr::Alloc(size) => {
                let size_ty = self.check_expr(&size.value, &size.span);
                if !size_ty.is_error() && !size_ty.is_numeric() {
                    return Err(Diagnostic::new(
                        DiagnosticKind::InvalidOperation,
                        format!("allocation size must be numeric, found '{}'", size_ty),
                        size.span,
                    ));
                }
                Ok(Type::opaque_pointer())
            }
            Expr::Free(operand) => self.check_free(operand, span),
            Expr::Cast { expr, ty } => self.check_cast(expr, ty),
            Expr::SizeOf(_) => Ok(Type::int()),
            Expr::RecordLit { name, fields } => self.check_record_lit(name, fields),
        }
    }

    fn check_literal(lit: &Literal) -> Type {
        match lit {
            Literal::Int(_) => Type::int(),
            Literal::Float(_) => Type::double(),
            Literal::Str(_) => Type::string(),
            Literal::Bool(_) => Type::bool(),
            Literal::Char(_) => Type::char(),
            Literal::Null => Type::opaque_pointer(),
        }
    }

    fn check_ident(&mut self, ident: &Ident, span: &Span) -> CheckResult<Type> {
        let (ty, scope) = self
            .scopes
            .lookup(self.scope, &ident.name)
            .map(|symbol| (symbol.ty.clone(), symbol.scope))
            .ok_or_else(|| undefined_identifier(&ident.name, *span))?;
        self.ownership.track_use(&ident.name, scope, *span);
        Ok(ty)
    }

    fn check_binary(
        &mut self,
        left: &Node<Expr>,
        op: BinaryOp,
        right: &Node<Expr>,
        span: &Span,
    ) -> CheckResult<Type> {
        let left_ty = self.check_expr(&left.value, &left.span);
        let right_ty = self.check_expr(&right.value, &right.span);

        if op.is_arithmetic() {
            if left_ty.is_error() || right_ty.is_error() {
                return Ok(Type::Error);
            }
            if left_ty.is_numeric() && right_ty.is_numeric() {
                return Ok(arithmetic_result(&left_ty, &right_ty));
            }
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                format!(
                    "cannot apply '{}' to '{}' and '{}'",
                    op, left_ty, right_ty
                ),
                *span,
            )
            .with_label("arithmetic needs numeric operands"));
        }

        if op.is_comparison()
            && !left_ty.is_error()
            && !right_ty.is_error()
            && !match_types(&left_ty, &right_ty).is_match()
        {
            return Err(Diagnostic::new(
                DiagnosticKind::TypeMismatch,
                format!("cannot compare '{}' with '{}'", left_ty, right_ty),
                *span,
            ));
        }

        // comparisons and `and`/`or` are boolean regardless of operands
        Ok(Type::bool())
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Node<Expr>, span: &Span) -> CheckResult<Type> {
        let ty = self.check_expr(&operand.value, &operand.span);
        match op {
            UnaryOp::Not => Ok(Type::bool()),
            UnaryOp::Neg if ty.is_numeric() || ty.is_error() => Ok(ty),
            UnaryOp::Neg => Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                format!("cannot negate '{}'", ty),
                *span,
            )),
        }
    }

    fn check_call(
        &mut self,
        callee: &Node<Expr>,
        args: &[Node<Expr>],
        span: &Span,
    ) -> CheckResult<Type> {
        let callee_name = ExprHelpers::describe(&callee.value);
        let (callee_ty, takes_ownership) = match self.callee_symbol(&callee.value) {
            Some(symbol) => (symbol.ty.clone(), symbol.takes_ownership),
            None => (self.check_expr(&callee.value, &callee.span), false),
        };

        let (params, return_type) = match callee_ty {
            Type::Function {
                params,
                return_type,
            } => (params, *return_type),
            Type::Error => {
                for arg in args {
                    self.check_expr(&arg.value, &arg.span);
                }
                return Ok(Type::Error);
            }
            other => {
                return Err(Diagnostic::new(
                    DiagnosticKind::NotCallable,
                    format!("'{}' has type '{}' and cannot be called", callee_name, other),
                    callee.span,
                ));
            }
        };

        // an ownership-taking function releases its first pointer argument
        let released = takes_ownership
            .then(|| params.iter().position(Type::is_pointer).unwrap_or(0));

        let mut arg_types = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let ty = if released == Some(i) {
                self.check_release_operand(arg)
            } else {
                self.check_expr(&arg.value, &arg.span)
            };
            arg_types.push(ty);
        }

        // the callee takes the allocation even when the call is malformed
        if let Some(arg) = released.and_then(|i| args.get(i)) {
            self.track_release_of(&arg.value, arg.span);
        }

        if args.len() != params.len() {
            return Err(Diagnostic::new(
                DiagnosticKind::ArgumentCountError,
                format!(
                    "'{}' expects {} argument(s), found {}",
                    callee_name,
                    params.len(),
                    args.len()
                ),
                *span,
            ));
        }

        let mut mismatches: Vec<Diagnostic> = params
            .iter()
            .zip(&arg_types)
            .enumerate()
            .filter(|(_, (param, arg_ty))| !arg_ty.is_error() && !match_types(arg_ty, param).is_match())
            .map(|(i, (param, arg_ty))| {
                Diagnostic::new(
                    DiagnosticKind::ArgumentTypeError,
                    format!(
                        "argument {} of '{}' has the wrong type: expected '{}', found '{}'",
                        i + 1,
                        callee_name,
                        param,
                        arg_ty
                    ),
                    args[i].span,
                )
            })
            .collect();

        // every bad argument is reported; the last one is returned
        match mismatches.pop() {
            Some(last) => {
                for err in mismatches {
                    self.report(err);
                }
                Err(last)
            }
            None => Ok(return_type),
        }
    }

    /// `base.member`: a flattened `"base.member"` symbol (enum variants), then
    /// a module alias, then a variant of an imported enumeration, then a field
    /// of a record value
    fn check_member(
        &mut self,
        object: &Node<Expr>,
        member: &Node<Ident>,
        span: &Span,
    ) -> CheckResult<Type> {
        if let Expr::Ident(base) = &object.value {
            let flattened = format!("{}.{}", base.name, member.value.name);
            if let Some(symbol) = self.scopes.lookup(self.scope, &flattened) {
                return Ok(symbol.ty.clone());
            }
            match self.scopes.lookup(self.scope, &base.name) {
                None if self.scopes.find_import(self.scope, &base.name).is_some() => {
                    return self.qualified_symbol_type(&base.name, &member.value.name, span);
                }
                // unknown name, or a missing variant of an enumeration
                None => return Err(undefined_identifier(&flattened, *span)),
                Some(symbol) if symbol.kind == SymbolKind::Type => {
                    return Err(undefined_identifier(&flattened, *span));
                }
                Some(_) => {}
            }
        }

        // `geo::Color.Red`: a variant of an enumeration another module declares
        if let Expr::ModuleAccess { module, name } = &object.value {
            let flattened = format!("{}.{}", name.value.name, member.value.name);
            if let Some(symbol) =
                self.scopes
                    .lookup_qualified(self.scope, &module.value.name, &flattened)
            {
                return Ok(symbol.ty.clone());
            }
            let names_type = self
                .scopes
                .lookup_qualified(self.scope, &module.value.name, &name.value.name)
                .is_some_and(|symbol| symbol.kind == SymbolKind::Type);
            if names_type {
                return Err(undefined_identifier(
                    &format!("{}::{}", module.value, flattened),
                    *span,
                ));
            }
        }

        let object_ty = self.check_expr(&object.value, &object.span);
        self.field_type(&object_ty, &member.value.name, span)
    }

    fn field_type(&self, ty: &Type, field: &str, span: &Span) -> CheckResult<Type> {
        let (name, carried) = match ty {
            Type::Record { name, fields } => (name, fields),
            Type::Pointer(Some(inner)) => match inner.as_ref() {
                Type::Record { name, fields } => (name, fields),
                _ => return Err(no_fields(ty, field, *span)),
            },
            Type::Error => return Ok(Type::Error),
            _ => return Err(no_fields(ty, field, *span)),
        };

        self.record_fields(name, carried)
            .into_iter()
            .find(|(n, _)| n == field)
            .map(|(_, ty)| ty)
            .ok_or_else(|| {
                Diagnostic::new(
                    DiagnosticKind::UnknownField,
                    format!("record '{}' has no field '{}'", name, field),
                    *span,
                )
            })
    }

    fn check_module_access(
        &mut self,
        module: &Node<Ident>,
        name: &Node<Ident>,
        span: &Span,
    ) -> CheckResult<Type> {
        self.qualified_symbol_type(&module.value.name, &name.value.name, span)
    }

    fn qualified_symbol_type(&self, alias: &str, name: &str, span: &Span) -> CheckResult<Type> {
        if let Some(symbol) = self.scopes.lookup_qualified(self.scope, alias, name) {
            return Ok(symbol.ty.clone());
        }
        let message = match self.scopes.find_import(self.scope, alias) {
            None => format!("no module is imported as '{}'", alias),
            Some(binding) => format!(
                "module '{}' has no public symbol '{}'",
                binding.module_name, name
            ),
        };
        Err(Diagnostic::new(DiagnosticKind::UndefinedIdentifier, message, *span))
    }

    fn check_index(
        &mut self,
        object: &Node<Expr>,
        index: &Node<Expr>,
        span: &Span,
    ) -> CheckResult<Type> {
        let object_ty = self.check_expr(&object.value, &object.span);
        let index_ty = self.check_expr(&index.value, &index.span);

        if !index_ty.is_error() && !match_types(&index_ty, &Type::int()).is_match() {
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                format!("index must be an integer, found '{}'", index_ty),
                index.span,
            ));
        }

        match object_ty {
            Type::Array { elem, .. } => Ok(*elem),
            Type::Pointer(Some(pointee)) => Ok(*pointee),
            Type::Error => Ok(Type::Error),
            other => Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                format!("type '{}' cannot be indexed", other),
                *span,
            )),
        }
    }

    /// `free(p)`: the operand is released, not read
    fn check_free(&mut self, operand: &Node<Expr>, span: &Span) -> CheckResult<Type> {
        let ty = self.check_release_operand(operand);
        if !ty.is_error() && !ty.is_pointer() && !ty.is_array() {
            return Err(Diagnostic::new(
                DiagnosticKind::InvalidOperation,
                format!("cannot release non-pointer type '{}'", ty),
                operand.span,
            ));
        }

        self.track_release_of(&operand.value, *span);
        Ok(Type::void())
    }

    /// Type an operand that is about to be released without counting it as a
    /// read of the variable
    pub(crate) fn check_release_operand(&mut self, operand: &Node<Expr>) -> Type {
        match &operand.value {
            Expr::Ident(ident) => match self.scopes.lookup(self.scope, &ident.name) {
                Some(symbol) => symbol.ty.clone(),
                None => {
                    self.report(undefined_identifier(&ident.name, operand.span));
                    Type::Error
                }
            },
            Expr::Cast { expr, ty } => {
                self.check_release_operand(expr);
                self.resolve_type_or_error(ty)
            }
            other => self.check_expr(other, &operand.span),
        }
    }

    /// Casts are trusted: the operand is checked, the target type is the result
    fn check_cast(&mut self, expr: &Node<Expr>, ty: &Node<TypeExpr>) -> CheckResult<Type> {
        self.check_expr(&expr.value, &expr.span);
        self.resolve_type(ty)
    }

    fn check_record_lit(&mut self, name: &Node<Ident>, fields: &[FieldInit]) -> CheckResult<Type> {
        let record_ty = match self.scopes.lookup(self.scope, &name.value.name) {
            Some(symbol) if symbol.kind == SymbolKind::Type && matches!(symbol.ty, Type::Record { .. }) => {
                symbol.ty.clone()
            }
            _ => {
                return Err(Diagnostic::new(
                    DiagnosticKind::UndefinedType,
                    format!("undefined record type '{}'", name.value),
                    name.span,
                ));
            }
        };
        let declared = match &record_ty {
            Type::Record { name, fields } => self.record_fields(name, fields),
            _ => Vec::new(),
        };

        for init in fields {
            let value_ty = self.check_expr(&init.value.value, &init.value.span);
            let Some((_, expected)) = declared.iter().find(|(n, _)| *n == init.name.value.name) else {
                self.report(Diagnostic::new(
                    DiagnosticKind::UnknownField,
                    format!("record '{}' has no field '{}'", name.value, init.name.value),
                    init.name.span,
                ));
                continue;
            };
            if !value_ty.is_error() && !match_types(&value_ty, expected).is_match() {
                self.report(Diagnostic::new(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "field '{}' of '{}' expects '{}', found '{}'",
                        init.name.value, name.value, expected, value_ty
                    ),
                    init.value.span,
                ));
            }
        }

        Ok(record_ty)
    }
}

pub(crate) fn undefined_identifier(name: &str, span: Span) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UndefinedIdentifier,
        format!("undefined identifier '{}'", name),
        span,
    )
}

fn no_fields(ty: &Type, field: &str, span: Span) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::InvalidOperation,
        format!("type '{}' has no field '{}'", ty, field),
        span,
    )
}
