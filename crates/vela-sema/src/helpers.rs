//! Helper methods for type checking

use log::debug;
use vela_ast::{Expr, Literal, Node, Span, TypeExpr};

use crate::checker::{CheckResult, TypeChecker};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::scope::{ScopeId, Symbol, SymbolKind};
use crate::types::{is_builtin, ArraySize, ExprId, Type};

/// Ownership effect of storing a value, resolved before the target of a
/// declaration is added to its scope
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreEffect {
    /// The value is a fresh allocation made at this site
    Allocation(Span),
    /// The value is the variable declared in the given scope
    Alias(String, ScopeId),
    None,
}

/// Syntax-only queries over expressions
pub struct ExprHelpers;

impl ExprHelpers {
    /// Variable an expression names, looking through casts. Release and alias
    /// events only apply to these.
    pub fn place_name(expr: &Expr) -> Option<&str> {
        match expr {
            Expr::Ident(ident) => Some(&ident.name),
            Expr::Cast { expr, .. } => Self::place_name(&expr.value),
            _ => None,
        }
    }

    /// Readable name of a callee for messages
    pub fn describe(expr: &Expr) -> String {
        match expr {
            Expr::Ident(ident) => ident.name.clone(),
            Expr::ModuleAccess { module, name } => format!("{}::{}", module.value, name.value),
            Expr::Member { object, member } => {
                format!("{}.{}", Self::describe(&object.value), member.value)
            }
            _ => "expression".to_string(),
        }
    }
}

impl<'a> TypeChecker<'a> {
    /// Convert a written type into a checker type
    pub(crate) fn resolve_type(&mut self, ty: &Node<TypeExpr>) -> CheckResult<Type> {
        match &ty.value {
            TypeExpr::Named(name) => {
                if is_builtin(name) {
                    return Ok(Type::basic(name.clone()));
                }
                match self.scopes.lookup(self.scope, name) {
                    Some(symbol) if symbol.kind == SymbolKind::Type => Ok(symbol.ty.clone()),
                    // forward or self reference to a record of this module
                    _ if self.pending_records.contains(name) => Ok(Type::Record {
                        name: name.clone(),
                        fields: Vec::new(),
                    }),
                    _ => Err(Diagnostic::new(
                        DiagnosticKind::UndefinedType,
                        format!("undefined type '{}'", name),
                        ty.span,
                    )),
                }
            }
            TypeExpr::Qualified { module, name } => {
                match self
                    .scopes
                    .lookup_qualified(self.scope, &module.value.name, &name.value.name)
                {
                    Some(symbol) if symbol.kind == SymbolKind::Type => Ok(symbol.ty.clone()),
                    _ => Err(Diagnostic::new(
                        DiagnosticKind::UndefinedType,
                        format!("undefined type '{}::{}'", module.value, name.value),
                        ty.span,
                    )),
                }
            }
            TypeExpr::Pointer(inner) => {
                if matches!(&inner.value, TypeExpr::Named(n) if n == "void") {
                    return Ok(Type::opaque_pointer());
                }
                Ok(Type::pointer_to(self.resolve_type(inner)?))
            }
            TypeExpr::Array { elem, size } => {
                let elem = self.resolve_type(elem)?;
                let size = match size {
                    None => None,
                    Some(expr) => match &expr.value {
                        Expr::Literal(Literal::Int(n)) => Some(ArraySize::Literal(*n)),
                        _ => {
                            self.check_expr(&expr.value, &expr.span);
                            Some(ArraySize::Expr(ExprId::of(&**expr)))
                        }
                    },
                };
                Ok(Type::Array {
                    elem: Box::new(elem),
                    size,
                })
            }
            TypeExpr::Function {
                params,
                return_type,
            } => {
                let mut param_types = Vec::with_capacity(params.len());
                for param in params {
                    param_types.push(self.resolve_type(param)?);
                }
                Ok(Type::Function {
                    params: param_types,
                    return_type: Box::new(self.resolve_type(return_type)?),
                })
            }
        }
    }

    /// Resolve a type, reporting failure and standing in the error type
    pub(crate) fn resolve_type_or_error(&mut self, ty: &Node<TypeExpr>) -> Type {
        match self.resolve_type(ty) {
            Ok(ty) => ty,
            Err(err) => {
                self.report(err);
                Type::Error
            }
        }
    }

    /// Symbol a callee expression names, without reporting anything
    pub(crate) fn callee_symbol(&self, callee: &Expr) -> Option<&Symbol> {
        match callee {
            Expr::Ident(ident) => self.scopes.lookup(self.scope, &ident.name),
            Expr::ModuleAccess { module, name } => {
                self.scopes
                    .lookup_qualified(self.scope, &module.value.name, &name.value.name)
            }
            Expr::Member { object, member } => match &object.value {
                Expr::Ident(base) => self
                    .scopes
                    .lookup(self.scope, &format!("{}.{}", base.name, member.value.name))
                    .or_else(|| {
                        self.scopes
                            .lookup_qualified(self.scope, &base.name, &member.value.name)
                    }),
                Expr::ModuleAccess { module, name } => self.scopes.lookup_qualified(
                    self.scope,
                    &module.value.name,
                    &format!("{}.{}", name.value.name, member.value.name),
                ),
                _ => None,
            },
            _ => None,
        }
    }

    /// Where the value of `expr` was allocated, if it is a fresh allocation.
    /// Looks through casts and binary operands only.
    pub(crate) fn allocation_site(&self, expr: &Node<Expr>) -> Option<Span> {
        match &expr.value {
            Expr::Alloc(_) => Some(expr.span),
            Expr::Call { callee, .. } => self
                .callee_symbol(&callee.value)
                .filter(|symbol| symbol.returns_ownership)
                .map(|_| expr.span),
            Expr::Cast { expr: inner, .. } => self.allocation_site(inner),
            Expr::Binary { left, right, .. } => self
                .allocation_site(left)
                .or_else(|| self.allocation_site(right)),
            _ => None,
        }
    }

    /// Fields of record `name`, preferring the registered declaration over
    /// the (possibly placeholder) fields a type carries
    pub(crate) fn record_fields(&self, name: &str, carried: &[(String, Type)]) -> Vec<(String, Type)> {
        match self.scopes.lookup(self.scope, name) {
            Some(Symbol {
                kind: SymbolKind::Type,
                ty: Type::Record { fields, .. },
                ..
            }) => fields.clone(),
            _ => carried.to_vec(),
        }
    }

    /// Scope declaring the variable `name` resolves to from the current scope
    pub(crate) fn binding_scope(&self, name: &str) -> Option<ScopeId> {
        self.scopes.lookup(self.scope, name).map(|symbol| symbol.scope)
    }

    pub(crate) fn store_effect(&self, value: &Node<Expr>) -> StoreEffect {
        if let Some(site) = self.allocation_site(value) {
            return StoreEffect::Allocation(site);
        }
        ExprHelpers::place_name(&value.value)
            .and_then(|name| Some(StoreEffect::Alias(name.to_string(), self.binding_scope(name)?)))
            .unwrap_or(StoreEffect::None)
    }

    /// Record an allocation or ownership move caused by storing a value into
    /// the variable `target`
    pub(crate) fn track_store(&mut self, target: &str, effect: StoreEffect) {
        let Some(scope) = self.binding_scope(target) else {
            return;
        };
        match effect {
            StoreEffect::Allocation(site) => self.ownership.track_allocation(site, target, scope),
            StoreEffect::Alias(source, source_scope) => {
                self.ownership.track_alias(target, scope, &source, source_scope)
            }
            StoreEffect::None => {}
        }
    }

    /// Record the release of the variable `operand` names, if it names one
    pub(crate) fn track_release_of(&mut self, operand: &Expr, site: Span) {
        let target = ExprHelpers::place_name(operand)
            .and_then(|name| Some((name, self.binding_scope(name)?)));
        match target {
            Some((name, scope)) => {
                self.ownership.track_release(name, scope, site);
            }
            None => debug!("release of a non-variable expression at {} is not tracked", site),
        }
    }
}
