//! Scope tree and symbol table

use std::collections::HashMap;
use thiserror::Error;
use vela_ast::Span;

use crate::types::Type;

/// Index of a scope in its [`ScopeTable`]
pub type ScopeId = usize;

/// Errors raised while registering names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("'{0}' is already declared in this scope")]
    DuplicateSymbol(String),
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Root of the tree; parent of every module scope
    Global,
    Module,
    Function,
    Block,
}

/// What a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    /// Record or enumeration type name
    Type,
}

/// A named, typed binding
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    pub is_public: bool,
    pub is_mutable: bool,
    pub returns_ownership: bool,
    pub takes_ownership: bool,
    pub span: Span,
    /// Filled in when the symbol is added to a scope
    pub scope: ScopeId,
    pub depth: usize,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type, kind: SymbolKind, span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            is_public: false,
            is_mutable: false,
            returns_ownership: false,
            takes_ownership: false,
            span,
            scope: 0,
            depth: 0,
        }
    }

    pub fn variable(name: impl Into<String>, ty: Type, span: Span) -> Self {
        Self::new(name, ty, SymbolKind::Variable, span)
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn mutable(mut self, is_mutable: bool) -> Self {
        self.is_mutable = is_mutable;
        self
    }

    pub fn with_ownership(mut self, returns_ownership: bool, takes_ownership: bool) -> Self {
        self.returns_ownership = returns_ownership;
        self.takes_ownership = takes_ownership;
        self
    }
}

/// An import recorded on the importing scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub module_name: String,
    pub alias: Option<String>,
    pub target: ScopeId,
}

impl ImportBinding {
    /// Name the importing module refers to the target by
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.module_name)
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: Vec<Symbol>,
    pub kind: ScopeKind,
    pub module_name: Option<String>,
    pub imports: Vec<ImportBinding>,
    pub depth: usize,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind, depth: usize) -> Self {
        Self {
            parent,
            children: Vec::new(),
            symbols: Vec::new(),
            kind,
            module_name: None,
            imports: Vec::new(),
            depth,
        }
    }

    /// Look up a symbol declared directly in this scope
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

/// All scopes of one compilation unit, plus the module namespace
#[derive(Debug, Clone)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    modules: HashMap<String, ScopeId>,
}

impl ScopeTable {
    pub const GLOBAL: ScopeId = 0;

    /// Table holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, ScopeKind::Global, 0)],
            modules: HashMap::new(),
        }
    }

    /// Scope by id. Ids come from this table, so indexing does not fail.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Open a scope nested in `parent` and return its id
    pub fn create_child_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.len();
        let depth = self.scopes[parent].depth + 1;
        self.scopes.push(Scope::new(Some(parent), kind, depth));
        self.scopes[parent].children.push(id);
        id
    }

    /// Create a module scope and register it in the module namespace
    pub fn register_module(&mut self, name: &str) -> Result<ScopeId, ScopeError> {
        if self.modules.contains_key(name) {
            return Err(ScopeError::DuplicateModule(name.to_string()));
        }
        let id = self.create_child_scope(Self::GLOBAL, ScopeKind::Module);
        self.scopes[id].module_name = Some(name.to_string());
        self.modules.insert(name.to_string(), id);
        Ok(id)
    }

    /// Scope of a registered module
    pub fn module(&self, name: &str) -> Option<ScopeId> {
        self.modules.get(name).copied()
    }

    /// Declare `symbol` in `scope`, stamping it with the scope and depth.
    /// Fails if the scope already declares the name.
    pub fn add_symbol(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<(), ScopeError> {
        let target = &mut self.scopes[scope];
        if target.get(&symbol.name).is_some() {
            return Err(ScopeError::DuplicateSymbol(symbol.name));
        }
        symbol.scope = scope;
        symbol.depth = target.depth;
        target.symbols.push(symbol);
        Ok(())
    }

    /// Find `name` in `scope` or the nearest enclosing scope declaring it
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if let Some(symbol) = s.get(name) {
                return Some(symbol);
            }
            current = s.parent;
        }
        None
    }

    /// Like [`lookup`](Self::lookup), but a private symbol is only visible to
    /// its own module
    pub fn lookup_with_visibility(
        &self,
        scope: ScopeId,
        name: &str,
        requesting_module: Option<ScopeId>,
    ) -> Option<&Symbol> {
        let symbol = self.lookup(scope, name)?;
        if symbol.is_public || self.enclosing_module(symbol.scope) == requesting_module {
            Some(symbol)
        } else {
            None
        }
    }

    /// Nearest module scope at or above `scope`
    pub fn enclosing_module(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if s.kind == ScopeKind::Module {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    /// Name of the module `scope` belongs to
    pub fn module_name(&self, scope: ScopeId) -> Option<&str> {
        self.enclosing_module(scope)
            .and_then(|id| self.scopes[id].module_name.as_deref())
    }

    pub fn add_import(&mut self, scope: ScopeId, binding: ImportBinding) {
        self.scopes[scope].imports.push(binding);
    }

    /// Find the import bound to `local_name` along the scope chain
    pub fn find_import(&self, scope: ScopeId, local_name: &str) -> Option<&ImportBinding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if let Some(binding) = s.imports.iter().find(|b| b.local_name() == local_name) {
                return Some(binding);
            }
            current = s.parent;
        }
        None
    }

    /// Resolve `alias::name` as seen from `scope`
    pub fn lookup_qualified(&self, scope: ScopeId, alias: &str, name: &str) -> Option<&Symbol> {
        let binding = self.find_import(scope, alias)?;
        self.lookup_with_visibility(binding.target, name, self.enclosing_module(scope))
    }

    pub fn symbols_in(&self, scope: ScopeId) -> &[Symbol] {
        &self.scopes[scope].symbols
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Symbol {
        Symbol::variable(name, Type::int(), Span::default())
    }

    #[test]
    fn test_duplicate_symbol_in_one_scope() {
        let mut table = ScopeTable::new();
        let m = table.register_module("main").unwrap();
        assert!(table.add_symbol(m, var("x")).is_ok());
        assert_eq!(
            table.add_symbol(m, var("x")),
            Err(ScopeError::DuplicateSymbol("x".to_string()))
        );
    }

    #[test]
    fn test_shadowing_across_levels() {
        let mut table = ScopeTable::new();
        let m = table.register_module("main").unwrap();
        table.add_symbol(m, var("x")).unwrap();
        let block = table.create_child_scope(m, ScopeKind::Block);
        let shadow = Symbol::variable("x", Type::float(), Span::default());
        assert!(table.add_symbol(block, shadow).is_ok());

        assert_eq!(table.lookup(block, "x").unwrap().ty, Type::float());
        assert_eq!(table.lookup(m, "x").unwrap().ty, Type::int());
        assert_eq!(table.lookup(block, "x").unwrap().depth, 2);
        assert_eq!(table.scope(m).children, vec![block]);
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut table = ScopeTable::new();
        let m = table.register_module("main").unwrap();
        table.add_symbol(m, var("outer")).unwrap();
        let f = table.create_child_scope(m, ScopeKind::Function);
        let b = table.create_child_scope(f, ScopeKind::Block);
        assert!(table.lookup(b, "outer").is_some());
        assert!(table.lookup(b, "missing").is_none());
        assert_eq!(table.enclosing_module(b), Some(m));
        assert_eq!(table.module_name(b), Some("main"));
    }

    #[test]
    fn test_duplicate_module() {
        let mut table = ScopeTable::new();
        table.register_module("geo").unwrap();
        assert_eq!(
            table.register_module("geo"),
            Err(ScopeError::DuplicateModule("geo".to_string()))
        );
    }

    #[test]
    fn test_visibility() {
        let mut table = ScopeTable::new();
        let geo = table.register_module("geo").unwrap();
        let main = table.register_module("main").unwrap();
        table.add_symbol(geo, var("secret")).unwrap();
        table.add_symbol(geo, var("area").public(true)).unwrap();

        assert!(table.lookup_with_visibility(geo, "secret", Some(main)).is_none());
        assert!(table.lookup_with_visibility(geo, "secret", Some(geo)).is_some());
        assert!(table.lookup_with_visibility(geo, "area", Some(main)).is_some());
    }

    #[test]
    fn test_qualified_lookup_through_alias() {
        let mut table = ScopeTable::new();
        let geo = table.register_module("geo").unwrap();
        let main = table.register_module("main").unwrap();
        table.add_symbol(geo, var("area").public(true)).unwrap();
        table.add_symbol(geo, var("secret")).unwrap();
        table.add_import(
            main,
            ImportBinding {
                module_name: "geo".to_string(),
                alias: Some("g".to_string()),
                target: geo,
            },
        );

        let inner = table.create_child_scope(main, ScopeKind::Function);
        assert!(table.lookup_qualified(inner, "g", "area").is_some());
        assert!(table.lookup_qualified(inner, "g", "secret").is_none());
        assert!(table.lookup_qualified(inner, "geo", "area").is_none());
    }
}
