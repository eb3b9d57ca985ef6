//! Module resolution: registration, import binding and dependency-ordered
//! checking of every module in a compilation unit

use std::borrow::Cow;
use std::collections::HashSet;

use log::debug;
use vela_ast::{Program, Span};

use crate::checker::{CheckContext, TypeChecker};
use crate::config::CheckConfig;
use crate::dep_graph::{DepGraph, Dependency};
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::scope::{ImportBinding, ScopeId, ScopeTable};

/// Source of modules a unit imports but does not declare
pub trait ModuleLoader {
    /// Parsed tree of the unit declaring `name`, if one can be found
    fn load(&mut self, name: &str) -> Option<Program>;
}

/// Loader for checks confined to a single unit
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLoader;

impl ModuleLoader for NoLoader {
    fn load(&mut self, _name: &str) -> Option<Program> {
        None
    }
}

#[derive(Debug, Clone)]
struct ModuleEntry {
    name: String,
    /// Index into the resolver's units
    unit: usize,
    /// Index of the module within its unit
    index: usize,
    scope: ScopeId,
}

pub struct ModuleResolver<'a> {
    config: &'a CheckConfig,
    sink: &'a mut dyn DiagnosticSink,
    loader: &'a mut dyn ModuleLoader,
    scopes: ScopeTable,
    units: Vec<Cow<'a, Program>>,
    entries: Vec<ModuleEntry>,
    graph: DepGraph,
    failed_loads: HashSet<String>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(
        config: &'a CheckConfig,
        sink: &'a mut dyn DiagnosticSink,
        loader: &'a mut dyn ModuleLoader,
    ) -> Self {
        Self {
            config,
            sink,
            loader,
            scopes: ScopeTable::new(),
            units: Vec::new(),
            entries: Vec::new(),
            graph: DepGraph::new(),
            failed_loads: HashSet::new(),
        }
    }

    /// Resolve and check `program`. Returns true when no diagnostic was
    /// added to the sink.
    pub fn resolve(mut self, program: &'a Program) -> bool {
        let before = self.sink.len();
        debug!("resolving '{}' ({} modules)", program.path, program.modules.len());

        self.units.push(Cow::Borrowed(program));
        if !self.register_modules(0) {
            return false;
        }
        self.bind_imports();
        self.check_modules();

        self.sink.len() == before
    }

    fn emit(&mut self, unit: usize, diagnostic: Diagnostic) {
        self.sink.push(diagnostic.in_program(&self.units[unit]));
    }

    /// Pass 1: give every module of `unit` a scope in the module namespace.
    /// Stops at the first duplicate name.
    fn register_modules(&mut self, unit: usize) -> bool {
        let program = &self.units[unit];
        for (index, module) in program.modules.iter().enumerate() {
            let name = &module.value.name;
            match self.scopes.register_module(&name.value.name) {
                Ok(scope) => {
                    debug!("registered module '{}' as scope {}", name.value, scope);
                    self.entries.push(ModuleEntry {
                        name: name.value.name.clone(),
                        unit,
                        index,
                        scope,
                    });
                }
                Err(err) => {
                    let diagnostic =
                        Diagnostic::new(DiagnosticKind::DuplicateModule, err.to_string(), name.span)
                            .in_program(program);
                    self.sink.push(diagnostic);
                    return false;
                }
            }
        }
        true
    }

    /// Pass 2: bind each `use` directive to its target module and build the
    /// dependency graph. Modules pulled in through the loader are appended
    /// to the entries and bound in turn.
    fn bind_imports(&mut self) {
        let mut i = 0;
        while i < self.entries.len() {
            let ModuleEntry {
                name,
                unit,
                index,
                scope,
            } = self.entries[i].clone();

            let directives: Vec<(String, Option<String>, Span)> = self.units[unit].modules[index]
                .value
                .imports()
                .map(|(module, alias)| {
                    (
                        module.value.name.clone(),
                        alias.map(|a| a.value.name.clone()),
                        module.span,
                    )
                })
                .collect();

            let mut dependencies = Vec::with_capacity(directives.len());
            for (module_name, alias, span) in directives {
                let target = match self.scopes.module(&module_name) {
                    Some(target) => Some(target),
                    None => self.load_module(&module_name),
                };
                let Some(target) = target else {
                    self.emit(
                        unit,
                        Diagnostic::new(
                            DiagnosticKind::UnresolvedModule,
                            format!("cannot find module '{}'", module_name),
                            span,
                        ),
                    );
                    continue;
                };

                debug!("'{}' imports '{}'", name, module_name);
                self.scopes.add_import(
                    scope,
                    ImportBinding {
                        module_name: module_name.clone(),
                        alias,
                        target,
                    },
                );
                dependencies.push(Dependency { module_name, span });
            }

            self.graph.add_module(name, dependencies);
            i += 1;
        }
    }

    fn load_module(&mut self, name: &str) -> Option<ScopeId> {
        if self.failed_loads.contains(name) {
            return None;
        }
        debug!("module '{}' is not declared in the unit, trying the loader", name);
        let found = self.loader.load(name).and_then(|program| {
            let unit = self.units.len();
            self.units.push(Cow::Owned(program));
            self.register_modules(unit);
            self.scopes.module(name)
        });
        if found.is_none() {
            self.failed_loads.insert(name.to_string());
        }
        found
    }

    /// Pass 3: check module bodies with dependencies first
    fn check_modules(&mut self) {
        let order = self.graph.check_order();

        for cycle in &order.cycles {
            let Some(unit) = self.entry(&cycle.module_name).map(|e| e.unit) else {
                continue;
            };
            self.emit(
                unit,
                Diagnostic::new(
                    DiagnosticKind::CircularDependency,
                    format!(
                        "module '{}' imports '{}', which depends on '{}'",
                        cycle.module_name, cycle.dependency, cycle.module_name
                    ),
                    cycle.span,
                )
                .with_note("this import is ignored when ordering modules"),
            );
        }

        for name in &order.modules {
            let Some(entry) = self.entries.iter().find(|e| e.name == *name) else {
                continue;
            };
            let program = &self.units[entry.unit];
            let module = &program.modules[entry.index].value;
            let ctx = CheckContext::new(program, self.config, &mut *self.sink);
            let ownership = TypeChecker::new(&mut self.scopes, entry.scope, ctx).check_module(module);
            debug!(
                "module '{}' checked ({} allocations tracked)",
                name,
                ownership.records().len()
            );
        }
    }

    fn entry(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
