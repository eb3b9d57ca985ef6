//! Module dependency graph

use std::collections::HashMap;
use vela_ast::Span;

/// A `use` edge from one module to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub module_name: String,
    /// Location of the `use` directive
    pub span: Span,
}

/// Node in the dependency graph representing a module
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub name: String,
    /// Modules this module imports, in directive order
    pub dependencies: Vec<Dependency>,
}

/// An import edge that closes a cycle; it is skipped when ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEdge {
    pub module_name: String,
    pub dependency: String,
    pub span: Span,
}

/// Result of ordering the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOrder {
    /// Modules with every dependency ahead of its dependents
    pub modules: Vec<String>,
    pub cycles: Vec<CycleEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Done,
}

/// Dependency graph over the modules of one check
#[derive(Debug, Default)]
pub struct DepGraph {
    modules: Vec<ModuleNode>,
    index: HashMap<String, usize>,
}

impl DepGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph. Modules are visited in insertion order.
    pub fn add_module(&mut self, name: impl Into<String>, dependencies: Vec<Dependency>) {
        let name = name.into();
        let node = ModuleNode {
            name: name.clone(),
            dependencies,
        };
        match self.index.get(&name) {
            Some(&idx) => self.modules[idx] = node,
            None => {
                self.index.insert(name, self.modules.len());
                self.modules.push(node);
            }
        }
    }

    /// Depth-first ordering: every module comes after the modules it imports.
    /// An edge back into a module still being visited is recorded as a cycle
    /// and skipped; edges to modules outside the graph are ignored.
    pub fn check_order(&self) -> CheckOrder {
        let mut state = vec![VisitState::Unvisited; self.modules.len()];
        let mut order = CheckOrder::default();
        for idx in 0..self.modules.len() {
            self.visit(idx, &mut state, &mut order);
        }
        order
    }

    fn visit(&self, idx: usize, state: &mut [VisitState], order: &mut CheckOrder) {
        if state[idx] != VisitState::Unvisited {
            return;
        }
        state[idx] = VisitState::Visiting;

        let node = &self.modules[idx];
        for dep in &node.dependencies {
            let Some(&dep_idx) = self.index.get(&dep.module_name) else {
                continue;
            };
            match state[dep_idx] {
                VisitState::Unvisited => self.visit(dep_idx, state, order),
                VisitState::Visiting => order.cycles.push(CycleEdge {
                    module_name: node.name.clone(),
                    dependency: dep.module_name.clone(),
                    span: dep.span,
                }),
                VisitState::Done => {}
            }
        }

        state[idx] = VisitState::Done;
        order.modules.push(node.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> Vec<Dependency> {
        names
            .iter()
            .map(|n| Dependency {
                module_name: n.to_string(),
                span: Span::default(),
            })
            .collect()
    }

    fn position(order: &CheckOrder, name: &str) -> usize {
        order.modules.iter().position(|m| m == name).unwrap()
    }

    #[test]
    fn test_simple_graph() {
        let mut graph = DepGraph::new();
        // c imports b, b imports a; declared in reverse
        graph.add_module("c", deps(&["b"]));
        graph.add_module("b", deps(&["a"]));
        graph.add_module("a", vec![]);

        let order = graph.check_order();
        assert_eq!(order.modules, vec!["a", "b", "c"]);
        assert!(order.cycles.is_empty());
    }

    #[test]
    fn test_diamond_dependency() {
        let mut graph = DepGraph::new();
        graph.add_module("d", deps(&["b", "c"]));
        graph.add_module("b", deps(&["a"]));
        graph.add_module("c", deps(&["a"]));
        graph.add_module("a", vec![]);

        let order = graph.check_order();
        assert_eq!(order.modules.len(), 4);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "a") < position(&order, "c"));
        assert!(position(&order, "b") < position(&order, "d"));
        assert!(position(&order, "c") < position(&order, "d"));
    }

    #[test]
    fn test_cycle_is_reported_once_and_skipped() {
        let mut graph = DepGraph::new();
        graph.add_module("a", deps(&["b"]));
        graph.add_module("b", deps(&["a"]));

        let order = graph.check_order();
        assert_eq!(order.modules, vec!["b", "a"]);
        assert_eq!(
            order.cycles,
            vec![CycleEdge {
                module_name: "b".to_string(),
                dependency: "a".to_string(),
                span: Span::default(),
            }]
        );
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let mut graph = DepGraph::new();
        graph.add_module("a", deps(&["a"]));
        let order = graph.check_order();
        assert_eq!(order.modules, vec!["a"]);
        assert_eq!(order.cycles.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let mut graph = DepGraph::new();
        graph.add_module("main", deps(&["missing"]));
        let order = graph.check_order();
        assert_eq!(order.modules, vec!["main"]);
        assert!(order.cycles.is_empty());
    }
}
