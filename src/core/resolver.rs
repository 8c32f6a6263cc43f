//! Dependency resolution
//!
//! Computes the order modules are generated in and detects dependency
//! problems. Modules are visited in the order they were added and their
//! dependencies in the order they were declared, so the result is the
//! same on every run.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::ResolverError;

/// Dependency graph for modules
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: module -> dependencies
    edges: HashMap<String, Vec<String>>,
    /// Modules in insertion order
    nodes: Vec<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph
    ///
    /// Repeated dependencies are kept once.
    pub fn add_module(&mut self, name: &str, dependencies: Vec<String>) {
        if !self.edges.contains_key(name) {
            self.nodes.push(name.to_string());
        }
        let mut seen = HashSet::new();
        let deps = dependencies
            .into_iter()
            .filter(|d| seen.insert(d.clone()))
            .collect();
        self.edges.insert(name.to_string(), deps);
    }

    /// Whether `name` was added
    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Dependencies that name no known module, in declaration order
    pub fn missing_dependencies(&self) -> Vec<ResolverError> {
        self.nodes
            .iter()
            .flat_map(|node| {
                self.edges[node]
                    .iter()
                    .filter(|dep| !self.contains(dep))
                    .map(move |dep| ResolverError::MissingDependency {
                        module: node.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect()
    }

    /// Compute topological sort (generation order)
    ///
    /// Returns modules in order such that dependencies come before
    /// dependents. Missing dependencies are skipped.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        let mut visited = HashSet::new();
        let mut temp_visited = HashSet::new();
        let mut result = Vec::new();
        let mut path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(node, &mut visited, &mut temp_visited, &mut result, &mut path)?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        temp_visited: &mut HashSet<String>,
        result: &mut Vec<String>,
        path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if temp_visited.contains(node) {
            // Report only the cycle itself, closed on its first module
            let start = path.iter().position(|n| n == node).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(node.to_string());
            return Err(ResolverError::CircularDependency { cycle });
        }

        if visited.contains(node) {
            return Ok(());
        }

        let Some(deps) = self.edges.get(node) else {
            return Ok(());
        };

        temp_visited.insert(node.to_string());
        path.push(node.to_string());

        for dep in deps {
            self.visit(dep, visited, temp_visited, result, path)?;
        }

        path.pop();
        temp_visited.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }

    /// Every known module `name` depends on, directly or transitively
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        let mut stack: Vec<&str> = vec![name];
        while let Some(current) = stack.pop() {
            for dep in self.edges.get(current).into_iter().flatten() {
                if self.contains(dep) && dep != name && found.insert(dep.clone()) {
                    stack.push(dep);
                }
            }
        }
        found
    }

    /// Modules that depend directly on `name`
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| self.edges[*node].iter().any(|d| d == name))
            .cloned()
            .collect()
    }

    /// Render the graph, or the part reachable from `root`, in DOT format
    ///
    /// Edges to unknown modules are drawn dashed.
    pub fn to_dot(&self, root: Option<&str>) -> String {
        let included: Vec<&String> = match root {
            Some(root) => {
                let reachable = self.dependencies_of(root);
                self.nodes
                    .iter()
                    .filter(|n| n.as_str() == root || reachable.contains(*n))
                    .collect()
            }
            None => self.nodes.iter().collect(),
        };

        let mut output = String::new();
        let _ = writeln!(output, "digraph \"{}\" {{", root.unwrap_or("modules"));
        output.push_str("    rankdir=TB;\n");
        output.push_str("    node [shape=box];\n\n");
        for node in &included {
            let _ = writeln!(output, "    \"{node}\";");
        }
        output.push('\n');
        for node in &included {
            for dep in &self.edges[*node] {
                let style = if self.contains(dep) { "solid" } else { "dashed" };
                let _ = writeln!(output, "    \"{node}\" -> \"{dep}\" [style={style}];");
            }
        }
        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_dependency_order() {
        let mut graph = DependencyGraph::new();
        graph.add_module("app", vec!["lib".to_string()]);
        graph.add_module("lib", vec![]);

        let order = graph.topological_sort().unwrap();
        assert_eq!(order, vec!["lib", "app"]);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let mut graph = DependencyGraph::new();
        graph.add_module("root", vec!["a".to_string()]);
        graph.add_module("a", vec!["b".to_string()]);
        graph.add_module("b", vec!["c".to_string()]);
        graph.add_module("c", vec!["a".to_string()]);

        assert!(graph.has_cycle());
        assert_eq!(
            graph.topological_sort().unwrap_err(),
            ResolverError::CircularDependency {
                cycle: vec!["a", "b", "c", "a"].into_iter().map(String::from).collect(),
            }
        );
    }

    #[test]
    fn test_missing_dependencies_are_skipped_and_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_module("app", vec!["ghost".to_string(), "lib".to_string()]);
        graph.add_module("lib", vec![]);

        assert_eq!(graph.topological_sort().unwrap(), vec!["lib", "app"]);
        assert_eq!(
            graph.missing_dependencies(),
            vec![ResolverError::MissingDependency {
                module: "app".to_string(),
                dependency: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_independent_modules_keep_insertion_order() {
        let mut graph = DependencyGraph::new();
        graph.add_module("zeta", vec![]);
        graph.add_module("alpha", vec![]);
        graph.add_module("mid", vec![]);
        assert_eq!(graph.topological_sort().unwrap(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_transitive_dependencies_and_dependents() {
        let mut graph = DependencyGraph::new();
        graph.add_module("app", vec!["svc".to_string(), "svc".to_string()]);
        graph.add_module("svc", vec!["lib".to_string()]);
        graph.add_module("lib", vec![]);
        graph.add_module("tool", vec!["lib".to_string()]);

        let deps: Vec<_> = graph.dependencies_of("app").into_iter().collect();
        assert_eq!(deps, vec!["lib", "svc"]);
        assert_eq!(graph.dependents_of("lib"), vec!["svc", "tool"]);
        assert!(graph.dependencies_of("lib").is_empty());
    }

    #[test]
    fn test_dot_output() {
        let mut graph = DependencyGraph::new();
        graph.add_module("app", vec!["lib".to_string(), "ghost".to_string()]);
        graph.add_module("lib", vec![]);
        graph.add_module("tool", vec![]);

        let dot = graph.to_dot(None);
        assert!(dot.starts_with("digraph \"modules\" {"));
        assert!(dot.contains("\"app\" -> \"lib\" [style=solid];"));
        assert!(dot.contains("\"app\" -> \"ghost\" [style=dashed];"));
        assert!(dot.contains("\"tool\";"));

        let dot = graph.to_dot(Some("app"));
        assert!(dot.contains("\"lib\";"));
        assert!(!dot.contains("\"tool\""));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Edges that only point at earlier modules never form a cycle, and
        /// every dependency precedes its dependent in the order.
        #[test]
        fn prop_acyclic_graph_orders_dependencies_first(
            edges in proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..4), 1..12)
        ) {
            let names: Vec<String> = (0..edges.len()).map(|i| format!("m{i}")).collect();
            let mut graph = DependencyGraph::new();
            for (i, picks) in edges.iter().enumerate() {
                let deps = if i == 0 {
                    Vec::new()
                } else {
                    picks.iter().map(|p| names[p.index(i)].clone()).collect()
                };
                graph.add_module(&names[i], deps);
            }

            let order = graph.topological_sort().unwrap();
            prop_assert_eq!(order.len(), names.len());
            let position: HashMap<&String, usize> =
                order.iter().enumerate().map(|(i, n)| (n, i)).collect();
            for (i, picks) in edges.iter().enumerate().skip(1) {
                for p in picks {
                    let dep = &names[p.index(i)];
                    prop_assert!(position[dep] < position[&names[i]]);
                }
            }
        }
    }
}
