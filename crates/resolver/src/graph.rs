//! Install ordering
//!
//! Removals run first. Installs follow in dependency order, computed with
//! Kahn's algorithm over the Depends and PreDepends edges between versions
//! being installed. Members of a cycle keep their marking order at the end.

use std::collections::{HashMap, HashSet, VecDeque};

use pkgjob_store::VersionKey;
use pkgjob_types::DepKind;
use serde::{Deserialize, Serialize};

use crate::depcache::{DepCache, Mode};

/// Action to take for a planned version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepAction {
    Install,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
    pub version: VersionKey,
    pub action: StepAction,
}

/// Dependency graph over versions, edges point from dependent to dependency
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<VersionKey>,
    edges: HashMap<VersionKey, Vec<VersionKey>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, version: VersionKey) {
        if !self.edges.contains_key(&version) {
            self.nodes.push(version);
            self.edges.insert(version, Vec::new());
        }
    }

    /// Record that `dependent` needs `dependency` in place first; ignored
    /// unless `dependent` is a node
    pub fn add_edge(&mut self, dependent: VersionKey, dependency: VersionKey) {
        if dependent == dependency {
            return;
        }
        let Some(deps) = self.edges.get_mut(&dependent) else {
            return;
        };
        if !deps.contains(&dependency) {
            deps.push(dependency);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check for cycles using DFS
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        let mut visited = HashSet::new();
        let mut stack = HashSet::new();
        self.nodes
            .iter()
            .any(|&node| !visited.contains(&node) && self.cycle_from(node, &mut visited, &mut stack))
    }

    fn cycle_from(
        &self,
        node: VersionKey,
        visited: &mut HashSet<VersionKey>,
        stack: &mut HashSet<VersionKey>,
    ) -> bool {
        visited.insert(node);
        stack.insert(node);
        for &dep in self.edges.get(&node).into_iter().flatten() {
            if stack.contains(&dep) || (!visited.contains(&dep) && self.cycle_from(dep, visited, stack)) {
                return true;
            }
        }
        stack.remove(&node);
        false
    }

    /// Dependencies before dependents; nodes stuck in a cycle are appended
    /// in insertion order
    #[must_use]
    pub fn topological_sort(&self) -> Vec<VersionKey> {
        // In-degree counts unmet dependencies of each node
        let mut pending: HashMap<VersionKey, usize> = HashMap::new();
        let mut dependents: HashMap<VersionKey, Vec<VersionKey>> = HashMap::new();
        for &node in &self.nodes {
            let deps = &self.edges[&node];
            let inside = deps.iter().filter(|d| self.edges.contains_key(d)).count();
            pending.insert(node, inside);
            for &dep in deps {
                dependents.entry(dep).or_default().push(node);
            }
        }

        let mut queue: VecDeque<VersionKey> = self
            .nodes
            .iter()
            .copied()
            .filter(|n| pending[n] == 0)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut placed = HashSet::new();

        while let Some(node) = queue.pop_front() {
            result.push(node);
            placed.insert(node);
            for &dependent in dependents.get(&node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            tracing::debug!(
                remaining = self.nodes.len() - result.len(),
                "dependency cycle in install order"
            );
            result.extend(self.nodes.iter().filter(|n| !placed.contains(*n)));
        }
        result
    }
}

/// Ordered steps for the marks in `cache`
#[must_use]
pub fn install_order(cache: &DepCache) -> Vec<InstallStep> {
    let store = cache.store();
    let mut steps = Vec::new();
    let mut graph = DependencyGraph::new();

    for pk in cache.package_keys() {
        match cache.mode(pk) {
            Mode::Delete => {
                if let Some(vk) = cache.current(pk) {
                    steps.push(InstallStep {
                        version: vk,
                        action: StepAction::Remove,
                    });
                }
            }
            Mode::Install => {
                if let Some(vk) = cache.candidate(pk) {
                    graph.add_node(vk);
                }
            }
            Mode::Keep => {}
        }
    }

    let installing: Vec<VersionKey> = graph.nodes.clone();
    for vk in installing {
        let groups = store
            .version(vk)
            .depends
            .iter()
            .filter(|g| matches!(g.kind, DepKind::Depends | DepKind::PreDepends));
        for atom in groups.flat_map(|g| &g.alternatives) {
            if cache.mode(atom.target) == Mode::Install {
                if let Some(dep) = cache.candidate(atom.target) {
                    graph.add_edge(vk, dep);
                }
            }
            for provider in store.providers(atom.target) {
                let owner = store.version(provider.version).package;
                if cache.mode(owner) == Mode::Install && cache.candidate(owner) == Some(provider.version) {
                    graph.add_edge(vk, provider.version);
                }
            }
        }
    }

    steps.extend(graph.topological_sort().into_iter().map(|version| InstallStep {
        version,
        action: StepAction::Install,
    }));
    steps
}
