use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;
use crate::imports::ImportKind;

/// Stable module identifier: the project-relative path with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Outgoing edge of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Specifier as written in the importing file
    pub specifier: String,
    pub target: ModuleId,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub path: PathBuf,
    pub kind: AssetKind,
    /// Lives under the dependency root
    pub is_dependency: bool,
    pub size: u64,
    pub dependencies: Vec<Dependency>,
}

impl Module {
    pub fn new(id: ModuleId, path: impl Into<PathBuf>, kind: AssetKind) -> Self {
        Self {
            id,
            path: path.into(),
            kind,
            is_dependency: false,
            size: 0,
            dependencies: Vec::new(),
        }
    }

    pub fn dependency(mut self, is_dependency: bool) -> Self {
        self.is_dependency = is_dependency;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Module dependency graph rooted at a single entry.
///
/// Modules keep insertion order, which for walked graphs is breadth-first
/// discovery order. Nothing forces every module to be reachable from the
/// entry; graphs assembled by hand may carry orphans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    modules: IndexMap<ModuleId, Module>,
    entry: Option<ModuleId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module; an existing module with the same id is kept.
    pub fn add_module(&mut self, module: Module) -> &mut Module {
        self.modules.entry(module.id.clone()).or_insert(module)
    }

    /// Add an edge. Duplicate `(target, kind)` edges from one module collapse.
    ///
    /// Returns `false` when `from` is not in the graph.
    pub fn add_dependency(&mut self, from: &ModuleId, dependency: Dependency) -> bool {
        let Some(module) = self.modules.get_mut(from) else {
            return false;
        };
        let duplicate = module
            .dependencies
            .iter()
            .any(|d| d.target == dependency.target && d.kind == dependency.kind);
        if !duplicate {
            module.dependencies.push(dependency);
        }
        true
    }

    pub fn set_entry(&mut self, id: ModuleId) {
        self.entry = Some(id);
    }

    pub fn entry(&self) -> Option<&ModuleId> {
        self.entry.as_ref()
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Position of a module in insertion order.
    pub fn index_of(&self, id: &ModuleId) -> Option<usize> {
        self.modules.get_index_of(id)
    }

    /// Outgoing edges of a module whose target is in the graph.
    pub fn dependencies<'a>(&'a self, id: &ModuleId) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.modules
            .get(id)
            .into_iter()
            .flat_map(|m| m.dependencies.iter())
            .filter(|d| self.modules.contains_key(&d.target))
    }

    /// Distinct modules that reference `id`, in insertion order.
    pub fn dependents(&self, id: &ModuleId) -> Vec<&ModuleId> {
        self.modules
            .values()
            .filter(|m| m.dependencies.iter().any(|d| &d.target == id))
            .map(|m| &m.id)
            .collect()
    }

    /// Number of distinct referencing modules.
    pub fn reuse_count(&self, id: &ModuleId) -> usize {
        self.dependents(id).len()
    }

    /// Breadth-first closure from `start`, following edges accepted by `follow`.
    pub fn reachable_from(
        &self,
        start: &ModuleId,
        mut follow: impl FnMut(&Dependency) -> bool,
    ) -> Vec<ModuleId> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        if self.contains(start) {
            seen.insert(start.clone());
            queue.push_back(start.clone());
        }

        while let Some(id) = queue.pop_front() {
            for dep in self.dependencies(&id) {
                if follow(dep) && seen.insert(dep.target.clone()) {
                    queue.push_back(dep.target.clone());
                }
            }
            order.push(id);
        }

        order
    }

    /// Every module reachable from the entry over any edge kind.
    pub fn reachable(&self) -> Vec<ModuleId> {
        match &self.entry {
            Some(entry) => self.reachable_from(entry, |_| true),
            None => Vec::new(),
        }
    }

    /// Targets of dynamic edges, in breadth-first discovery order from the entry.
    pub fn lazy_roots(&self) -> Vec<ModuleId> {
        let mut roots = Vec::new();
        for id in self.reachable() {
            for dep in self.dependencies(&id) {
                if dep.kind == ImportKind::Dynamic && !roots.contains(&dep.target) {
                    roots.push(dep.target.clone());
                }
            }
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str) -> Module {
        Module::new(ModuleId::from(id), id, AssetKind::Script)
    }

    fn edge(target: &str, kind: ImportKind) -> Dependency {
        Dependency {
            specifier: format!("./{target}"),
            target: ModuleId::from(target),
            kind,
        }
    }

    fn sample() -> ModuleGraph {
        let mut g = ModuleGraph::new();
        for id in ["main", "a", "b", "lazy", "orphan"] {
            g.add_module(module(id));
        }
        g.set_entry("main".into());
        g.add_dependency(&"main".into(), edge("a", ImportKind::Static));
        g.add_dependency(&"main".into(), edge("b", ImportKind::Static));
        g.add_dependency(&"a".into(), edge("b", ImportKind::Static));
        g.add_dependency(&"a".into(), edge("lazy", ImportKind::Dynamic));
        g.add_dependency(&"orphan".into(), edge("b", ImportKind::Static));
        g
    }

    #[test]
    fn reuse_counts_distinct_referrers() {
        let mut g = sample();
        // a second import of b from main does not count twice
        g.add_dependency(&"main".into(), edge("b", ImportKind::Static));
        assert_eq!(g.reuse_count(&"b".into()), 3);
        assert_eq!(g.reuse_count(&"main".into()), 0);
    }

    #[test]
    fn reachable_excludes_orphans() {
        let g = sample();
        let reached = g.reachable();
        assert_eq!(reached, vec!["main".into(), "a".into(), "b".into(), "lazy".into()]);
    }

    #[test]
    fn eager_closure_stops_at_dynamic_edges() {
        let g = sample();
        let eager = g.reachable_from(&"main".into(), |d| d.kind.is_eager());
        assert!(!eager.contains(&"lazy".into()));
    }

    #[test]
    fn lazy_roots_in_discovery_order() {
        let g = sample();
        assert_eq!(g.lazy_roots(), vec![ModuleId::from("lazy")]);
    }

    #[test]
    fn edges_to_missing_modules_are_ignored() {
        let mut g = sample();
        g.add_dependency(&"b".into(), edge("ghost", ImportKind::Static));
        assert_eq!(g.dependencies(&"b".into()).count(), 0);
    }
}
