use dashflow_common::{DashError, DashResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use super::vertex::{Dependencies, Dependency, NodeId, NodeState, Vertex, VertexKind};

/// Arena of parameters and computations plus the edges recorded between them.
///
/// Edges always reflect the *last successful* evaluation of each computation
/// (plus any statically declared dependencies), so the graph is acyclic.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    // Core storage - simple arena
    vertices: Vec<Vertex>,

    name_to_vertex: FxHashMap<Arc<str>, NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn add_vertex(&mut self, name: &str, kind: VertexKind) -> DashResult<NodeId> {
        if self.name_to_vertex.contains_key(name) {
            return Err(DashError::DuplicateName(name.to_string()));
        }
        let name: Arc<str> = Arc::from(name);
        let id = NodeId::new(self.vertices.len() as u32);
        let vertex = match kind {
            VertexKind::Parameter => Vertex::new_parameter(name.clone()),
            VertexKind::Computation => Vertex::new_computation(name.clone()),
        };
        self.vertices.push(vertex);
        self.name_to_vertex.insert(name, id);
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.name_to_vertex.get(name).copied()
    }

    pub fn vertex(&self, id: NodeId) -> Option<&Vertex> {
        self.vertices.get(id.as_index())
    }

    pub(crate) fn vertex_mut(&mut self, id: NodeId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.as_index())
    }

    pub fn name(&self, id: NodeId) -> Arc<str> {
        self.vertex(id)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| Arc::from(format!("#{}", id.0)))
    }

    pub fn version(&self, id: NodeId) -> u64 {
        self.vertex(id).map(|v| v.version).unwrap_or(0)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.vertex(id).map(|v| v.state)
    }

    pub fn dependencies(&self, id: NodeId) -> &[Dependency] {
        self.vertex(id).map(|v| &v.dependencies[..]).unwrap_or(&[])
    }

    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        self.vertex(id).map(|v| &v.dependents[..]).unwrap_or(&[])
    }

    pub fn computations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_computation())
            .map(|(i, _)| NodeId::new(i as u32))
    }

    pub(crate) fn bump_version(&mut self, id: NodeId) -> u64 {
        match self.vertex_mut(id) {
            Some(vertex) => {
                vertex.version += 1;
                vertex.version
            }
            None => 0,
        }
    }

    pub(crate) fn set_state(&mut self, id: NodeId, state: NodeState) {
        if let Some(vertex) = self.vertex_mut(id) {
            vertex.state = state;
        }
    }

    /// Every computation reachable through dependent edges from `roots`,
    /// excluding the roots themselves.
    pub fn transitive_dependents(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut to_visit: Vec<NodeId> = Vec::new();
        for &root in roots {
            to_visit.extend(self.dependents(root));
        }

        let mut out = Vec::new();
        while let Some(id) = to_visit.pop() {
            if !seen.insert(id) {
                continue; // Already processed
            }
            out.push(id);
            to_visit.extend(self.dependents(id));
        }
        out.sort_unstable();
        out
    }

    /// Mark every computation downstream of `roots` stale.
    ///
    /// Returns the computations that went from `Fresh` to `Stale`; nodes that
    /// were already stale or never computed are walked through but not
    /// reported.
    pub fn mark_dirty(&mut self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut affected = Vec::new();
        for id in self.transitive_dependents(roots) {
            if let Some(vertex) = self.vertex_mut(id)
                && vertex.state == NodeState::Fresh
            {
                vertex.state = NodeState::Stale;
                affected.push(id);
            }
        }
        affected
    }

    /// Fresh computations that recorded an older version of `id` go stale,
    /// together with everything downstream of them. This happens when a
    /// reader declared `id` before `id` had ever been computed.
    pub(crate) fn mark_outdated_readers(&mut self, id: NodeId) -> Vec<NodeId> {
        let version = self.version(id);
        let outdated: Vec<NodeId> = self
            .dependents(id)
            .iter()
            .copied()
            .filter(|&reader| {
                self.vertex(reader).is_some_and(|v| {
                    v.state == NodeState::Fresh
                        && v
                            .dependencies
                            .iter()
                            .any(|dep| dep.node == id && dep.seen_version != version)
                })
            })
            .collect();
        if outdated.is_empty() {
            return outdated;
        }

        for &reader in &outdated {
            self.set_state(reader, NodeState::Stale);
        }
        let mut affected = outdated.clone();
        affected.extend(self.mark_dirty(&outdated));
        affected
    }

    /// Replace the recorded dependency set of `dependent` and rewire the
    /// reverse edges to match.
    pub(crate) fn replace_dependencies(&mut self, dependent: NodeId, new_deps: Dependencies) {
        self.remove_dependent_edges(dependent);
        self.add_dependent_edges(dependent, &new_deps);
        if let Some(vertex) = self.vertex_mut(dependent) {
            vertex.dependencies = new_deps;
        }
    }

    fn add_dependent_edges(&mut self, dependent: NodeId, dependencies: &[Dependency]) {
        for dep in dependencies {
            if let Some(dep_vertex) = self.vertex_mut(dep.node)
                && !dep_vertex.dependents.contains(&dependent)
            {
                dep_vertex.dependents.push(dependent);
            }
        }
    }

    fn remove_dependent_edges(&mut self, dependent: NodeId) {
        let old_deps = match self.vertex(dependent) {
            Some(vertex) => vertex.dependencies.clone(),
            None => return,
        };

        for dep in old_deps {
            if let Some(dep_vertex) = self.vertex_mut(dep.node) {
                dep_vertex.dependents.retain(|&id| id != dependent);
            }
        }
    }

    /// True when every recorded dependency still carries the version seen
    /// at the last evaluation. Only meaningful for computations whose
    /// dependencies are themselves up to date.
    pub fn snapshot_matches(&self, id: NodeId) -> bool {
        self.dependencies(id)
            .iter()
            .all(|dep| self.version(dep.node) == dep.seen_version)
    }
}
