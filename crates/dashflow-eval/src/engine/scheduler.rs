use super::graph::DependencyGraph;
use super::vertex::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

pub struct Scheduler<'a> {
    graph: &'a DependencyGraph,
}

/// Computations with no dependency on one another; they may be evaluated in
/// any order, or concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub vertices: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub layers: Vec<Layer>,
    pub cycles: Vec<Vec<NodeId>>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.cycles.is_empty()
    }

    /// Layers flattened into a single evaluation order.
    pub fn order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.layers.iter().flat_map(|l| l.vertices.iter().copied())
    }
}

impl<'a> Scheduler<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Schedule `targets` and every computation they transitively read.
    pub fn schedule_for(&self, targets: &[NodeId]) -> Schedule {
        let closure = self.dependency_closure(targets);
        self.create_schedule(&closure)
    }

    pub fn create_schedule(&self, vertices: &[NodeId]) -> Schedule {
        // 1. Find strongly connected components using Tarjan's algorithm
        let sccs = self.tarjan_scc(vertices);

        // 2. Separate cyclic from acyclic components
        let (cycles, acyclic_sccs) = self.separate_cycles(sccs);

        // 3. Topologically sort acyclic components into layers
        let layers = self.build_layers(acyclic_sccs);

        Schedule { layers, cycles }
    }

    fn dependency_closure(&self, targets: &[NodeId]) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut to_visit: Vec<NodeId> = targets.to_vec();
        let mut out = Vec::new();
        while let Some(id) = to_visit.pop() {
            let Some(vertex) = self.graph.vertex(id) else {
                continue;
            };
            if !vertex.is_computation() || !seen.insert(id) {
                continue;
            }
            out.push(id);
            to_visit.extend(vertex.dependencies.iter().map(|d| d.node));
        }
        out.sort_unstable();
        out
    }

    /// Computation dependencies of `vertex` that are inside `scope`.
    fn scoped_dependencies<'g>(
        &'g self,
        vertex: NodeId,
        scope: &'g FxHashSet<NodeId>,
    ) -> impl Iterator<Item = NodeId> + 'g {
        self.graph
            .dependencies(vertex)
            .iter()
            .map(|d| d.node)
            .filter(move |n| scope.contains(n))
    }

    /// Tarjan's strongly connected components algorithm
    pub fn tarjan_scc(&self, vertices: &[NodeId]) -> Vec<Vec<NodeId>> {
        let scope: FxHashSet<NodeId> = vertices.iter().copied().collect();
        let mut state = TarjanState::default();

        for &vertex in vertices {
            if !state.indices.contains_key(&vertex) {
                self.tarjan_visit(vertex, &scope, &mut state);
            }
        }

        state.sccs
    }

    fn tarjan_visit(&self, vertex: NodeId, scope: &FxHashSet<NodeId>, st: &mut TarjanState) {
        // Set the depth index for vertex to the smallest unused index
        st.indices.insert(vertex, st.index_counter);
        st.lowlinks.insert(vertex, st.index_counter);
        st.index_counter += 1;
        st.stack.push(vertex);
        st.on_stack.insert(vertex);

        let deps: Vec<NodeId> = self.scoped_dependencies(vertex, scope).collect();
        for dependency in deps {
            if !st.indices.contains_key(&dependency) {
                self.tarjan_visit(dependency, scope, st);
                let low = st.lowlinks[&vertex].min(st.lowlinks[&dependency]);
                st.lowlinks.insert(vertex, low);
            } else if st.on_stack.contains(&dependency) {
                let low = st.lowlinks[&vertex].min(st.indices[&dependency]);
                st.lowlinks.insert(vertex, low);
            }
            // Otherwise a cross-edge into a finished component; ignore it.
        }

        // Root of a component: pop it off the stack
        if st.lowlinks[&vertex] == st.indices[&vertex] {
            let mut scc = Vec::new();
            while let Some(w) = st.stack.pop() {
                st.on_stack.remove(&w);
                scc.push(w);
                if w == vertex {
                    break;
                }
            }
            st.sccs.push(scc);
        }
    }

    fn separate_cycles(&self, sccs: Vec<Vec<NodeId>>) -> (Vec<Vec<NodeId>>, Vec<Vec<NodeId>>) {
        let mut cycles = Vec::new();
        let mut acyclic = Vec::new();

        for scc in sccs {
            if scc.len() > 1 || (scc.len() == 1 && self.has_self_loop(scc[0])) {
                cycles.push(scc);
            } else {
                acyclic.push(scc);
            }
        }

        (cycles, acyclic)
    }

    fn has_self_loop(&self, vertex: NodeId) -> bool {
        self.graph
            .dependencies(vertex)
            .iter()
            .any(|d| d.node == vertex)
    }

    /// Kahn's algorithm: layer 0 holds vertices with no in-scope
    /// dependencies, layer N those whose dependencies all sit below N.
    fn build_layers(&self, acyclic_sccs: Vec<Vec<NodeId>>) -> Vec<Layer> {
        let scope: FxHashSet<NodeId> = acyclic_sccs.into_iter().flatten().collect();
        if scope.is_empty() {
            return Vec::new();
        }

        let mut in_degree: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut consumers: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        for &vertex in &scope {
            let mut degree = 0;
            for dep in self.scoped_dependencies(vertex, &scope) {
                degree += 1;
                consumers.entry(dep).or_default().push(vertex);
            }
            in_degree.insert(vertex, degree);
        }

        let mut current: Vec<NodeId> = in_degree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&v, _)| v)
            .collect();

        let mut layers = Vec::new();
        while !current.is_empty() {
            current.sort_unstable();
            let mut next = Vec::new();
            for vertex in &current {
                for consumer in consumers.get(vertex).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(consumer) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(*consumer);
                        }
                    }
                }
            }
            layers.push(Layer { vertices: current });
            current = next;
        }

        layers
    }
}

#[derive(Default)]
struct TarjanState {
    index_counter: usize,
    stack: Vec<NodeId>,
    indices: FxHashMap<NodeId, usize>,
    lowlinks: FxHashMap<NodeId, usize>,
    on_stack: FxHashSet<NodeId>,
    sccs: Vec<Vec<NodeId>>,
}
