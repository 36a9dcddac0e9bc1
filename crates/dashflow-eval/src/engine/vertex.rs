use smallvec::SmallVec;
use std::marker::PhantomData;
use std::sync::Arc;

/// Session-internal node identity, shared by parameters and computations.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    pub(crate) fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a registered parameter.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParamId(pub(crate) NodeId);

impl ParamId {
    pub fn node(self) -> NodeId {
        self.0
    }
}

impl From<ParamId> for NodeId {
    fn from(id: ParamId) -> Self {
        id.0
    }
}

/// Typed handle to a registered computation producing `T`.
pub struct Computation<T> {
    pub(crate) id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Computation<T> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn node(self) -> NodeId {
        self.id
    }
}

// Manual impls: deriving would put bounds on `T`.
impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Computation<T> {}

impl<T> PartialEq for Computation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Computation<T> {}

impl<T> std::fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Computation").field(&self.id).finish()
    }
}

impl<T> From<Computation<T>> for NodeId {
    fn from(c: Computation<T>) -> Self {
        c.id
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexKind {
    Parameter,
    Computation,
}

/// Lifecycle of a computation's cached value.
///
/// `Uninitialized` is the only initial state; parameters are always `Fresh`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeState {
    Uninitialized,
    Fresh,
    Stale,
}

/// A dependency edge together with the version observed when it was read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub node: NodeId,
    pub seen_version: u64,
}

pub(crate) type Dependencies = SmallVec<[Dependency; 4]>;

#[derive(Debug, Clone)]
pub struct Vertex {
    pub name: Arc<str>,
    pub kind: VertexKind,
    pub state: NodeState,
    /// Parameters: bumped on every effective write.
    /// Computations: bumped on every successful recomputation.
    pub version: u64,
    pub dependencies: Dependencies, // What this read last time
    pub dependents: Vec<NodeId>,    // What read this last time
}

impl Vertex {
    pub fn new_parameter(name: Arc<str>) -> Self {
        Self {
            name,
            kind: VertexKind::Parameter,
            state: NodeState::Fresh,
            version: 0,
            dependencies: SmallVec::new(),
            dependents: Vec::new(),
        }
    }

    pub fn new_computation(name: Arc<str>) -> Self {
        Self {
            name,
            kind: VertexKind::Computation,
            state: NodeState::Uninitialized,
            version: 0,
            dependencies: SmallVec::new(),
            dependents: Vec::new(),
        }
    }

    pub fn is_computation(&self) -> bool {
        self.kind == VertexKind::Computation
    }
}
