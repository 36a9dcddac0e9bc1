//! Dashflow reactive engine
//!
//! Parameters feed memoized computations; a write invalidates exactly the
//! computations that read the written parameter, directly or transitively.

pub mod cache;
pub mod context;
pub mod eval;
pub mod graph;
pub mod metrics;
pub mod scheduler;
pub mod store;
pub mod vertex;

#[cfg(test)]
mod tests;

pub use cache::{AnyValue, DerivedCache};
pub use context::EvalContext;
pub use eval::{EvalResult, Session};
pub use graph::DependencyGraph;
pub use metrics::EvalMetrics;
pub use scheduler::{Layer, Schedule, Scheduler};
pub use store::{InputStore, SetOutcome};
pub use vertex::{Computation, Dependency, NodeId, NodeState, ParamId, Vertex, VertexKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a parameter write reaches the computations that read it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationPolicy {
    /// Push: the write marks every transitive dependent stale.
    #[default]
    Eager,
    /// Pull: the write only bumps a version; `evaluate` compares the
    /// recorded dependency versions before reusing a cached value.
    Lazy,
}

/// Configuration for a session
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalConfig {
    pub invalidation: InvalidationPolicy,
    /// Upper bound on registered parameters plus computations.
    pub max_nodes: Option<usize>,
}

impl EvalConfig {
    pub fn lazy() -> Self {
        Self {
            invalidation: InvalidationPolicy::Lazy,
            ..Default::default()
        }
    }
}

/// Construct a new session with the given configuration
pub fn new_session(config: EvalConfig) -> Session {
    Session::with_config(config)
}
