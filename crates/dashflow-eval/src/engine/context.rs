use dashflow_common::{DashError, DashResult, FromParam, ParamValue};
use std::sync::Arc;

use super::eval::Session;
use super::vertex::{Computation, Dependencies, Dependency, NodeId, ParamId};

/// Tracking context handed to a computation while it runs.
///
/// Every parameter or computation read through the context becomes a
/// dependency edge of the running computation. Reads that bypass the
/// context (globals, clocks, files) are invisible to invalidation; keeping
/// computations free of them is the caller's obligation.
pub struct EvalContext<'s> {
    session: &'s mut Session,
    current: NodeId,
    name: Arc<str>,
    reads: Dependencies,
}

impl<'s> EvalContext<'s> {
    pub(crate) fn new(session: &'s mut Session, current: NodeId, name: Arc<str>) -> Self {
        Self {
            session,
            current,
            name,
            reads: Dependencies::new(),
        }
    }

    /// Name of the computation being evaluated.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> NodeId {
        self.current
    }

    /// Tracked read of a parameter's current value.
    pub fn get(&mut self, param: ParamId) -> DashResult<ParamValue> {
        let value = self.session.get(param)?.clone();
        self.record(param.0);
        Ok(value)
    }

    /// Tracked read converted to `V`; a kind mismatch is `TypeMismatch`.
    pub fn get_as<V: FromParam>(&mut self, param: ParamId) -> DashResult<V> {
        let value = self.get(param)?;
        V::from_param(&value).ok_or_else(|| {
            DashError::type_mismatch(self.session.name(param.0).as_ref(), V::EXPECTED)
        })
    }

    /// Tracked read of another computation, evaluating it first if needed.
    pub fn evaluate<T: Send + Sync + 'static>(&mut self, c: Computation<T>) -> DashResult<Arc<T>> {
        let value = self.session.evaluate(c)?;
        self.record(c.id);
        Ok(value)
    }

    pub fn parameter(&self, name: &str) -> DashResult<ParamId> {
        self.session.parameter(name)
    }

    /// Resolve a computation by name. Resolving is not a read; evaluate
    /// the returned handle to depend on it.
    pub fn lookup<T: Send + Sync + 'static>(&self, name: &str) -> DashResult<Computation<T>> {
        self.session.computation(name)
    }

    /// A `ComputationFailure` attributed to the running computation.
    pub fn fail<M: Into<String>>(&self, message: M) -> DashError {
        DashError::failure(self.name.as_ref(), message)
    }

    fn record(&mut self, node: NodeId) {
        if self.reads.iter().any(|d| d.node == node) {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            computation = %self.name,
            dependency = %self.session.name(node),
            "tracked read"
        );
        self.reads.push(Dependency {
            node,
            seen_version: self.session.graph().version(node),
        });
    }

    pub(crate) fn into_reads(self) -> Dependencies {
        self.reads
    }
}
