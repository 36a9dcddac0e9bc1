use dashflow_common::{DashError, DashResult, Domain, FromParam, ParamValue};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::any::{TypeId, type_name};
use std::sync::Arc;
use std::time::Duration;

use super::cache::{AnyValue, ComputationSlot, ComputeFn, DerivedCache};
use super::context::EvalContext;
use super::graph::DependencyGraph;
use super::metrics::{ComputeTimer, EvalMetrics};
use super::scheduler::{Schedule, Scheduler};
use super::store::{InputStore, SetOutcome};
use super::vertex::{
    Computation, Dependencies, Dependency, NodeId, NodeState, ParamId, VertexKind,
};
use super::{EvalConfig, InvalidationPolicy};

/// Summary of an [`Session::evaluate_all`] pass.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Computations whose function ran and succeeded.
    pub computed: usize,
    /// Computations that could not be brought up to date.
    pub failed: usize,
    pub elapsed: Duration,
}

/// One client's parameters, computations, and cached results.
///
/// All mutation goes through `&mut self`, so a session's graph is never
/// evaluated concurrently. A `Session` is `Send`; separate sessions share
/// nothing and may live on separate threads.
#[derive(Debug)]
pub struct Session {
    config: EvalConfig,
    graph: DependencyGraph,
    store: InputStore,
    cache: DerivedCache,
    metrics: EvalMetrics,
    /// Computations currently being evaluated, outermost first.
    visiting: Vec<NodeId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self {
            config,
            graph: DependencyGraph::new(),
            store: InputStore::new(),
            cache: DerivedCache::new(),
            metrics: EvalMetrics::new(),
            visiting: Vec::new(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EvalMetrics {
        &self.metrics
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn name(&self, id: NodeId) -> Arc<str> {
        self.graph.name(id)
    }

    /* ───────────────────────── Registration ───────────────────────── */

    fn check_capacity(&self) -> DashResult<()> {
        match self.config.max_nodes {
            Some(limit) if self.graph.len() >= limit => {
                Err(DashError::CapacityExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    /// Register a parameter. The initial value must satisfy `domain`.
    pub fn register_parameter<V: Into<ParamValue>>(
        &mut self,
        name: &str,
        initial: V,
        domain: Domain,
    ) -> DashResult<ParamId> {
        self.check_capacity()?;
        let initial = initial.into();
        domain.validate(name, &initial)?;
        let id = self.graph.add_vertex(name, VertexKind::Parameter)?;
        self.store.insert(id, initial, domain);
        Ok(ParamId(id))
    }

    /// Register a computation whose dependencies are discovered by tracking
    /// the reads it makes on every evaluation.
    pub fn register_computation<T, F>(&mut self, name: &str, func: F) -> DashResult<Computation<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut EvalContext<'_>) -> DashResult<T> + Send + Sync + 'static,
    {
        self.register_computation_with_deps(name, &[], func)
    }

    /// Register a computation with statically declared dependencies.
    ///
    /// Declared dependencies are edges from the moment of registration and
    /// stay edges after every evaluation, whether or not the function reads
    /// them; tracked reads are added on top.
    pub fn register_computation_with_deps<T, F>(
        &mut self,
        name: &str,
        deps: &[NodeId],
        func: F,
    ) -> DashResult<Computation<T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut EvalContext<'_>) -> DashResult<T> + Send + Sync + 'static,
    {
        self.check_capacity()?;
        if let Some(missing) = deps.iter().find(|d| self.graph.vertex(**d).is_none()) {
            return Err(DashError::UnknownComputation(format!("#{}", missing.0)));
        }

        let id = self.graph.add_vertex(name, VertexKind::Computation)?;
        let func: Arc<ComputeFn> =
            Arc::new(move |cx: &mut EvalContext<'_>| func(cx).map(|v| Arc::new(v) as AnyValue));
        self.cache.insert(
            id,
            ComputationSlot {
                func,
                value: None,
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                declared: deps.iter().copied().collect(),
                runs: 0,
            },
        );

        if !deps.is_empty() {
            let seeded: Dependencies = deps
                .iter()
                .map(|&node| Dependency {
                    node,
                    seen_version: self.graph.version(node),
                })
                .collect();
            self.graph.replace_dependencies(id, seeded);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(computation = name, declared = deps.len(), "registered");

        Ok(Computation::new(id))
    }

    pub fn parameter(&self, name: &str) -> DashResult<ParamId> {
        match self.graph.lookup(name) {
            Some(id) if self.store.contains(id) => Ok(ParamId(id)),
            _ => Err(DashError::UnknownParameter(name.to_string())),
        }
    }

    pub fn computation<T: Send + Sync + 'static>(&self, name: &str) -> DashResult<Computation<T>> {
        let id = match self.graph.lookup(name) {
            Some(id) if self.cache.slot(id).is_some() => id,
            _ => return Err(DashError::UnknownComputation(name.to_string())),
        };
        if self.cache.type_id(id) != Some(TypeId::of::<T>()) {
            return Err(DashError::type_mismatch(name, type_name::<T>()));
        }
        Ok(Computation::new(id))
    }

    fn computation_name(&self, id: NodeId) -> DashResult<Arc<str>> {
        match self.graph.vertex(id) {
            Some(v) if v.is_computation() => Ok(v.name.clone()),
            Some(v) => Err(DashError::UnknownComputation(v.name.to_string())),
            None => Err(DashError::UnknownComputation(format!("#{}", id.0))),
        }
    }

    /* ───────────────────────── Input store ───────────────────────── */

    /// Current value of a parameter. Untracked; inside a computation use
    /// [`EvalContext::get`].
    pub fn get(&self, param: ParamId) -> DashResult<&ParamValue> {
        self.store
            .get(param.0)
            .ok_or_else(|| DashError::UnknownParameter(self.graph.name(param.0).to_string()))
    }

    pub fn get_as<V: FromParam>(&self, param: ParamId) -> DashResult<V> {
        let value = self.get(param)?;
        V::from_param(value)
            .ok_or_else(|| DashError::type_mismatch(self.graph.name(param.0).as_ref(), V::EXPECTED))
    }

    /// Version of a parameter (writes) or computation (recomputations).
    pub fn version<N: Into<NodeId>>(&self, id: N) -> u64 {
        self.graph.version(id.into())
    }

    /// Validate and store a single value. A value equal to the current one
    /// is a no-op: no version bump, nothing invalidated.
    pub fn set<V: Into<ParamValue>>(&mut self, param: ParamId, value: V) -> DashResult<SetOutcome> {
        self.set_many([(param, value.into())])
    }

    pub fn set_by_name<V: Into<ParamValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> DashResult<SetOutcome> {
        let param = self.parameter(name)?;
        self.set(param, value)
    }

    /// Apply several writes as one batch.
    ///
    /// Every value is validated before any is stored, so the batch is
    /// all-or-nothing. Invalidation runs once for the whole batch. When the
    /// same parameter appears twice the last value wins.
    pub fn set_many<I>(&mut self, writes: I) -> DashResult<SetOutcome>
    where
        I: IntoIterator<Item = (ParamId, ParamValue)>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("set_many").entered();

        let mut pending: Vec<(ParamId, ParamValue)> = Vec::new();
        for (param, value) in writes {
            if !self.store.contains(param.0) {
                return Err(DashError::UnknownParameter(
                    self.graph.name(param.0).to_string(),
                ));
            }
            let name = self.graph.name(param.0);
            self.store.check(param.0, &name, &value)?;
            match pending.iter_mut().find(|(p, _)| *p == param) {
                Some(slot) => slot.1 = value,
                None => pending.push((param, value)),
            }
        }

        let mut changed = Vec::new();
        for (param, value) in pending {
            let differs = !self
                .store
                .get(param.0)
                .is_some_and(|current| current.same_as(&value));
            self.metrics.record_write(differs);
            if differs {
                self.store.replace(param.0, value);
                self.graph.bump_version(param.0);
                changed.push(param);
            }
        }

        if changed.is_empty() {
            return Ok(SetOutcome::default());
        }

        let roots: Vec<NodeId> = changed.iter().map(|p| p.0).collect();
        let affected = match self.config.invalidation {
            InvalidationPolicy::Eager => self.graph.mark_dirty(&roots),
            InvalidationPolicy::Lazy => self
                .graph
                .transitive_dependents(&roots)
                .into_iter()
                .filter(|&id| self.graph.state(id) == Some(NodeState::Fresh))
                .collect(),
        };
        self.metrics.inc_invalidations(affected.len());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            changed = changed.len(),
            affected = affected.len(),
            "parameters written"
        );

        Ok(SetOutcome { changed, affected })
    }

    /* ──────────────────────── Derived values ──────────────────────── */

    /// Value of `c`, recomputing it (and whatever it reads) only if
    /// something it read last time has changed since.
    pub fn evaluate<T: Send + Sync + 'static>(&mut self, c: Computation<T>) -> DashResult<Arc<T>> {
        let value = self.evaluate_node(c.id)?;
        value
            .downcast::<T>()
            .map_err(|_| DashError::type_mismatch(self.graph.name(c.id).as_ref(), type_name::<T>()))
    }

    pub fn evaluate_by_name<T: Send + Sync + 'static>(&mut self, name: &str) -> DashResult<Arc<T>> {
        let c = self.computation::<T>(name)?;
        self.evaluate(c)
    }

    pub(crate) fn evaluate_node(&mut self, id: NodeId) -> DashResult<AnyValue> {
        let name = self.computation_name(id)?;
        if self.visiting.contains(&id) {
            return Err(self.cycle_error(id));
        }

        if self.is_up_to_date(id)
            && let Some(value) = self.cache.value(id)
        {
            self.metrics.inc_cache_hit();
            return Ok(value);
        }

        self.recompute(id, name)
    }

    fn is_up_to_date(&mut self, id: NodeId) -> bool {
        if self.graph.state(id) != Some(NodeState::Fresh) {
            return false;
        }
        match self.config.invalidation {
            InvalidationPolicy::Eager => {
                debug_assert!(
                    self.graph.snapshot_matches(id),
                    "fresh computation '{}' has a stale snapshot",
                    self.graph.name(id)
                );
                true
            }
            InvalidationPolicy::Lazy => self.verify_dependencies(id),
        }
    }

    /// Pull-mode validation: bring every computation `id` read up to date,
    /// then compare versions with the snapshot.
    fn verify_dependencies(&mut self, id: NodeId) -> bool {
        let deps: Dependencies = self.graph.dependencies(id).iter().copied().collect();
        self.visiting.push(id);
        let mut fresh = true;
        for dep in deps {
            let is_computation = self
                .graph
                .vertex(dep.node)
                .is_some_and(|v| v.is_computation());
            // A dependency that fails to refresh forces a rerun, which
            // surfaces the error if the dependency is still read.
            if is_computation && self.evaluate_node(dep.node).is_err() {
                fresh = false;
                break;
            }
            if self.graph.version(dep.node) != dep.seen_version {
                fresh = false;
                break;
            }
        }
        self.visiting.pop();
        fresh
    }

    fn recompute(&mut self, id: NodeId, name: Arc<str>) -> DashResult<AnyValue> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("recompute", computation = %name).entered();

        let func = match self.cache.slot_mut(id) {
            Some(slot) => {
                slot.runs += 1;
                slot.func.clone()
            }
            None => return Err(DashError::UnknownComputation(name.to_string())),
        };

        self.visiting.push(id);
        let timer = ComputeTimer::start();
        let mut cx = EvalContext::new(self, id, name.clone());
        let result = func(&mut cx);
        let reads = cx.into_reads();
        self.visiting.pop();

        match result {
            Ok(value) => {
                self.commit(id, reads, value.clone());
                self.metrics.record_recompute(timer.elapsed());
                if self.config.invalidation == InvalidationPolicy::Eager {
                    let outdated = self.graph.mark_outdated_readers(id);
                    self.metrics.inc_invalidations(outdated.len());
                }
                Ok(value)
            }
            Err(err) => {
                // Keep the previous value; leave the node retryable.
                if self.graph.state(id) == Some(NodeState::Fresh) {
                    self.graph.set_state(id, NodeState::Stale);
                }
                self.metrics.inc_failure();
                #[cfg(feature = "tracing")]
                tracing::warn!(computation = %name, error = %err, "computation failed");
                Err(err)
            }
        }
    }

    fn commit(&mut self, id: NodeId, reads: Dependencies, value: AnyValue) {
        let mut deps = reads;
        if let Some(slot) = self.cache.slot(id) {
            for &declared in &slot.declared {
                if !deps.iter().any(|d| d.node == declared) {
                    deps.push(Dependency {
                        node: declared,
                        seen_version: self.graph.version(declared),
                    });
                }
            }
        }
        self.graph.replace_dependencies(id, deps);
        self.graph.bump_version(id);
        self.graph.set_state(id, NodeState::Fresh);
        if let Some(slot) = self.cache.slot_mut(id) {
            slot.value = Some(value);
        }
    }

    fn cycle_error(&self, id: NodeId) -> DashError {
        let start = self.visiting.iter().position(|&v| v == id).unwrap_or(0);
        let mut path: Vec<String> = self.visiting[start..]
            .iter()
            .map(|&v| self.graph.name(v).to_string())
            .collect();
        path.push(self.graph.name(id).to_string());

        #[cfg(feature = "tracing")]
        tracing::error!(path = %path.join(" -> "), "cyclic dependency");

        DashError::CyclicDependency { path }
    }

    /// Last successfully computed value, without recomputation.
    pub fn cached<T: Send + Sync + 'static>(&self, c: Computation<T>) -> Option<Arc<T>> {
        self.cache.value(c.id)?.downcast::<T>().ok()
    }

    /// How many times the computation's function has been invoked.
    pub fn run_count<N: Into<NodeId>>(&self, id: N) -> u64 {
        self.cache.runs(id.into())
    }

    /* ───────────────────────── Invalidation ───────────────────────── */

    /// Force `id` and everything downstream of it to recompute on next use.
    pub fn invalidate<N: Into<NodeId>>(&mut self, id: N) -> DashResult<Vec<NodeId>> {
        let id = id.into();
        self.computation_name(id)?;
        let mut affected = Vec::new();
        if self.graph.state(id) == Some(NodeState::Fresh) {
            self.graph.set_state(id, NodeState::Stale);
            affected.push(id);
        }
        affected.extend(self.graph.mark_dirty(&[id]));
        self.metrics.inc_invalidations(affected.len());
        Ok(affected)
    }

    /// Mark every cached computation stale, e.g. after a configuration
    /// reload. Cached values stay readable through [`Session::cached`].
    pub fn invalidate_all(&mut self) -> Vec<NodeId> {
        let fresh: Vec<NodeId> = self
            .graph
            .computations()
            .filter(|&id| self.graph.state(id) == Some(NodeState::Fresh))
            .collect();
        for &id in &fresh {
            self.graph.set_state(id, NodeState::Stale);
        }
        self.metrics.inc_invalidations(fresh.len());
        fresh
    }

    /* ──────────────────────── Introspection ──────────────────────── */

    /// Lifecycle state as observed by the next `evaluate`.
    pub fn state<N: Into<NodeId>>(&self, id: N) -> DashResult<NodeState> {
        let id = id.into();
        let vertex = self
            .graph
            .vertex(id)
            .ok_or_else(|| DashError::UnknownComputation(format!("#{}", id.0)))?;
        match (self.config.invalidation, vertex.state) {
            (InvalidationPolicy::Lazy, NodeState::Fresh) if vertex.is_computation() => {
                let mut memo = FxHashMap::default();
                if self.pull_stale(id, &mut memo) {
                    Ok(NodeState::Stale)
                } else {
                    Ok(NodeState::Fresh)
                }
            }
            (_, state) => Ok(state),
        }
    }

    pub fn is_fresh<N: Into<NodeId>>(&self, id: N) -> bool {
        matches!(self.state(id), Ok(NodeState::Fresh))
    }

    /// Would evaluating `id` rerun its function under the pull policy?
    /// Exact because a successful rerun always bumps the version.
    fn pull_stale(&self, id: NodeId, memo: &mut FxHashMap<NodeId, bool>) -> bool {
        if let Some(&known) = memo.get(&id) {
            return known;
        }
        let stale = match self.graph.vertex(id) {
            None => true,
            Some(v) if !v.is_computation() => false,
            Some(v) if v.state != NodeState::Fresh => true,
            Some(v) => v.dependencies.iter().any(|dep| {
                self.pull_stale(dep.node, memo) || self.graph.version(dep.node) != dep.seen_version
            }),
        };
        memo.insert(id, stale);
        stale
    }

    /// Nodes `id` read during its last evaluation (plus declared ones).
    pub fn dependencies<N: Into<NodeId>>(&self, id: N) -> Vec<NodeId> {
        self.graph
            .dependencies(id.into())
            .iter()
            .map(|d| d.node)
            .collect()
    }

    /// Computations that read `id` during their last evaluation.
    pub fn dependents<N: Into<NodeId>>(&self, id: N) -> Vec<NodeId> {
        let mut out = self.graph.dependents(id.into()).to_vec();
        out.sort_unstable();
        out
    }

    /// Topological layers for `targets` and the computations they read.
    pub fn plan(&self, targets: &[NodeId]) -> Schedule {
        Scheduler::new(&self.graph).schedule_for(targets)
    }

    /// Bring every computation up to date in dependency order.
    ///
    /// Failures are counted rather than propagated so one broken output does
    /// not block the rest.
    pub fn evaluate_all(&mut self) -> EvalResult {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("evaluate_all").entered();
        let timer = ComputeTimer::start();

        let pending: Vec<NodeId> = self
            .graph
            .computations()
            .filter(|&id| !self.is_fresh(id))
            .collect();
        if pending.is_empty() {
            return EvalResult {
                computed: 0,
                failed: 0,
                elapsed: timer.elapsed(),
            };
        }

        let schedule = self.plan(&pending);
        let order: SmallVec<[NodeId; 16]> = schedule
            .order()
            .chain(schedule.cycles.iter().flatten().copied())
            .collect();

        let before = self.metrics.recomputations();
        let mut failed = 0;
        for id in order {
            if self.evaluate_node(id).is_err() {
                failed += 1;
            }
        }

        EvalResult {
            computed: self.metrics.recomputations() - before,
            failed,
            elapsed: timer.elapsed(),
        }
    }
}
