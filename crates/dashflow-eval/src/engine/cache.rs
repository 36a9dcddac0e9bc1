//! Memoized computation results

use dashflow_common::DashResult;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::any::{Any, TypeId};
use std::sync::Arc;

use super::context::EvalContext;
use super::vertex::NodeId;

/// Type-erased cached value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Type-erased computation function.
pub(crate) type ComputeFn = dyn Fn(&mut EvalContext<'_>) -> DashResult<AnyValue> + Send + Sync;

pub(crate) struct ComputationSlot {
    pub func: Arc<ComputeFn>,
    pub value: Option<AnyValue>,
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Dependencies declared at registration; kept on every re-record.
    pub declared: SmallVec<[NodeId; 4]>,
    /// How many times `func` has been invoked, successful or not.
    pub runs: u64,
}

impl std::fmt::Debug for ComputationSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationSlot")
            .field("type_name", &self.type_name)
            .field("cached", &self.value.is_some())
            .field("declared", &self.declared)
            .field("runs", &self.runs)
            .finish()
    }
}

/// Results of every computation in a session, keyed by node.
#[derive(Debug, Default)]
pub struct DerivedCache {
    slots: FxHashMap<NodeId, ComputationSlot>,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: NodeId, slot: ComputationSlot) {
        self.slots.insert(id, slot);
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&ComputationSlot> {
        self.slots.get(&id)
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut ComputationSlot> {
        self.slots.get_mut(&id)
    }

    pub fn value(&self, id: NodeId) -> Option<AnyValue> {
        self.slots.get(&id).and_then(|s| s.value.clone())
    }

    pub fn runs(&self, id: NodeId) -> u64 {
        self.slots.get(&id).map(|s| s.runs).unwrap_or(0)
    }

    pub fn type_id(&self, id: NodeId) -> Option<TypeId> {
        self.slots.get(&id).map(|s| s.type_id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
