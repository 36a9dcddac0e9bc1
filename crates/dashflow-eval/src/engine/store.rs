use dashflow_common::{DashError, DashResult, Domain, ParamValue};
use rustc_hash::FxHashMap;

use super::vertex::{NodeId, ParamId};

#[derive(Debug, Clone)]
pub struct ParamSlot {
    pub value: ParamValue,
    pub domain: Domain,
}

/// Current values of every parameter in a session.
///
/// Versions live on the graph vertices so that parameters and computations
/// share one snapshot format; the store only owns values and domains.
#[derive(Debug, Default)]
pub struct InputStore {
    slots: FxHashMap<NodeId, ParamSlot>,
}

impl InputStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: NodeId, value: ParamValue, domain: Domain) {
        self.slots.insert(id, ParamSlot { value, domain });
    }

    pub fn get(&self, id: NodeId) -> Option<&ParamValue> {
        self.slots.get(&id).map(|s| &s.value)
    }

    pub fn domain(&self, id: NodeId) -> Option<&Domain> {
        self.slots.get(&id).map(|s| &s.domain)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Validate `value` for the slot at `id`.
    ///
    /// Returns whether storing it would change the current value. The caller
    /// has already resolved `id` to a parameter.
    pub(crate) fn check(&self, id: NodeId, name: &str, value: &ParamValue) -> DashResult<bool> {
        match self.slots.get(&id) {
            Some(slot) => {
                slot.domain.validate(name, value)?;
                Ok(!slot.value.same_as(value))
            }
            None => Err(DashError::UnknownParameter(name.to_string())),
        }
    }

    /// Store a value that already passed [`InputStore::check`].
    pub(crate) fn replace(&mut self, id: NodeId, value: ParamValue) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.value = value;
        }
    }
}

/// What a write did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    /// Parameters whose value actually changed (version bumped).
    pub changed: Vec<ParamId>,
    /// Computations downstream of the changed parameters.
    pub affected: Vec<NodeId>,
}

impl SetOutcome {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
