use std::collections::HashMap;
use std::ops::Index;

use crate::explorer::equivalence::{fingerprint, EquivalenceChecker};
use crate::model::snapshot::Snapshot;
use crate::model::state::{Context, State, StateId};

/// Arena of discovered states, indexed by sequential id.
///
/// Append-only: states are never removed, and once registered only the
/// `resolved_target` / `duplicate_count` fields of their records change.
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: Vec<State>,
    buckets: HashMap<String, Vec<StateId>>,
    checker: EquivalenceChecker,
}

impl StateRegistry {
    pub fn new(checker: EquivalenceChecker) -> Self {
        Self {
            states: Vec::new(),
            buckets: HashMap::new(),
            checker,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.get_mut(id.index())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }

    pub fn into_states(self) -> Vec<State> {
        self.states
    }

    /// First registered state equivalent to `(snapshot, context)`, by id order.
    pub fn find(&self, snapshot: &Snapshot, context: &Context) -> Option<StateId> {
        let key = fingerprint(snapshot, context);
        self.buckets.get(&key)?.iter().copied().find(|id| {
            let state = &self.states[id.index()];
            self.checker
                .equivalent(snapshot, context, &state.snapshot, &state.context)
        })
    }

    /// Register a new state under the next sequential id.
    pub fn register(&mut self, snapshot: Snapshot, context: Context) -> StateId {
        let id = StateId(self.states.len());
        self.buckets
            .entry(fingerprint(&snapshot, &context))
            .or_default()
            .push(id);
        self.states.push(State {
            id,
            snapshot,
            context,
        });
        id
    }

    /// Record that listener `index` of state `from` leads to `target`.
    /// Returns `false` if it was already resolved.
    pub fn resolve_edge(&mut self, from: StateId, index: usize, target: StateId) -> bool {
        self.states
            .get_mut(from.index())
            .and_then(|s| s.snapshot.get_mut(index))
            .is_some_and(|record| record.resolve(target))
    }
}

impl Index<StateId> for StateRegistry {
    type Output = State;

    fn index(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }
}
