use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::events::{closes_loosely, EventClass};
use crate::model::state::StateId;
use crate::statechart::chart::{ChartListener, StateChart};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentOptions {
    /// Only consider entries whose firing left the number of listeners
    /// unchanged between origin and target.
    #[serde(default)]
    pub require_equal_length: bool,
}

/// Enter, over and press events: the ones that can leave the page inside a
/// scope with no observed way out.
fn is_entry(event: &str) -> bool {
    EventClass::of(event).opens_scope()
}

/// Add silent-return edges for every unmatched entry, and propagate each one
/// to every state reachable from the entry's target without crossing another
/// entry. Returns the number of edges added.
pub fn augment(chart: &mut StateChart, options: AugmentOptions) -> usize {
    let candidates: Vec<(StateId, ChartListener)> = chart
        .states()
        .iter()
        .flat_map(|state| {
            state
                .ieo
                .iter()
                .filter(|l| !l.is_synthetic() && is_entry(&l.event))
                .map(move |l| (state.id, l.clone()))
        })
        .collect();

    let mut added = 0;
    for (origin, entry) in candidates {
        let Some(target) = entry.leads_to().filter(|t| *t != origin) else {
            continue;
        };
        let (Some(from), Some(to)) = (chart.state(origin), chart.state(target)) else {
            continue;
        };

        if options.require_equal_length && from.real_len() != to.real_len() {
            continue;
        }
        let has_exit = to
            .ieo
            .iter()
            .any(|l| l.selector == entry.selector && closes_loosely(&entry.event, &l.event));
        if has_exit {
            continue;
        }

        let back = entry.silent_return(origin);
        debug!(origin = %origin, target = %target, selector = %entry.selector, "unmatched entry, adding silent return");
        added += propagate(chart, origin, target, &back);
    }
    added
}

fn propagate(chart: &mut StateChart, origin: StateId, target: StateId, back: &ChartListener) -> usize {
    let mut visited: HashSet<StateId> = HashSet::from([origin, target]);
    let mut pending = vec![target];
    let mut added = usize::from(insert(chart, target, back));

    while let Some(current) = pending.pop() {
        let next: Vec<StateId> = match chart.state(current) {
            Some(state) => state
                .ieo
                .iter()
                .filter(|l| !l.is_synthetic() && !is_entry(&l.event))
                .filter_map(ChartListener::leads_to)
                .filter(|to| *to != current)
                .collect(),
            None => continue,
        };

        for to in next {
            if visited.insert(to) {
                added += usize::from(insert(chart, to, back));
                pending.push(to);
            }
        }
    }
    added
}

/// Append `back` unless an identical return edge is already there.
fn insert(chart: &mut StateChart, state: StateId, back: &ChartListener) -> bool {
    let Some(state) = chart.state_mut(state) else {
        return false;
    };
    let present = state.ieo.iter().any(|l| {
        l.is_synthetic()
            && l.selector == back.selector
            && l.path == back.path
            && l.leads_to_state == back.leads_to_state
    });
    if !present {
        state.ieo.push(back.clone());
    }
    !present
}
