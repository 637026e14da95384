use crate::model::events::{closes_exactly, closes_loosely, EventClass};
use crate::model::snapshot::Snapshot;
use crate::model::state::{Context, ContextEntry};

/// An exit was attempted while a nested interaction that needs its own exit
/// is still open. The branch is pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBranch;

/// Context after firing `snapshot[index]` from `context`.
///
/// Exit events unwind through their matching entry, enter and press events
/// push a new entry, everything else leaves the context untouched. A press
/// that drives a brush never opens a scope.
pub fn next_context(
    context: &Context,
    snapshot: &Snapshot,
    index: usize,
) -> Result<Context, InvalidBranch> {
    let listener = &snapshot[index];
    let class = EventClass::of(&listener.event);

    if class.closes_scope() {
        let Some(open) = context
            .iter()
            .rposition(|e| e.selector == listener.selector && closes_exactly(&e.event, &listener.event))
        else {
            return Ok(context.clone());
        };

        let blocked = context[open + 1..].iter().any(|inner| {
            snapshot.element_has(&inner.selector, &inner.path, |e| closes_exactly(&inner.event, e))
        });
        if blocked {
            return Err(InvalidBranch);
        }

        return Ok(context[..open].to_vec());
    }

    if class.opens_scope() && listener.brush().is_none() {
        let mut next = context.clone();
        next.push(ContextEntry::from_listener(listener));
        return Ok(next);
    }

    Ok(context.clone())
}

/// Final context of a freshly observed configuration.
///
/// An enter or press that created no new listeners and has no way back out
/// on the same element is momentary: the configuration is
/// still the one it was fired from.
pub fn settled_context(
    branch: Context,
    current: &Context,
    before: &Snapshot,
    index: usize,
    after: &Snapshot,
) -> Context {
    let listener = &before[index];

    if !EventClass::of(&listener.event).opens_scope() {
        return branch;
    }
    if listener.brush().is_some() {
        return current.clone();
    }

    let grew = after.real_len() != before.real_len();
    let has_exit = before.element_has(&listener.selector, &listener.path, |e| {
        closes_loosely(&listener.event, e)
    });

    if !grew && !has_exit {
        current.clone()
    } else {
        branch
    }
}
