use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::listener::ListenerRecord;
use crate::model::state::StateId;

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// One visited listener during exploration.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub state: usize,
    pub listener_index: Option<usize>,
    pub event: Option<String>,
    pub selector: Option<String>,
    pub path: Option<String>,

    pub decision: Option<String>,
    pub target_state: Option<usize>,
    pub reason: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, state: StateId) -> Self {
        Self {
            timestamp_ms: now_ms(),
            step,
            state: state.index(),
            listener_index: None,
            event: None,
            selector: None,
            path: None,
            decision: None,
            target_state: None,
            reason: None,
        }
    }

    pub fn with_listener(mut self, index: usize, listener: &ListenerRecord) -> Self {
        self.listener_index = Some(index);
        self.event = Some(listener.event.clone());
        self.selector = Some(listener.selector.clone());
        self.path = Some(listener.path.clone());
        self
    }

    pub fn with_decision(mut self, decision: impl ToString) -> Self {
        self.decision = Some(decision.to_string());
        self
    }

    pub fn with_target(mut self, target: StateId) -> Self {
        self.target_state = Some(target.index());
        self
    }

    pub fn with_reason(mut self, reason: impl ToString) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}
