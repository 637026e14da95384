use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::listener::{ListenerRecord, SelectOption};
use crate::model::snapshot::Snapshot;

/// Sequential identifier of a discovered state. `0` is the rest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

impl StateId {
    pub const REST: StateId = StateId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Context ("where")
// ============================================================================

/// One currently-open enter/press interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub selector: String,
    pub path: String,
    pub event: String,
    pub handler: String,
}

impl ContextEntry {
    pub fn from_listener(listener: &ListenerRecord) -> Self {
        Self {
            selector: listener.selector.clone(),
            path: listener.path.clone(),
            event: listener.event.clone(),
            handler: listener.handler.clone(),
        }
    }
}

/// Open interactions, outermost first. Empty means the rest configuration.
pub type Context = Vec<ContextEntry>;

// ============================================================================
// State
// ============================================================================

/// A node of the inferred graph.
#[derive(Debug, Clone)]
pub struct State {
    pub id: StateId,
    pub snapshot: Snapshot,
    pub context: Context,
}

// ============================================================================
// Path history
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalCommand {
    Show,
    Hide,
}

/// Extra data the driver needs to re-fire a non-trivial event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SidePayload {
    #[default]
    None,
    /// Set the `<select>` value before dispatching `change`.
    OptionValue { value: String },
    /// Flip `checked` before dispatching `change`.
    CheckboxToggle,
    /// Show or hide the modal container after dispatch.
    ModalAction {
        selector: String,
        action: ModalCommand,
    },
    /// Move the brush on `selector` to `selection` instead of dispatching.
    BrushMove {
        selector: String,
        selection: [[f64; 2]; 2],
    },
}

/// One fired event on the root-to-state path, enough to replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRecord {
    pub selector: String,
    pub path: String,
    pub tag: String,
    #[serde(default)]
    pub select_option: Option<SelectOption>,
    pub event: String,
    #[serde(default)]
    pub payload: SidePayload,
}

impl TriggerRecord {
    pub fn new(listener: &ListenerRecord, payload: SidePayload) -> Self {
        Self {
            selector: listener.selector.clone(),
            path: listener.path.clone(),
            tag: listener.tag.clone(),
            select_option: listener.select_option.clone(),
            event: listener.event.clone(),
            payload,
        }
    }
}
