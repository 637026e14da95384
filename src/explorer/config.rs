use serde::{Deserialize, Serialize};

use crate::explorer::equivalence::HandlerMatch;
use crate::explorer::gate::GateConfig;

/// Configuration for one exploration run.
///
/// Loaded once at start (CLI > YAML > defaults) and handed to the explorer;
/// nothing here changes during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// URL the application is loaded from, and renavigated to after a
    /// branch leaves it.
    pub root_url: String,

    /// Stop registering new states once this many exist (default unbounded).
    #[serde(default)]
    pub max_states: Option<usize>,

    /// States first discovered at this depth are not expanded (default unbounded).
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Handler signature comparison used by the equivalence check.
    #[serde(default)]
    pub handler_match: HandlerMatch,

    #[serde(default)]
    pub gate: GateConfig,
}

impl ExplorerConfig {
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            ..Self::default()
        }
    }

    pub(crate) fn state_limit_reached(&self, registered: usize) -> bool {
        self.max_states.is_some_and(|max| registered >= max)
    }

    pub(crate) fn expands_at(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            root_url: String::new(),
            max_states: None,
            max_depth: None,
            handler_match: HandlerMatch::Exact,
            gate: GateConfig::default(),
        }
    }
}
