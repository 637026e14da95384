use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::model::listener::{path_prefix, ListenerRecord};
use crate::model::snapshot::Snapshot;
use crate::model::state::{Context, ContextEntry};

// ============================================================================
// Handler comparison policy
// ============================================================================

/// How handler signatures are compared between snapshot positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HandlerMatch {
    /// Signatures must be identical.
    #[default]
    Exact,
    /// Numeric placeholder signatures (see `is_numeric`) match anything;
    /// two differing non-numeric signatures still differ.
    Loose,
}

impl HandlerMatch {
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            HandlerMatch::Exact => a == b,
            HandlerMatch::Loose => a == b || is_numeric(a) || is_numeric(b),
        }
    }
}

/// Numeric in the loose, script-engine sense: blank, a finite decimal, or
/// `Infinity`. `NaN` and the `inf` spellings Rust would accept are not.
/// Hex and other radix literals are not recognised.
fn is_numeric(signature: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return true;
    }
    if matches!(signature, "Infinity" | "+Infinity" | "-Infinity") {
        return true;
    }
    signature.parse::<f64>().is_ok_and(f64::is_finite)
}

// ============================================================================
// Equivalence
// ============================================================================

/// Decides whether two (snapshot, context) pairs describe the same
/// configuration of the application.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquivalenceChecker {
    handler_match: HandlerMatch,
}

impl EquivalenceChecker {
    pub fn new(handler_match: HandlerMatch) -> Self {
        Self { handler_match }
    }

    pub fn equivalent(
        &self,
        snapshot: &Snapshot,
        context: &Context,
        other_snapshot: &Snapshot,
        other_context: &Context,
    ) -> bool {
        contexts_equal(context, other_context) && self.snapshots_equivalent(snapshot, other_snapshot)
    }

    /// Positional comparison. Attributes, styles, framework data, gesture
    /// payloads and the draggable flag are ignored.
    pub fn snapshots_equivalent(&self, a: &Snapshot, b: &Snapshot) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| self.records_equivalent(x, y))
    }

    fn records_equivalent(&self, a: &ListenerRecord, b: &ListenerRecord) -> bool {
        (a.selector == b.selector || a.path_prefix() == b.path_prefix())
            && a.event == b.event
            && self.handler_match.matches(&a.handler, &b.handler)
            && a.modal_open == b.modal_open
            && a.toggle_open == b.toggle_open
            && a.select_option == b.select_option
    }
}

/// Same length, and at every position the same selector, path prefix, event
/// and handler signature.
pub fn contexts_equal(a: &Context, b: &Context) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| entries_equal(x, y))
}

fn entries_equal(a: &ContextEntry, b: &ContextEntry) -> bool {
    a.selector == b.selector
        && path_prefix(&a.path) == path_prefix(&b.path)
        && a.event == b.event
        && a.handler == b.handler
}

// ============================================================================
// Fingerprint
// ============================================================================

/// Hash of the parts of a configuration that every equivalence policy
/// compares exactly. Equivalent configurations always share a fingerprint,
/// so it can bucket candidates before the positional check.
pub fn fingerprint(snapshot: &Snapshot, context: &Context) -> String {
    let mut hasher = Sha1::new();

    hasher.update(snapshot.len().to_le_bytes());
    for record in snapshot.iter() {
        hasher.update(record.event.as_bytes());
        hasher.update([0, record.modal_open as u8]);
        hasher.update(match record.toggle_open {
            None => [0u8],
            Some(false) => [1],
            Some(true) => [2],
        });
        if let Some(option) = &record.select_option {
            hasher.update(serde_json::to_vec(option).unwrap_or_default());
        }
        hasher.update([0xff]);
    }

    hasher.update(context.len().to_le_bytes());
    for entry in context {
        for part in [
            entry.selector.as_str(),
            path_prefix(&entry.path),
            entry.event.as_str(),
            entry.handler.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0]);
        }
    }

    format!("{:x}", hasher.finalize())
}
