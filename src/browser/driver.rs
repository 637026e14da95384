use serde::{Deserialize, Serialize};

use crate::browser::error::DriverError;
use crate::model::snapshot::Snapshot;
use crate::model::state::{ContextEntry, TriggerRecord};

/// What happened when a trigger was fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireOutcome {
    /// The element was found and the event dispatched.
    pub resolved: bool,
    /// The page navigated as a result.
    pub redirected: bool,
    /// After any navigation, the page is still on the original origin.
    pub same_origin: bool,
}

impl FireOutcome {
    pub fn fired() -> Self {
        Self {
            resolved: true,
            redirected: false,
            same_origin: true,
        }
    }

    pub fn stale() -> Self {
        Self {
            resolved: false,
            redirected: false,
            same_origin: true,
        }
    }

    pub fn off_origin() -> Self {
        Self {
            resolved: true,
            redirected: true,
            same_origin: false,
        }
    }

    pub fn left_origin(&self) -> bool {
        self.redirected && !self.same_origin
    }
}

/// A live page the explorer can observe and act on.
///
/// Every call blocks until the page has settled; a settle wait that times
/// out counts as settled.
pub trait PageDriver {
    /// Currently bindable listeners, in deterministic discovery order.
    fn snapshot(&mut self) -> Result<Snapshot, DriverError>;

    /// Dispatch the trigger's event, applying its side payload.
    fn fire(&mut self, trigger: &TriggerRecord) -> Result<FireOutcome, DriverError>;

    /// Reload the current document.
    fn reload(&mut self) -> Result<(), DriverError>;

    /// Load `url` from scratch.
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    /// Path of the element the entry refers to in the live document, if it
    /// can still be found by selector, event and handler.
    fn resolve_current_path(&mut self, entry: &ContextEntry) -> Result<Option<String>, DriverError>;
}

impl<D: PageDriver + ?Sized> PageDriver for &mut D {
    fn snapshot(&mut self) -> Result<Snapshot, DriverError> {
        (**self).snapshot()
    }

    fn fire(&mut self, trigger: &TriggerRecord) -> Result<FireOutcome, DriverError> {
        (**self).fire(trigger)
    }

    fn reload(&mut self) -> Result<(), DriverError> {
        (**self).reload()
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        (**self).navigate(url)
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        (**self).current_url()
    }

    fn resolve_current_path(&mut self, entry: &ContextEntry) -> Result<Option<String>, DriverError> {
        (**self).resolve_current_path(entry)
    }
}

/// Same scheme and host.
pub fn is_same_origin(base: &str, candidate: &str) -> bool {
    match (extract_origin(base), extract_origin(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn extract_origin(url: &str) -> Option<&str> {
    let after_scheme = url.find("://").map(|i| i + 3)?;
    let end = url[after_scheme..]
        .find('/')
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    Some(&url[..end])
}
