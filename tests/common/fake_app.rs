use std::collections::{HashMap, HashSet};

use statechart_explorer::browser::driver::{FireOutcome, PageDriver};
use statechart_explorer::browser::error::DriverError;
use statechart_explorer::model::listener::ListenerRecord;
use statechart_explorer::model::snapshot::Snapshot;
use statechart_explorer::model::state::{ContextEntry, SidePayload, TriggerRecord};

pub const ROOT_URL: &str = "https://app.test/";
const ELSEWHERE_URL: &str = "https://elsewhere.test/";

/// A scripted application: a finite set of named DOM states, each with a
/// fixed listener list, and transitions keyed by `(state, selector, event)`.
/// Firing anything without a transition leaves the page where it is.
pub struct FakeApp {
    start: String,
    pages: HashMap<String, Vec<ListenerRecord>>,
    transitions: HashMap<(String, String, String), String>,
    off_origin: HashSet<String>,
    vanishing: HashSet<String>,
    current: String,
    url: String,

    pub fired: Vec<TriggerRecord>,
    pub reloads: usize,
    pub navigations: usize,
}

impl FakeApp {
    pub fn new(start: &str) -> Self {
        Self {
            start: start.to_string(),
            pages: HashMap::new(),
            transitions: HashMap::new(),
            off_origin: HashSet::new(),
            vanishing: HashSet::new(),
            current: start.to_string(),
            url: ROOT_URL.to_string(),
            fired: Vec::new(),
            reloads: 0,
            navigations: 0,
        }
    }

    pub fn page(mut self, name: &str, listeners: Vec<ListenerRecord>) -> Self {
        self.pages.insert(name.to_string(), listeners);
        self
    }

    /// `event` on `selector` in page `from` leads to page `to`. For select
    /// changes, `event` may be written `change=value`.
    pub fn on(mut self, from: &str, selector: &str, event: &str, to: &str) -> Self {
        self.transitions.insert(
            (from.to_string(), selector.to_string(), event.to_string()),
            to.to_string(),
        );
        self
    }

    /// Firing anything on `selector` navigates to another site.
    pub fn leaves_origin(mut self, selector: &str) -> Self {
        self.off_origin.insert(selector.to_string());
        self
    }

    /// `selector` shows up in snapshots but can never be found when firing.
    pub fn vanishes(mut self, selector: &str) -> Self {
        self.vanishing.insert(selector.to_string());
        self
    }

    pub fn current_page(&self) -> &str {
        &self.current
    }

    fn listeners(&self) -> &[ListenerRecord] {
        self.pages.get(&self.current).map(Vec::as_slice).unwrap_or(&[])
    }

    fn reset(&mut self) {
        self.current = self.start.clone();
        self.url = ROOT_URL.to_string();
    }
}

impl PageDriver for FakeApp {
    fn snapshot(&mut self) -> Result<Snapshot, DriverError> {
        Ok(Snapshot::new(self.listeners().to_vec()))
    }

    fn fire(&mut self, trigger: &TriggerRecord) -> Result<FireOutcome, DriverError> {
        self.fired.push(trigger.clone());

        let present = self
            .listeners()
            .iter()
            .any(|l| l.selector == trigger.selector && l.event == trigger.event);
        if !present || self.vanishing.contains(&trigger.selector) {
            return Ok(FireOutcome::stale());
        }

        if self.off_origin.contains(&trigger.selector) {
            self.url = ELSEWHERE_URL.to_string();
            self.current = "elsewhere".to_string();
            return Ok(FireOutcome::off_origin());
        }

        let event = match &trigger.payload {
            SidePayload::OptionValue { value } => format!("{}={}", trigger.event, value),
            _ => trigger.event.clone(),
        };
        let key = (self.current.clone(), trigger.selector.clone(), event);
        if let Some(to) = self.transitions.get(&key) {
            self.current = to.clone();
        }
        Ok(FireOutcome::fired())
    }

    fn reload(&mut self) -> Result<(), DriverError> {
        self.reloads += 1;
        self.reset();
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigations += 1;
        assert_eq!(url, ROOT_URL, "explorer should only ever navigate to the root");
        self.reset();
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    fn resolve_current_path(&mut self, entry: &ContextEntry) -> Result<Option<String>, DriverError> {
        Ok(self
            .listeners()
            .iter()
            .find(|l| l.selector == entry.selector && l.event == entry.event)
            .map(|l| l.path.clone()))
    }
}
