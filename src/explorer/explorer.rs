use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::driver::PageDriver;
use crate::browser::error::DriverError;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::context::{next_context, settled_context, InvalidBranch};
use crate::explorer::equivalence::EquivalenceChecker;
use crate::explorer::gate::{GateDecision, SkipReason, TriggerGate};
use crate::explorer::registry::StateRegistry;
use crate::model::state::{State, StateId, TriggerRecord};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{now_ms, TraceEvent};

// ============================================================================
// Results
// ============================================================================

/// What visiting one listener led to.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    /// Rejected by the trigger gate; left unresolved.
    Skipped(SkipReason),
    /// Pan/drag gesture, resolved to the current state without firing.
    Noop,
    /// Exit fired while a nested interaction was still open.
    InvalidBranch,
    /// The element could not be found when firing.
    Stale,
    /// Firing navigated away from the application's origin.
    OffOrigin,
    /// Led to an already-registered state.
    Existing(StateId),
    /// Led to a state registered just now.
    New(StateId),
    /// Would need a new state but the state limit is reached.
    LimitReached,
}

impl BranchOutcome {
    fn label(&self) -> &'static str {
        match self {
            BranchOutcome::Skipped(_) => "skipped",
            BranchOutcome::Noop => "noop",
            BranchOutcome::InvalidBranch => "invalid_branch",
            BranchOutcome::Stale => "stale",
            BranchOutcome::OffOrigin => "off_origin",
            BranchOutcome::Existing(_) => "existing",
            BranchOutcome::New(_) => "new",
            BranchOutcome::LimitReached => "limit_reached",
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExplorationReport {
    pub started_at_ms: u128,
    pub finished_at_ms: u128,
    pub states: usize,
    pub resolved_edges: usize,
    pub skipped: usize,
    pub noops: usize,
    pub stale: usize,
    pub off_origin: usize,
    pub invalid_branches: usize,
}

impl ExplorationReport {
    fn count(&mut self, outcome: &BranchOutcome) {
        match outcome {
            BranchOutcome::Skipped(_) | BranchOutcome::LimitReached => self.skipped += 1,
            BranchOutcome::Noop => {
                self.noops += 1;
                self.resolved_edges += 1;
            }
            BranchOutcome::InvalidBranch => self.invalid_branches += 1,
            BranchOutcome::Stale => self.stale += 1,
            BranchOutcome::OffOrigin => self.off_origin += 1,
            BranchOutcome::Existing(_) | BranchOutcome::New(_) => self.resolved_edges += 1,
        }
    }

    pub fn duration_ms(&self) -> u128 {
        self.finished_at_ms.saturating_sub(self.started_at_ms)
    }
}

/// Registered states (in id order) plus the run's report.
#[derive(Debug)]
pub struct Exploration {
    pub states: Vec<State>,
    pub report: ExplorationReport,
}

// ============================================================================
// Explorer
// ============================================================================

/// One state being expanded.
#[derive(Debug)]
struct Frame {
    state: StateId,
    /// Triggers from the root to this state.
    history: Vec<TriggerRecord>,
    /// Next listener to visit.
    cursor: usize,
    /// The page has moved on from this state and must be restored before
    /// the next firing.
    needs_restore: bool,
    entry_url: String,
    depth: usize,
}

/// Depth-first inference of the application's statechart.
pub struct Explorer<D: PageDriver> {
    config: ExplorerConfig,
    gate: TriggerGate,
    registry: StateRegistry,
    driver: D,
    tracer: TraceLogger,
    report: ExplorationReport,
    step: u64,
}

impl<D: PageDriver> Explorer<D> {
    pub fn new(config: ExplorerConfig, driver: D) -> Self {
        let gate = TriggerGate::new(config.gate.clone());
        let registry = StateRegistry::new(EquivalenceChecker::new(config.handler_match));
        Self {
            config,
            gate,
            registry,
            driver,
            tracer: TraceLogger::disabled(),
            report: ExplorationReport::default(),
            step: 0,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    /// Explore from the root URL until every reachable listener has been
    /// visited. Only driver failures abort the run.
    pub fn run(mut self) -> Result<Exploration, DriverError> {
        self.report.started_at_ms = now_ms();

        self.driver.navigate(&self.config.root_url)?;
        let snapshot = self.driver.snapshot()?;
        let rest = self.registry.register(snapshot, Vec::new());
        info!(state = %rest, listeners = self.registry[rest].snapshot.len(), "rest state registered");

        let mut stack = vec![Frame {
            state: rest,
            history: Vec::new(),
            cursor: 0,
            needs_restore: false,
            entry_url: self.driver.current_url()?,
            depth: 0,
        }];

        while let Some(mut frame) = stack.pop() {
            if frame.cursor >= self.registry[frame.state].snapshot.len() {
                debug!(state = %frame.state, "state fully explored");
                continue;
            }
            let index = frame.cursor;
            frame.cursor += 1;

            let (outcome, child) = self.visit(&mut frame, index)?;
            self.report.count(&outcome);
            self.trace(&frame, index, &outcome);

            stack.push(frame);
            if let Some(child) = child {
                stack.push(child);
            }
        }

        self.report.states = self.registry.len();
        self.report.finished_at_ms = now_ms();
        info!(
            states = self.report.states,
            edges = self.report.resolved_edges,
            skipped = self.report.skipped,
            "exploration finished"
        );

        Ok(Exploration {
            states: self.registry.into_states(),
            report: self.report,
        })
    }

    fn visit(
        &mut self,
        frame: &mut Frame,
        index: usize,
    ) -> Result<(BranchOutcome, Option<Frame>), DriverError> {
        let state = &self.registry[frame.state];
        let listener = &state.snapshot[index];

        let payload = match self.gate.evaluate(&state.snapshot, index, &state.context, &frame.history) {
            GateDecision::Skip(reason) => {
                debug!(state = %frame.state, index, listener = %listener.label(), %reason, "listener skipped");
                return Ok((BranchOutcome::Skipped(reason), None));
            }
            GateDecision::Noop => {
                debug!(state = %frame.state, index, listener = %listener.label(), "gesture resolves to current state");
                self.registry.resolve_edge(frame.state, index, frame.state);
                return Ok((BranchOutcome::Noop, None));
            }
            GateDecision::Fire(payload) => payload,
        };

        let branch = match next_context(&state.context, &state.snapshot, index) {
            Ok(context) => context,
            Err(InvalidBranch) => {
                warn!(state = %frame.state, index, listener = %listener.label(), "exit would leave a nested interaction open, pruning branch");
                return Ok((BranchOutcome::InvalidBranch, None));
            }
        };
        let trigger = TriggerRecord::new(listener, payload);

        if frame.needs_restore {
            self.restore(frame)?;
        }
        frame.needs_restore = true;

        let fired = self.driver.fire(&trigger)?;
        if !fired.resolved {
            warn!(state = %frame.state, index, selector = %trigger.selector, path = %trigger.path, "element no longer resolvable, skipping");
            return Ok((BranchOutcome::Stale, None));
        }
        if fired.left_origin() {
            warn!(state = %frame.state, index, selector = %trigger.selector, "event navigated off origin, abandoning branch");
            return Ok((BranchOutcome::OffOrigin, None));
        }

        let after = self.driver.snapshot()?;
        let state = &self.registry[frame.state];
        let mut context = settled_context(branch, &state.context, &state.snapshot, index, &after);

        if let Some(existing) = self.registry.find(&after, &context) {
            self.registry.resolve_edge(frame.state, index, existing);
            debug!(state = %frame.state, index, target = %existing, "leads to existing state");
            return Ok((BranchOutcome::Existing(existing), None));
        }

        for entry in context.iter_mut() {
            if let Some(path) = self.driver.resolve_current_path(entry)? {
                entry.path = path;
            }
        }

        if self.config.state_limit_reached(self.registry.len()) {
            warn!(state = %frame.state, index, max_states = ?self.config.max_states, "state limit reached, leaving edge unresolved");
            return Ok((BranchOutcome::LimitReached, None));
        }

        let depth = frame.depth + 1;
        let id = self.registry.register(after, context);
        self.registry.resolve_edge(frame.state, index, id);
        info!(
            state = %id,
            from = %frame.state,
            event = %trigger.event,
            selector = %trigger.selector,
            depth,
            listeners = self.registry[id].snapshot.len(),
            "new state"
        );

        if !self.config.expands_at(depth) {
            info!(state = %id, depth, "depth limit reached, state not expanded");
            return Ok((BranchOutcome::New(id), None));
        }

        let mut history = frame.history.clone();
        history.push(trigger);
        let child = Frame {
            state: id,
            history,
            cursor: 0,
            needs_restore: false,
            entry_url: self.driver.current_url()?,
            depth,
        };
        Ok((BranchOutcome::New(id), Some(child)))
    }

    /// Bring the page back to `frame`'s configuration: reload (or renavigate
    /// if the page has left the frame's URL) and replay the path history.
    fn restore(&mut self, frame: &Frame) -> Result<(), DriverError> {
        let url = self.driver.current_url()?;
        if url != frame.entry_url {
            debug!(state = %frame.state, from = %url, "renavigating before replay");
            self.driver.navigate(&self.config.root_url)?;
        } else {
            debug!(state = %frame.state, "reloading before replay");
            self.driver.reload()?;
        }

        for trigger in &frame.history {
            let outcome = self.driver.fire(trigger)?;
            if !outcome.resolved {
                warn!(selector = %trigger.selector, event = %trigger.event, "stale element during replay");
            } else if outcome.left_origin() {
                warn!(selector = %trigger.selector, event = %trigger.event, "replay navigated off origin");
            }
        }
        Ok(())
    }

    fn trace(&mut self, frame: &Frame, index: usize, outcome: &BranchOutcome) {
        self.step += 1;
        if !self.tracer.is_enabled() {
            return;
        }

        let mut event = TraceEvent::now(self.step, frame.state)
            .with_listener(index, &self.registry[frame.state].snapshot[index])
            .with_decision(outcome.label());
        match outcome {
            BranchOutcome::Existing(target) | BranchOutcome::New(target) => {
                event = event.with_target(*target);
            }
            BranchOutcome::Noop => event = event.with_target(frame.state),
            BranchOutcome::Skipped(reason) => event = event.with_reason(reason),
            _ => {}
        }
        self.tracer.log(&event);
    }
}
