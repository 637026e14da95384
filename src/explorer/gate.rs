use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::events::{is_enter, is_leave, EventClass};
use crate::model::listener::{truthy, BrushInfo, ListenerRecord};
use crate::model::snapshot::Snapshot;
use crate::model::state::{Context, ModalCommand, SidePayload, TriggerRecord};

// ============================================================================
// Decisions
// ============================================================================

/// Configuration threaded into the gate at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Element ids that act as modal containers even without the `modal` class.
    #[serde(default)]
    pub modal_ids: Vec<String>,
}

/// Why an element cannot be interacted with right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inaccessibility {
    Disabled,
    CollapsedOption,
    AriaDisabled,
    AriaSelected,
    CheckedRadio,
    InactiveTab,
    HiddenStyle,
    DisabledAncestor,
    HiddenAncestor,
    ClosedDisclosure,
    ModalMismatch,
}

/// Why a listener was not fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inaccessible(Inaccessibility),
    /// Not inside the innermost open interaction.
    Unreachable,
    /// Enter/leave or press/release ordering forbids it on this path.
    OutOfOrder,
    /// Select option already selected or disabled.
    OptionUnavailable,
    /// `change` on an input whose kind is not recognised.
    UnresolvedInputKind,
    /// `change` on an element that cannot carry a value.
    UnsupportedChangeTarget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Inaccessible(why) => write!(f, "inaccessible ({why:?})"),
            SkipReason::Unreachable => write!(f, "unreachable from current context"),
            SkipReason::OutOfOrder => write!(f, "out of order on this path"),
            SkipReason::OptionUnavailable => write!(f, "option already selected or disabled"),
            SkipReason::UnresolvedInputKind => write!(f, "unrecognised input kind"),
            SkipReason::UnsupportedChangeTarget => write!(f, "element does not support change"),
        }
    }
}

/// Outcome of gating one listener.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Leave the listener unresolved.
    Skip(SkipReason),
    /// Pan/drag style gesture: resolves to the current state without firing.
    Noop,
    /// Fire the event with this payload.
    Fire(SidePayload),
}

impl GateDecision {
    pub fn is_triggerable(&self) -> bool {
        matches!(self, GateDecision::Fire(_))
    }
}

// ============================================================================
// TriggerGate
// ============================================================================

const FREE_INPUT_KINDS: &[&str] = &[
    "color",
    "date",
    "datetime",
    "datetime-local",
    "email",
    "file",
    "month",
    "number",
    "password",
    "range",
    "search",
    "tel",
    "text",
    "time",
    "url",
    "week",
];

/// Decides, per listener, whether it can be fired from the current
/// configuration and with which side payload.
#[derive(Debug, Clone, Default)]
pub struct TriggerGate {
    config: GateConfig,
}

impl TriggerGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(
        &self,
        snapshot: &Snapshot,
        index: usize,
        context: &Context,
        history: &[TriggerRecord],
    ) -> GateDecision {
        let listener = &snapshot[index];

        if let Some(why) = self.inaccessible(snapshot, index) {
            return GateDecision::Skip(SkipReason::Inaccessible(why));
        }
        if !is_reachable(listener, context) {
            return GateDecision::Skip(SkipReason::Unreachable);
        }
        if !in_order(snapshot, index, history) {
            return GateDecision::Skip(SkipReason::OutOfOrder);
        }

        match listener.event.as_str() {
            "change" => match change_payload(listener) {
                Ok(payload) => GateDecision::Fire(payload),
                Err(reason) => GateDecision::Skip(reason),
            },
            "mousedown" => press_decision(listener),
            "click" => GateDecision::Fire(click_payload(listener)),
            _ => GateDecision::Fire(SidePayload::None),
        }
    }

    /// First reason the element is currently not interactable, if any.
    pub fn inaccessible(&self, snapshot: &Snapshot, index: usize) -> Option<Inaccessibility> {
        let listener = &snapshot[index];

        let is_radio = listener.attribute("type") == Some("radio");
        for attr in &listener.attributes {
            match attr.name.as_str() {
                // Boolean attributes: presence alone disables, whatever the value.
                "disabled" | "hidden" => {
                    return Some(Inaccessibility::Disabled);
                }
                "aria-expanded_parent" if attr.value == "false" => {
                    return Some(Inaccessibility::CollapsedOption);
                }
                "aria-disabled" if attr.value == "true" => {
                    return Some(Inaccessibility::AriaDisabled);
                }
                "aria-selected" if attr.value == "true" => {
                    return Some(Inaccessibility::AriaSelected);
                }
                "selected" if is_radio && truthy(&attr.value) => {
                    return Some(Inaccessibility::CheckedRadio);
                }
                "aria-expanded_tab" if attr.value == "false" => {
                    return Some(Inaccessibility::InactiveTab);
                }
                _ => {}
            }
        }

        if listener.styles.iter().any(|s| hides(&s.name, &s.value)) {
            return Some(Inaccessibility::HiddenStyle);
        }

        if listener.has_class("disabled") {
            return Some(Inaccessibility::Disabled);
        }
        let mut in_modal = listener.has_class("modal") || self.is_modal_id(listener.id.as_deref());

        for (k, ancestor) in listener.ancestors.iter().enumerate() {
            if !in_modal && (ancestor.has_class("modal") || self.is_modal_id(ancestor.id.as_deref()))
            {
                in_modal = true;
            } else if ancestor.has_class("disabled") {
                return Some(Inaccessibility::DisabledAncestor);
            }

            if ancestor.hidden
                || hides("visibility", &ancestor.visibility)
                || hides("display", &ancestor.display)
                || hides("clip-path", &ancestor.clip_path)
                || hides("transform", &ancestor.transform)
            {
                return Some(Inaccessibility::HiddenAncestor);
            }

            if ancestor.tag == "details" {
                let selector = listener.ancestor_selector(k);
                let closed = snapshot
                    .on_element(&selector, &ancestor.path)
                    .any(|r| r.toggle_open == Some(false));
                if closed {
                    return Some(Inaccessibility::ClosedDisclosure);
                }
            }
        }

        if listener.modal_open != in_modal {
            return Some(Inaccessibility::ModalMismatch);
        }

        None
    }

    fn is_modal_id(&self, id: Option<&str>) -> bool {
        id.is_some_and(|id| self.config.modal_ids.iter().any(|m| m == id))
    }
}

/// Computed or inline style values that make an element invisible or
/// unreachable by the pointer.
fn hides(name: &str, value: &str) -> bool {
    match name {
        "visibility" => value == "hidden",
        "display" => value == "none",
        "clip-path" => value == "circle(0px at 50% 50%)",
        "transform" => {
            value == "matrix(0, 0, 0, 0, 0, 0)" || value == "matrix(1, 0, 0, 1, -999, 0)"
        }
        _ => false,
    }
}

// ============================================================================
// Reachability
// ============================================================================

/// The element is the innermost open interaction or sits inside it.
pub fn is_reachable(listener: &ListenerRecord, context: &Context) -> bool {
    let Some(last) = context.last() else {
        return true;
    };

    if listener.is_element(&last.selector, &last.path) {
        return true;
    }

    listener
        .ancestor_keys()
        .any(|(selector, path)| selector == last.selector && path == last.path)
}

// ============================================================================
// Ordering
// ============================================================================

/// Last enter- or leave-class event fired on `selector` along the path.
fn last_hover(history: &[TriggerRecord], selector: &str) -> Option<EventClass> {
    history
        .iter()
        .rev()
        .filter(|t| t.selector == selector)
        .map(|t| EventClass::of(&t.event))
        .find(|c| matches!(c, EventClass::Enter | EventClass::Leave))
}

fn ever_fired(history: &[TriggerRecord], selector: &str, pred: impl Fn(&str) -> bool) -> bool {
    history
        .iter()
        .any(|t| t.selector == selector && pred(&t.event))
}

/// Whether the listener's ordering constraints allow firing it after
/// `history`: every hover-capable ancestor must currently be entered, and
/// the element's own enter/leave/press/release state must permit the event.
pub fn in_order(snapshot: &Snapshot, index: usize, history: &[TriggerRecord]) -> bool {
    let listener = &snapshot[index];

    for (selector, path) in listener.ancestor_keys() {
        if !snapshot.element_has(&selector, path, is_enter) {
            continue;
        }
        let inside = if snapshot.element_has(&selector, path, is_leave) {
            last_hover(history, &selector) == Some(EventClass::Enter)
        } else {
            ever_fired(history, &selector, is_enter)
        };
        if !inside {
            return false;
        }
    }

    let selector = listener.selector.as_str();
    let path = listener.path.as_str();
    match EventClass::of(&listener.event) {
        EventClass::Enter => enter_in_order(snapshot, selector, path, history),
        EventClass::Press => press_in_order(snapshot, selector, path, history),
        EventClass::Release => release_in_order(snapshot, selector, path, history),
        EventClass::Leave | EventClass::Simple => simple_in_order(snapshot, selector, path, history),
    }
}

fn enter_in_order(snapshot: &Snapshot, selector: &str, path: &str, history: &[TriggerRecord]) -> bool {
    if snapshot.element_has(selector, path, is_leave) {
        last_hover(history, selector) != Some(EventClass::Enter)
    } else {
        // No way back out: enter at most once per path.
        !ever_fired(history, selector, is_enter)
    }
}

fn simple_in_order(snapshot: &Snapshot, selector: &str, path: &str, history: &[TriggerRecord]) -> bool {
    if snapshot.element_has(selector, path, is_enter) {
        last_hover(history, selector) == Some(EventClass::Enter)
    } else {
        true
    }
}

fn press_in_order(snapshot: &Snapshot, selector: &str, path: &str, history: &[TriggerRecord]) -> bool {
    if snapshot.element_has(selector, path, |e| e == "mouseup") {
        let last = history
            .iter()
            .rev()
            .filter(|t| t.selector == selector)
            .find(|t| t.event == "mousedown" || t.event == "mouseup");
        match last {
            Some(t) if t.event == "mousedown" => false,
            _ => simple_in_order(snapshot, selector, path, history),
        }
    } else if ever_fired(history, selector, |e| e == "mousedown") {
        false
    } else {
        simple_in_order(snapshot, selector, path, history)
    }
}

fn release_in_order(snapshot: &Snapshot, selector: &str, path: &str, history: &[TriggerRecord]) -> bool {
    let has_press = snapshot.element_has(selector, path, |e| e == "mousedown");
    let on_element = history.iter().rev().filter(|t| t.selector == selector);

    if snapshot.element_has(selector, path, is_enter) {
        let mut presses = 0usize;
        for t in on_element {
            match EventClass::of(&t.event) {
                EventClass::Leave => return false,
                EventClass::Enter => return !has_press || presses > 0,
                EventClass::Press => presses += 1,
                EventClass::Release if has_press && presses == 0 => return false,
                _ => {}
            }
        }
        return false;
    }

    if !has_press {
        return true;
    }
    for t in on_element {
        match t.event.as_str() {
            "mouseup" => return false,
            "mousedown" => return true,
            _ => {}
        }
    }
    false
}

// ============================================================================
// Event-specific payloads
// ============================================================================

/// Payload for a `change` event, or why it cannot be fired.
pub fn change_payload(listener: &ListenerRecord) -> Result<SidePayload, SkipReason> {
    match listener.tag.as_str() {
        "select" => match &listener.select_option {
            Some(option) if !option.selected.unwrap_or(false) && !option.disabled => {
                Ok(SidePayload::OptionValue {
                    value: option.value.clone(),
                })
            }
            _ => Err(SkipReason::OptionUnavailable),
        },
        "input" => match listener.attribute("type") {
            Some("checkbox") | Some("radio") => Ok(SidePayload::CheckboxToggle),
            Some(kind) if FREE_INPUT_KINDS.contains(&kind) => Ok(SidePayload::None),
            _ => Err(SkipReason::UnresolvedInputKind),
        },
        "textarea" => Ok(SidePayload::None),
        _ => Err(SkipReason::UnsupportedChangeTarget),
    }
}

/// `mousedown` either drives a brush, or is a pan/drag that is treated as
/// returning to the current state without firing.
pub fn press_decision(listener: &ListenerRecord) -> GateDecision {
    if let Some(brush) = listener.brush() {
        return GateDecision::Fire(SidePayload::BrushMove {
            selector: listener.selector.clone(),
            selection: brush_selection(brush),
        });
    }
    if listener.zoom().is_some() || listener.draggable || listener.has_class("modal-dialog") {
        return GateDecision::Noop;
    }
    GateDecision::Fire(SidePayload::None)
}

/// New selection for a brush: the extent shrunk to a fifth along each
/// constrained axis.
pub fn brush_selection(brush: &BrushInfo) -> [[f64; 2]; 2] {
    let [start, end] = brush.brush_extent;
    let end = match brush.directions.as_str() {
        "x" => [end[0] / 5.0, end[1]],
        "y" => [end[0], end[1] / 5.0],
        _ => [end[0] / 5.0, end[1] / 5.0],
    };
    [start, end]
}

/// Modal open/close affordances on `click`, detected by attribute conventions.
pub fn click_payload(listener: &ListenerRecord) -> SidePayload {
    if listener.attribute("data-dismiss") == Some("modal") {
        if listener.has_class("modal") {
            return SidePayload::ModalAction {
                selector: listener.selector.clone(),
                action: ModalCommand::Hide,
            };
        }
        return listener
            .ancestors
            .iter()
            .position(|a| a.has_class("modal"))
            .map(|k| SidePayload::ModalAction {
                selector: listener.ancestor_selector(k),
                action: ModalCommand::Hide,
            })
            .unwrap_or_default();
    }

    if listener.attribute("data-toggle") == Some("modal") {
        let target_attr = if listener.tag == "a" { "href" } else { "data-target" };
        if let Some(target) = listener.attribute(target_attr) {
            return SidePayload::ModalAction {
                selector: target.to_string(),
                action: ModalCommand::Show,
            };
        }
    }

    SidePayload::None
}
