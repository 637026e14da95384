/// Reserved event name for synthetic return edges added after exploration.
///
/// Crossing an edge with this event fires nothing in the browser; it only
/// records that the origin configuration is reachable again.
pub const SILENT_RETURN_EVENT: &str = "facsimile_back";

/// Coarse classification of DOM event names used by the trigger gate and
/// the context tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// `mouseenter` / `mouseover`: opens a hover scope.
    Enter,
    /// `mouseleave` / `mouseout`: closes a hover scope.
    Leave,
    /// `mousedown`: opens a press scope.
    Press,
    /// `mouseup`: closes a press scope.
    Release,
    /// Anything else (click, change, keydown, ...).
    Simple,
}

impl EventClass {
    pub fn of(event: &str) -> Self {
        match event {
            "mouseenter" | "mouseover" => EventClass::Enter,
            "mouseleave" | "mouseout" => EventClass::Leave,
            "mousedown" => EventClass::Press,
            "mouseup" => EventClass::Release,
            _ => EventClass::Simple,
        }
    }

    /// Events that push a context entry.
    pub fn opens_scope(self) -> bool {
        matches!(self, EventClass::Enter | EventClass::Press)
    }

    /// Events that pop a context entry.
    pub fn closes_scope(self) -> bool {
        matches!(self, EventClass::Leave | EventClass::Release)
    }
}

pub fn is_enter(event: &str) -> bool {
    EventClass::of(event) == EventClass::Enter
}

pub fn is_leave(event: &str) -> bool {
    EventClass::of(event) == EventClass::Leave
}

/// True when `exit` is the exact counterpart of `entry` for context unwinding
/// (`mouseenter`/`mouseleave`, `mouseover`/`mouseout`, `mousedown`/`mouseup`).
pub fn closes_exactly(entry: &str, exit: &str) -> bool {
    matches!(
        (entry, exit),
        ("mouseenter", "mouseleave") | ("mouseover", "mouseout") | ("mousedown", "mouseup")
    )
}

/// True when `exit` undoes `entry` in the looser sense used when looking for
/// a way back out of a hover: any leave-class event answers any enter-class one.
pub fn closes_loosely(entry: &str, exit: &str) -> bool {
    match EventClass::of(entry) {
        EventClass::Enter => is_leave(exit),
        EventClass::Press => exit == "mouseup",
        _ => false,
    }
}
