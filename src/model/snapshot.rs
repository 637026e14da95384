use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::listener::{
    null_as_default, path_prefix, node_selector, AncestorInfo, Attribute, BrushInfo, DataEntry,
    Gesture, ListenerRecord, SelectOption, StyleEntry, ZoomInfo,
};

// ============================================================================
// Snapshot
// ============================================================================

/// Ordered listener records, in the driver's discovery order.
///
/// Order is significant: equivalence compares positions pairwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<ListenerRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<ListenerRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListenerRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ListenerRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ListenerRecord> {
        self.records.get_mut(index)
    }

    pub fn push(&mut self, record: ListenerRecord) {
        self.records.push(record);
    }

    /// Records bound to the element `(selector, path)`.
    pub fn on_element<'a>(
        &'a self,
        selector: &'a str,
        path: &'a str,
    ) -> impl Iterator<Item = &'a ListenerRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.is_element(selector, path))
    }

    /// True if the element `(selector, path)` has a listener whose event
    /// satisfies `pred`.
    pub fn element_has(&self, selector: &str, path: &str, pred: impl Fn(&str) -> bool) -> bool {
        self.on_element(selector, path).any(|r| pred(&r.event))
    }

    /// Number of records that were observed in the page (synthetic return
    /// edges excluded).
    pub fn real_len(&self) -> usize {
        self.records.iter().filter(|r| !r.is_synthetic()).count()
    }
}

impl Index<usize> for Snapshot {
    type Output = ListenerRecord;

    fn index(&self, index: usize) -> &ListenerRecord {
        &self.records[index]
    }
}

impl IndexMut<usize> for Snapshot {
    fn index_mut(&mut self, index: usize) -> &mut ListenerRecord {
        &mut self.records[index]
    }
}

impl FromIterator<ListenerRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ListenerRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// Raw driver observations
// ============================================================================

/// One listener as reported by the driver for an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListener {
    pub event: String,
    #[serde(rename = "eventFunction")]
    pub handler: String,
    #[serde(default)]
    pub brushable: Option<BrushInfo>,
    #[serde(default)]
    pub zoomable: Option<ZoomInfo>,
    #[serde(default)]
    pub draggable: bool,
}

/// One DOM element with at least one listener, as reported by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    #[serde(rename = "nodeXPath")]
    pub path: String,
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "class", default, deserialize_with = "null_as_default")]
    pub classes: Vec<String>,
    #[serde(rename = "parents", default, deserialize_with = "null_as_default")]
    pub ancestors: Vec<AncestorInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub styles: Vec<StyleEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<DataEntry>,
    #[serde(rename = "isModalOpen", default)]
    pub modal_open: bool,
    #[serde(default)]
    pub toggle_open: Option<bool>,
    /// One entry per `<option>` (or a single expansion descriptor).
    #[serde(default, deserialize_with = "null_as_default")]
    pub select_values: Vec<SelectOption>,
    #[serde(default)]
    pub listeners: Vec<RawListener>,
}

// ============================================================================
// Assembly
// ============================================================================

/// Turn raw element observations into a snapshot.
///
/// Applies the excluded-event filter, folds structurally identical siblings
/// into the first one's `duplicate_count`, and tags paired range-slider
/// handles with `handleLeft` / `handleRight`.
pub fn assemble(elements: Vec<RawElement>, excluded_events: &[String]) -> Snapshot {
    let mut records: Vec<ListenerRecord> = Vec::new();

    for element in elements {
        let selector = node_selector(
            element.id.as_deref(),
            &element.tag,
            &element.classes,
            &element.ancestors,
        );
        let options: Vec<Option<SelectOption>> = if element.select_values.is_empty() {
            vec![None]
        } else {
            element.select_values.iter().cloned().map(Some).collect()
        };
        let foldable = element.tag != "input" && element.tag != "select";

        for option in options {
            let mut attributes = element.attributes.clone();

            for listener in &element.listeners {
                let event = listener.event.to_lowercase();
                if excluded_events.iter().any(|e| *e == event) {
                    continue;
                }

                if foldable
                    && fold_into_existing(&mut records, &element.path, listener, &mut attributes)
                {
                    continue;
                }

                let gesture = match (&listener.brushable, &listener.zoomable) {
                    (Some(brush), Some(_)) => {
                        warn!(
                            selector = %selector,
                            event = %listener.event,
                            "listener reports both brush and zoom, keeping brush"
                        );
                        Some(Gesture::Brush(brush.clone()))
                    }
                    (Some(brush), None) => Some(Gesture::Brush(brush.clone())),
                    (None, Some(zoom)) => Some(Gesture::Zoom(zoom.clone())),
                    (None, None) => None,
                };

                records.push(ListenerRecord {
                    selector: selector.clone(),
                    path: element.path.clone(),
                    tag: element.tag.clone(),
                    id: element.id.clone(),
                    classes: element.classes.clone(),
                    ancestors: element.ancestors.clone(),
                    attributes: attributes.clone(),
                    styles: element.styles.clone(),
                    data: element.data.clone(),
                    modal_open: element.modal_open,
                    toggle_open: element.toggle_open,
                    select_option: option.clone(),
                    event: listener.event.clone(),
                    handler: listener.handler.clone(),
                    gesture,
                    draggable: listener.draggable,
                    resolved_target: None,
                    duplicate_count: 0,
                });
            }
        }
    }

    Snapshot::new(records)
}

/// Look for an already-assembled record structurally identical to the new
/// listener. Returns `true` if the listener was folded away.
fn fold_into_existing(
    records: &mut [ListenerRecord],
    path: &str,
    listener: &RawListener,
    attributes: &mut Vec<Attribute>,
) -> bool {
    let prefix = path_prefix(path);

    for existing in records.iter_mut() {
        if existing.path_prefix() != prefix
            || existing.event != listener.event
            || existing.handler != listener.handler
        {
            continue;
        }

        if is_range_handle(attributes) && existing.is_range_handle() {
            pair_handles(attributes, existing);
            continue;
        }

        let expansion = "aria-expanded_parent";
        if !attributes.iter().any(|a| a.name == expansion) && !existing.has_attribute(expansion) {
            existing.duplicate_count += 1;
            return true;
        }
    }

    false
}

fn is_range_handle(attributes: &[Attribute]) -> bool {
    ["aria-valuemin", "aria-valuemax", "aria-valuenow"]
        .iter()
        .all(|name| attributes.iter().any(|a| a.name == *name))
}

fn value_now(attributes: &[Attribute]) -> f64 {
    attributes
        .iter()
        .find(|a| a.name == "aria-valuenow")
        .and_then(|a| a.value.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// The handle with the lower (or equal) `aria-valuenow` is the left one.
fn pair_handles(attributes: &mut Vec<Attribute>, other: &mut ListenerRecord) {
    let (mine, theirs) = if value_now(attributes) <= value_now(&other.attributes) {
        ("handleLeft", "handleRight")
    } else {
        ("handleRight", "handleLeft")
    };
    set_handle_flag(attributes, mine);
    set_handle_flag(&mut other.attributes, theirs);
}

fn set_handle_flag(attributes: &mut Vec<Attribute>, name: &str) {
    attributes.retain(|a| a.name != "handleLeft" && a.name != "handleRight");
    attributes.push(Attribute::new(name, "true"));
}
