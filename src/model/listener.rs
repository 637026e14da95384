use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::events::SILENT_RETURN_EVENT;
use crate::model::state::StateId;

// ============================================================================
// Element descriptors
// ============================================================================

/// A `{name, value}` attribute pair. Values arrive from the driver as strings,
/// booleans, or numbers and are normalised to their string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A computed style entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleEntry {
    pub name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

/// A framework-attached datum (e.g. a bound chart datum). Kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub name: String,
    pub value: Value,
}

/// One container element between the listener's element and `<body>`,
/// closest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorInfo {
    #[serde(rename = "nodeXPath")]
    pub path: String,
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "class", default, deserialize_with = "null_as_default")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub toggle_open: Option<bool>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visibility: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clip_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transform: String,
}

impl AncestorInfo {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Option-bearing descriptor: either one `<option>` of a `<select>`
/// (`value`/`selected`/`disabled`) or the expansion state of a listbox,
/// dropdown, or tab toggle (`name = "aria-expanded"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default)]
    pub disabled: bool,
}

/// Brush behaviour attached to a press listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushInfo {
    #[serde(default)]
    pub handles: Option<Vec<String>>,
    /// `"x"`, `"y"`, or `"xy"`.
    pub directions: String,
    pub brush_extent: [[f64; 2]; 2],
    #[serde(default)]
    pub selection_extent: Option<[[f64; 2]; 2]>,
}

/// Zoom behaviour attached to a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomInfo {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

/// At most one of brush or zoom can be bound to a single listener.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Brush(BrushInfo),
    Zoom(ZoomInfo),
}

// ============================================================================
// ListenerRecord
// ============================================================================

/// One event binding observed on one element at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenerRecord {
    pub selector: String,
    /// Ordinal path from the document root (XPath-like, `.../div[2]`).
    pub path: String,
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub ancestors: Vec<AncestorInfo>,
    pub attributes: Vec<Attribute>,
    pub styles: Vec<StyleEntry>,
    pub data: Vec<DataEntry>,
    pub modal_open: bool,
    pub toggle_open: Option<bool>,
    pub select_option: Option<SelectOption>,
    pub event: String,
    /// Opaque handler signature, compared but never executed.
    pub handler: String,
    pub gesture: Option<Gesture>,
    pub draggable: bool,
    pub resolved_target: Option<StateId>,
    pub duplicate_count: u32,
}

impl ListenerRecord {
    /// Minimal record for `event` on the element reached by `path`.
    /// Everything else starts empty.
    pub fn new(selector: &str, path: &str, tag: &str, event: &str, handler: &str) -> Self {
        Self {
            selector: selector.to_string(),
            path: path.to_string(),
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            ancestors: Vec::new(),
            attributes: Vec::new(),
            styles: Vec::new(),
            data: Vec::new(),
            modal_open: false,
            toggle_open: None,
            select_option: None,
            event: event.to_string(),
            handler: handler.to_string(),
            gesture: None,
            draggable: false,
            resolved_target: None,
            duplicate_count: 0,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn brush(&self) -> Option<&BrushInfo> {
        match &self.gesture {
            Some(Gesture::Brush(brush)) => Some(brush),
            _ => None,
        }
    }

    pub fn zoom(&self) -> Option<&ZoomInfo> {
        match &self.gesture {
            Some(Gesture::Zoom(zoom)) => Some(zoom),
            _ => None,
        }
    }

    /// Path without its trailing sibling index.
    pub fn path_prefix(&self) -> &str {
        path_prefix(&self.path)
    }

    /// Same element as `(selector, path)`.
    pub fn is_element(&self, selector: &str, path: &str) -> bool {
        self.selector == selector && self.path == path
    }

    /// Selector of the `index`-th ancestor (0 = direct parent), computed the
    /// same way the element's own selector is.
    pub fn ancestor_selector(&self, index: usize) -> String {
        let ancestor = &self.ancestors[index];
        node_selector(
            ancestor.id.as_deref(),
            &ancestor.tag,
            &ancestor.classes,
            &self.ancestors[index + 1..],
        )
    }

    /// Iterator of `(selector, path)` for every ancestor, closest first.
    pub fn ancestor_keys(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        (0..self.ancestors.len()).map(|i| (self.ancestor_selector(i), self.ancestors[i].path.as_str()))
    }

    pub fn is_synthetic(&self) -> bool {
        self.event == SILENT_RETURN_EVENT
    }

    /// Record where firing this listener leads. Returns `false` (and leaves
    /// the record untouched) if a target was already recorded.
    pub fn resolve(&mut self, target: StateId) -> bool {
        if self.resolved_target.is_some() {
            return false;
        }
        self.resolved_target = Some(target);
        true
    }

    /// True if the three `aria-value*` attributes of a range handle are present.
    pub fn is_range_handle(&self) -> bool {
        ["aria-valuemin", "aria-valuemax", "aria-valuenow"]
            .iter()
            .all(|name| self.has_attribute(name))
    }

    /// Short human label used in logs: `click [b] on '#menu'`.
    pub fn label(&self) -> String {
        match (&self.select_option, self.tag.as_str()) {
            (Some(option), "select") => {
                format!("{} [{}] on '{}'", self.event, option.value, self.selector)
            }
            _ => format!("{} on '{}'", self.event, self.selector),
        }
    }
}

// ============================================================================
// Selector / path helpers
// ============================================================================

/// Build a CSS-like selector for an element from its id, tag, classes, and
/// ancestors (closest first).
///
/// An id short-circuits to `#id`. Otherwise the ancestor chain is written out
/// up to (and including) the nearest id-bearing ancestor.
pub fn node_selector(
    id: Option<&str>,
    tag: &str,
    classes: &[String],
    ancestors: &[AncestorInfo],
) -> String {
    if let Some(id) = id.filter(|i| !i.is_empty()) {
        return format!("#{id}");
    }

    let mut parts = Vec::new();
    for ancestor in ancestors {
        if let Some(id) = ancestor.id.as_deref().filter(|i| !i.is_empty()) {
            parts.push(format!("#{id}"));
            break;
        }
        parts.push(compound(&ancestor.tag, &ancestor.classes));
    }
    parts.reverse();
    parts.push(compound(tag, classes));
    parts.join(" ")
}

fn compound(tag: &str, classes: &[String]) -> String {
    let mut out = tag.to_string();
    for class in classes {
        out.push('.');
        out.push_str(class);
    }
    out
}

/// Strip the final `[n]` index from an ordinal path.
pub fn path_prefix(path: &str) -> &str {
    match path.rfind('[') {
        Some(i) => &path[..i],
        None => path,
    }
}

/// Attribute truthiness: present, non-empty, and not literally `false`.
pub fn truthy(value: &str) -> bool {
    !value.is_empty() && value != "false"
}

// ============================================================================
// Serde helpers
// ============================================================================

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
