use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::events::SILENT_RETURN_EVENT;
use crate::model::listener::{
    Attribute, BrushInfo, DataEntry, Gesture, ListenerRecord, SelectOption, StyleEntry, ZoomInfo,
};
use crate::model::state::{State, StateId};
use crate::statechart::error::ChartError;

// ============================================================================
// Exported shapes
// ============================================================================

/// One edge of the exported statechart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartListener {
    #[serde(rename = "nodeSelector")]
    pub selector: String,
    #[serde(rename = "nodeXPath")]
    pub path: String,
    pub tag: String,

    /// `null` when the element carries no extra attributes.
    #[serde(default)]
    pub attributes: Option<Vec<Attribute>>,
    /// `[height, width]`, each `null` if not reported.
    #[serde(default)]
    pub styles: [Option<StyleEntry>; 2],
    #[serde(default)]
    pub data: Vec<DataEntry>,
    #[serde(rename = "selectValue", default)]
    pub select_value: Option<SelectOption>,

    pub event: String,
    #[serde(rename = "eventFunction", default)]
    pub handler: String,
    #[serde(default)]
    pub brushable: Option<BrushInfo>,
    #[serde(default)]
    pub zoomable: Option<ZoomInfo>,
    #[serde(default)]
    pub draggable: bool,
    /// Target state id, `-1` when unresolved.
    #[serde(rename = "leadsToState")]
    pub leads_to_state: i64,

    #[serde(rename = "siblings", default)]
    pub duplicate_count: u32,
}

impl ChartListener {
    pub fn from_record(record: &ListenerRecord) -> Self {
        let style = |name: &str| {
            record
                .styles
                .iter()
                .find(|s| s.name == name)
                .cloned()
        };

        let (brushable, zoomable) = match &record.gesture {
            Some(Gesture::Brush(brush)) => (Some(brush.clone()), None),
            Some(Gesture::Zoom(zoom)) => (None, Some(zoom.clone())),
            None => (None, None),
        };

        Self {
            selector: record.selector.clone(),
            path: record.path.clone(),
            tag: record.tag.clone(),
            attributes: (!record.attributes.is_empty()).then(|| record.attributes.clone()),
            styles: [style("height"), style("width")],
            data: record.data.clone(),
            select_value: record.select_option.clone(),
            event: record.event.clone(),
            handler: record.handler.clone(),
            brushable,
            zoomable,
            draggable: record.draggable,
            leads_to_state: record
                .resolved_target
                .map_or(-1, |id| id.index() as i64),
            duplicate_count: record.duplicate_count,
        }
    }

    pub fn leads_to(&self) -> Option<StateId> {
        usize::try_from(self.leads_to_state).ok().map(StateId)
    }

    pub fn is_synthetic(&self) -> bool {
        self.event == SILENT_RETURN_EVENT
    }

    /// Copy of this edge that fires nothing and returns to `origin`.
    pub fn silent_return(&self, origin: StateId) -> Self {
        Self {
            event: SILENT_RETURN_EVENT.to_string(),
            leads_to_state: origin.index() as i64,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartState {
    #[serde(rename = "stateId")]
    pub id: StateId,
    pub ieo: Vec<ChartListener>,
}

impl ChartState {
    /// Edges observed in the page (synthetic ones excluded).
    pub fn real_len(&self) -> usize {
        self.ieo.iter().filter(|l| !l.is_synthetic()).count()
    }
}

// ============================================================================
// StateChart
// ============================================================================

/// The exported graph: one entry per state, in id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateChart {
    states: Vec<ChartState>,
}

impl StateChart {
    pub fn new(states: Vec<ChartState>) -> Self {
        Self { states }
    }

    /// Project registered states down to their exported fields.
    pub fn from_states(states: &[State]) -> Self {
        Self::new(
            states
                .iter()
                .map(|state| ChartState {
                    id: state.id,
                    ieo: state.snapshot.iter().map(ChartListener::from_record).collect(),
                })
                .collect(),
        )
    }

    pub fn states(&self) -> &[ChartState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateId) -> Option<&ChartState> {
        self.position(id).map(|i| &self.states[i])
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut ChartState> {
        self.position(id).map(|i| &mut self.states[i])
    }

    fn position(&self, id: StateId) -> Option<usize> {
        match self.states.get(id.index()) {
            Some(state) if state.id == id => Some(id.index()),
            _ => self.states.iter().position(|s| s.id == id),
        }
    }

    /// Every resolved edge as `(origin, event, target)`, in export order.
    pub fn edges(&self) -> Vec<(StateId, String, StateId)> {
        self.states
            .iter()
            .flat_map(|state| {
                state
                    .ieo
                    .iter()
                    .filter_map(move |l| l.leads_to().map(|to| (state.id, l.event.clone(), to)))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ChartError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, ChartError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
