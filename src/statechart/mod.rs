pub mod augment;
pub mod chart;
pub mod error;
pub mod graphviz;

use tracing::info;

use crate::model::state::State;
use augment::{augment, AugmentOptions};
use chart::StateChart;

/// Export the registered states and add silent-return edges.
pub fn build(states: &[State], options: AugmentOptions) -> StateChart {
    let mut chart = StateChart::from_states(states);
    let added = augment(&mut chart, options);
    info!(states = chart.len(), silent_returns = added, "statechart built");
    chart
}
