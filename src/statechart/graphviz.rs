use std::fs;
use std::path::Path;

use crate::statechart::chart::StateChart;
use crate::statechart::error::ChartError;

const MAX_SELECTOR_LABEL: usize = 40;
const SELECTOR_KEEP: usize = 20;

/// DOT description of the chart. Each resolved edge becomes a box node
/// `E<n>` between its origin and target states; unresolved edges are omitted.
pub fn to_dot(chart: &StateChart) -> String {
    let mut out = String::from("digraph G {\n\n\trankdir=\"LR\";\n\tsplines=ortho;\n\n");
    let mut edge = 0usize;

    for state in chart.states() {
        for listener in &state.ieo {
            let Some(target) = listener.leads_to() else {
                continue;
            };

            let option = match &listener.select_value {
                Some(option) if listener.tag == "select" => format!("' [{}]", option.value),
                _ => "'".to_string(),
            };
            out.push_str(&format!(
                "\tE{edge} [label=\"'{event}{option} on '{selector}'\\n({path})\", shape=\"box\", style=\"filled\", fillcolor=\"#000000\", fontcolor=\"#FFFFFF\"];\n\
                 \t{from} -> E{edge} [arrowhead=\"box\"];\n\
                 \tE{edge} -> {target};\n\n",
                event = listener.event,
                selector = abbreviate(&listener.selector),
                path = listener.path,
                from = state.id,
            ));
            edge += 1;
        }
    }

    out.push('}');
    out
}

pub fn write_dot(chart: &StateChart, path: impl AsRef<Path>) -> Result<(), ChartError> {
    let path = path.as_ref();
    fs::write(path, to_dot(chart)).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Long selectors keep their first and last 20 characters.
fn abbreviate(selector: &str) -> String {
    let chars: Vec<char> = selector.chars().collect();
    if chars.len() <= MAX_SELECTOR_LABEL {
        return selector.to_string();
    }
    let head: String = chars[..SELECTOR_KEEP].iter().collect();
    let tail: String = chars[chars.len() - SELECTOR_KEEP..].iter().collect();
    format!("{head} [] {tail}")
}
