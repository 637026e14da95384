use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::browser::session::BrowserSession;
use crate::cli::config::ExploreSettings;
use crate::explorer::explorer::{ExplorationReport, Explorer};
use crate::statechart::chart::StateChart;
use crate::statechart::error::ChartError;
use crate::statechart::graphviz::write_dot;
use crate::trace::logger::TraceLogger;

pub const STATECHART_FILE: &str = "statechart.json";
pub const GRAPH_FILE: &str = "statechart.gv";
pub const TIMES_FILE: &str = "computation_times.txt";

// ============================================================================
// explore subcommand
// ============================================================================

pub fn cmd_explore(settings: ExploreSettings) -> Result<ExplorationReport, Box<dyn std::error::Error>> {
    let mut session = BrowserSession::launch(settings.session.clone())?;
    info!(url = %settings.explorer.root_url, "exploring");

    let tracer = match &settings.trace_file {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let exploration = Explorer::new(settings.explorer.clone(), &mut session)
        .with_tracer(tracer)
        .run()?;
    session.quit()?;

    let chart = crate::statechart::build(&exploration.states, settings.augment);
    write_artifacts(&settings.output_dir, &chart, &exploration.report)?;

    let report = exploration.report;
    println!(
        "Explored {} states, {} resolved edges ({} skipped, {} no-op, {} stale, {} off-origin, {} invalid branches) in {} ms",
        report.states,
        report.resolved_edges,
        report.skipped,
        report.noops,
        report.stale,
        report.off_origin,
        report.invalid_branches,
        report.duration_ms(),
    );
    println!("Artifacts written to {}", settings.output_dir.display());

    Ok(report)
}

/// Write `statechart.json`, `statechart.gv` and `computation_times.txt`
/// into `dir`, creating it if needed.
pub fn write_artifacts(
    dir: &Path,
    chart: &StateChart,
    report: &ExplorationReport,
) -> Result<(), ChartError> {
    fs::create_dir_all(dir).map_err(|source| ChartError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    chart.write_json(dir.join(STATECHART_FILE))?;
    write_dot(chart, dir.join(GRAPH_FILE))?;

    let times = dir.join(TIMES_FILE);
    fs::write(
        &times,
        format!("{}\n\n{}", report.started_at_ms, report.finished_at_ms),
    )
    .map_err(|source| ChartError::Io {
        path: times,
        source,
    })
}

// ============================================================================
// graph subcommand
// ============================================================================

/// Re-render the DOT file from an exported statechart. Returns the path written.
pub fn cmd_graph(statechart: &str, output: Option<&str>) -> Result<PathBuf, ChartError> {
    let input = Path::new(statechart);
    let chart = StateChart::read_json(input)?;

    let output = match output {
        Some(path) => PathBuf::from(path),
        None => input.with_file_name(GRAPH_FILE),
    };
    write_dot(&chart, &output)?;

    println!("Wrote {} ({} states)", output.display(), chart.len());
    Ok(output)
}
