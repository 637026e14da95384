use std::fs;

use clap::Parser;

use statechart_explorer::cli::commands::{cmd_graph, write_artifacts, GRAPH_FILE, STATECHART_FILE, TIMES_FILE};
use statechart_explorer::cli::config::{
    load_config, load_target_url, parse_config, parse_excluded_events, resolve_explore, AppConfig,
    Cli, Commands, ConfigError, ExploreArgs,
};
use statechart_explorer::explorer::equivalence::HandlerMatch;
use statechart_explorer::explorer::explorer::ExplorationReport;
use statechart_explorer::model::state::StateId;
use statechart_explorer::statechart::chart::{ChartListener, ChartState, StateChart};
use statechart_explorer::trace::logger::TraceLogger;
use statechart_explorer::trace::trace::TraceEvent;

use crate::common::records::on_id;

mod common;

fn one_edge_chart() -> StateChart {
    let mut record = on_id("go", "/html/body/button[1]", "click");
    record.resolved_target = Some(StateId(0));
    StateChart::new(vec![ChartState {
        id: StateId(0),
        ieo: vec![ChartListener::from_record(&record)],
    }])
}

// ============================================================================
// Argument parsing
// ============================================================================

#[test]
fn explore_flags_parse() {
    let cli = Cli::try_parse_from([
        "statechart-explorer",
        "-vv",
        "explore",
        "--url",
        "http://localhost:3000/",
        "--max-states",
        "50",
        "--handler-match",
        "loose",
    ])
    .unwrap();

    assert_eq!(cli.verbose, 2);
    let Commands::Explore(args) = cli.command else {
        panic!("expected explore");
    };
    assert_eq!(args.url.as_deref(), Some("http://localhost:3000/"));
    assert_eq!(args.max_states, Some(50));
    assert_eq!(args.handler_match, Some(HandlerMatch::Loose));
}

#[test]
fn url_and_url_file_conflict() {
    let result = Cli::try_parse_from([
        "statechart-explorer",
        "explore",
        "--url",
        "http://a/",
        "--url-file",
        "url.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn graph_subcommand_parses() {
    let cli = Cli::try_parse_from([
        "statechart-explorer",
        "graph",
        "--statechart",
        "out/statechart.json",
        "--config",
        "custom.yaml",
    ])
    .unwrap();

    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    assert!(matches!(cli.command, Commands::Graph { output: None, .. }));
}

// ============================================================================
// YAML config
// ============================================================================

#[test]
fn partial_yaml_fills_defaults() {
    let config = parse_config(
        "explore:\n  max_depth: 4\n  handler_match: loose\n  modal_ids: [node_info_modal]\n",
    )
    .unwrap();

    assert_eq!(config.explore.max_depth, Some(4));
    assert_eq!(config.explore.handler_match, HandlerMatch::Loose);
    assert_eq!(config.explore.modal_ids, vec!["node_info_modal"]);
    assert_eq!(config.explore.output_dir, "output");
    assert_eq!(config.driver.settle_timeout_ms, 1000);
    assert_eq!(config.driver.script, "driver/page_driver.js");
}

#[test]
fn malformed_yaml_is_an_error_but_load_falls_back() {
    assert!(matches!(parse_config("explore: [1, 2"), Err(ConfigError::Yaml(_))));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "explore: [1, 2").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.explore.output_dir, "output");
}

#[test]
fn missing_config_file_gives_defaults() {
    let config = load_config(Some("/definitely/not/here.yaml"));
    assert_eq!(config.explore.max_states, None);
    assert_eq!(config.driver.navigation_timeout_ms, 5000);
}

// ============================================================================
// Plain-text inputs
// ============================================================================

#[test]
fn excluded_events_are_trimmed_and_lowercased() {
    assert_eq!(
        parse_excluded_events("  Scroll\n\nWheel \r\nkeydown\n"),
        vec!["scroll", "wheel", "keydown"]
    );
}

#[test]
fn target_url_file_is_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url.txt");
    fs::write(&path, "  http://localhost:8080/app \n").unwrap();

    assert_eq!(load_target_url(&path).unwrap(), "http://localhost:8080/app");
}

#[test]
fn empty_or_missing_url_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "\n").unwrap();

    assert!(matches!(load_target_url(&empty), Err(ConfigError::EmptyTargetUrl { .. })));
    assert!(matches!(
        load_target_url(dir.path().join("missing.txt")),
        Err(ConfigError::ReadInput { .. })
    ));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn cli_values_win_over_yaml() {
    let mut config = AppConfig::default();
    config.explore.max_states = Some(10);
    config.explore.max_depth = Some(3);
    config.explore.require_equal_length = true;
    let args = ExploreArgs {
        url: Some(" http://a.test/ ".into()),
        max_states: Some(99),
        output_dir: Some("runs/1".into()),
        driver_script: Some("custom.js".into()),
        ..ExploreArgs::default()
    };

    let settings = resolve_explore(&args, &config).unwrap();
    assert_eq!(settings.explorer.root_url, "http://a.test/");
    assert_eq!(settings.explorer.max_states, Some(99));
    assert_eq!(settings.explorer.max_depth, Some(3));
    assert!(settings.augment.require_equal_length);
    assert_eq!(settings.output_dir.to_str(), Some("runs/1"));
    assert_eq!(settings.session.script, "custom.js");
    assert!(settings.session.excluded_events.is_empty());
}

#[test]
fn yaml_files_are_read_when_no_flags_are_given() {
    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("url.txt");
    let events = dir.path().join("events.txt");
    fs::write(&url, "http://b.test/\n").unwrap();
    fs::write(&events, "Wheel\n").unwrap();

    let mut config = AppConfig::default();
    config.explore.url_file = url.to_str().map(String::from);
    config.explore.excluded_events_file = events.to_str().map(String::from);

    let settings = resolve_explore(&ExploreArgs::default(), &config).unwrap();
    assert_eq!(settings.explorer.root_url, "http://b.test/");
    assert_eq!(settings.session.excluded_events, vec!["wheel"]);
    assert_eq!(settings.output_dir.to_str(), Some("output"));
}

#[test]
fn no_target_url_is_an_error() {
    let result = resolve_explore(&ExploreArgs::default(), &AppConfig::default());
    assert!(matches!(result, Err(ConfigError::MissingTargetUrl)));
}

// ============================================================================
// Artifacts
// ============================================================================

#[test]
fn artifacts_land_in_a_created_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("run");
    let report = ExplorationReport {
        started_at_ms: 1_000,
        finished_at_ms: 4_500,
        ..ExplorationReport::default()
    };

    write_artifacts(&out, &one_edge_chart(), &report).unwrap();

    let chart = StateChart::read_json(out.join(STATECHART_FILE)).unwrap();
    assert_eq!(chart, one_edge_chart());
    assert!(fs::read_to_string(out.join(GRAPH_FILE)).unwrap().contains("E0 -> 0;"));
    assert_eq!(fs::read_to_string(out.join(TIMES_FILE)).unwrap(), "1000\n\n4500");
    assert_eq!(report.duration_ms(), 3_500);
}

#[test]
fn graph_command_writes_next_to_the_input_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join(STATECHART_FILE);
    one_edge_chart().write_json(&input).unwrap();

    let written = cmd_graph(input.to_str().unwrap(), None).unwrap();
    assert_eq!(written, dir.path().join(GRAPH_FILE));
    assert!(fs::read_to_string(written).unwrap().starts_with("digraph G {"));
}

// ============================================================================
// Trace log
// ============================================================================

#[test]
fn trace_logger_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let logger = TraceLogger::new(&path);
    assert!(logger.is_enabled());

    let record = on_id("go", "/html/body/button[1]", "click");
    logger.log(
        &TraceEvent::now(1, StateId(0))
            .with_listener(0, &record)
            .with_decision("new")
            .with_target(StateId(1)),
    );
    logger.log(&TraceEvent::now(2, StateId(1)).with_reason("out of order"));

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["selector"], "#go");
    assert_eq!(lines[0]["target_state"], 1);
    assert_eq!(lines[1]["reason"], "out of order");
}

#[test]
fn disabled_trace_logger_drops_events() {
    let logger = TraceLogger::disabled();
    assert!(!logger.is_enabled());
    logger.log(&TraceEvent::now(0, StateId(0)));
}
