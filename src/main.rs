use clap::Parser;
use statechart_explorer::cli::commands::{cmd_explore, cmd_graph};
use statechart_explorer::cli::config::{load_config, resolve_explore, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Explore(args) => {
            let settings = resolve_explore(&args, &config)?;
            cmd_explore(settings)?;
        }
        Commands::Graph { statechart, output } => {
            cmd_graph(&statechart, output.as_deref())?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from `warn`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
