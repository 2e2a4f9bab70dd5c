use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod alliance;
mod charts;
mod config;
mod context;
mod dashboard;
mod data;
mod error;
mod metrics;
mod models;
mod report;

use config::EventConfig;
use context::EventData;

#[derive(Parser)]
#[command(name = "scouting-report")]
#[command(about = "REEFSCAPE scouting data report for FRC events", long_about = None)]
struct Cli {
    #[command(flatten)]
    event: EventArgs,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log everything at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EventArgs {
    /// Directory holding one sub-directory per event
    #[arg(long, env = "SCOUTING_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Event key, e.g. 2025txwac
    #[arg(long, env = "SCOUTING_EVENT", default_value = "2025txwac", global = true)]
    event: String,

    /// Team whose matches the "our matches" filter keeps
    #[arg(long, env = "SCOUTING_TEAM", global = true)]
    team: Option<String>,
}

impl From<EventArgs> for EventConfig {
    fn from(args: EventArgs) -> Self {
        EventConfig {
            data_dir: args.data_dir,
            event_key: args.event,
            team_of_interest: args.team,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-team averages across the whole event
    Summary,
    /// List the match numbers offered by the match selector
    Matches {
        /// Only the team of interest's matches
        #[arg(long)]
        ours: bool,
    },
    /// Show the alliances and averages for one match
    Alliance {
        #[arg(long = "match")]
        match_number: u32,
    },
    /// Write the interactive HTML dashboard
    Report {
        /// Match selected when the page opens
        #[arg(long = "match")]
        match_number: Option<u32>,
        /// Start with the "our matches" filter switched on
        #[arg(long)]
        ours: bool,
        #[arg(long, default_value = "dashboard.html")]
        out: PathBuf,
    },
}

fn init_logging(verbose: bool, debug: bool) {
    let filter_layer = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    info!("scouting-report v{}", env!("CARGO_PKG_VERSION"));

    let config = EventConfig::from(cli.event);
    let data = EventData::load(&config)
        .with_context(|| format!("failed to load event {}", config.event_key))?;

    match cli.command {
        Commands::Summary => {
            let averages = alliance::average_by_team(&data.scouting.rows);
            if averages.is_empty() {
                println!("No scouting rows for {}.", data.event_key);
                return Ok(());
            }
            let table = charts::summary_table(&averages, &report::KEY_COLUMNS);
            print!("{}", report::format_table(&table));
        }
        Commands::Matches { ours } => {
            let options = data.match_options(ours);
            if options.is_empty() {
                println!("No matches to choose from.");
                return Ok(());
            }
            for number in options {
                println!("{number}");
            }
        }
        Commands::Alliance { match_number } => {
            let view = alliance::resolve_number(&data, match_number)?;
            print!("{}", report::alliance_summary(&view));
        }
        Commands::Report {
            match_number,
            ours,
            out,
        } => {
            let page = report::build_page(&data, ours, match_number, chrono::Utc::now())?;
            std::fs::write(&out, page)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Dashboard written to {}.", out.display());
        }
    }

    Ok(())
}
