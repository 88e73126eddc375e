use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "blockplan", version, about = "Slot-aware goal block planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan goal blocks into free slots
    Plan(commands::plan::PlanArgs),
    /// Run a versioned demo fixture
    Fixture(commands::fixture::FixtureArgs),
    /// Derive free slots from busy calendars
    Free(commands::free::FreeArgs),
    /// Draft calendar events for a plan
    Drafts(commands::drafts::DraftsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Fixture(args) => commands::fixture::run(args),
        Commands::Free(args) => commands::free::run(args),
        Commands::Drafts(args) => commands::drafts::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
