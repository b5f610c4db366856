mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use calfeed_core::source::FetchMethod;

#[derive(Parser)]
#[command(name = "calfeed")]
#[command(about = "Import external calendar feeds into your local event catalog")]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage feed sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },
    /// Fetch sources and import their events
    Import {
        /// Only import this source (by name)
        #[arg(short, long)]
        source: Option<String>,

        /// Credit changes to this editor instead of the configured fallback
        #[arg(long)]
        editor: Option<String>,

        /// Auto-approve new events if this actor may approve the source's area
        #[arg(long)]
        approver: Option<String>,
    },
    /// List or manage tracking links
    Links {
        /// Only show links of this source (by name)
        #[arg(short, long)]
        source: Option<String>,

        #[command(subcommand)]
        command: Option<LinkCommands>,
    },
    /// List catalog events
    Events,
    /// Parse a local feed file and summarize its contents
    Inspect { file: std::path::PathBuf },
}

#[derive(Subcommand)]
enum SourceCommands {
    Add {
        name: String,
        url: String,

        #[arg(long, default_value = "get")]
        method: FetchMethod,

        /// Approval area for events from this source
        #[arg(long)]
        area: Option<String>,
    },
    List,
    /// Forget a source. Its events and links stay in the catalog.
    Remove { name: String },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Stop importing the item behind this link
    Ignore { link_id: String },
    /// Resume updates after a local edit
    Reset { link_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.command {
        Commands::Source { command } => match command {
            SourceCommands::Add {
                name,
                url,
                method,
                area,
            } => commands::source::add(&name, &url, method, area.as_deref()),
            SourceCommands::List => commands::source::list(),
            SourceCommands::Remove { name } => commands::source::remove(&name),
        },
        Commands::Import {
            source,
            editor,
            approver,
        } => commands::import::run(source.as_deref(), editor, approver, cli.verbose).await,
        Commands::Links { source, command } => match command {
            None => commands::links::list(source.as_deref()),
            Some(LinkCommands::Ignore { link_id }) => commands::links::ignore(&link_id),
            Some(LinkCommands::Reset { link_id }) => commands::links::reset(&link_id),
        },
        Commands::Events => commands::events::run(),
        Commands::Inspect { file } => commands::inspect::run(&file),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
