use anyhow::Result;
use clap::{Parser, Subcommand};
use hoopchat::config::{Config, API_URL_ENV};
use hoopchat::{commands, logging, ui};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoopchat")]
#[command(version)]
#[command(about = "Ask questions about NCAA basketball data from your terminal", long_about = None)]
struct Cli {
    /// Query service base URL
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        query: String,
        /// Print the raw response JSON
        #[arg(long)]
        json: bool,
        /// Write the chart to this file (.html, or .json for the figure)
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Run the stored-query batch job
    Process,
    /// Build the chart figure for a saved response
    Chart {
        path: PathBuf,
        /// Write the chart to this file (.html, or .json for the figure)
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command.is_some() {
        logging::init_stderr();
    }

    let mut config = Config::load()?;
    config.apply_api_url_override(cli.api_url);

    match cli.command {
        None => {
            logging::init_file(&config.log_path());
            ui::run(config).await
        }
        Some(Commands::Ask { query, json, export }) => {
            commands::ask(&config, &query, json, export).await
        }
        Some(Commands::Process) => commands::process(&config).await,
        Some(Commands::Chart { path, export }) => commands::chart(&path, export),
        Some(Commands::Config { path }) => commands::show_config(&config, path),
    }
}
