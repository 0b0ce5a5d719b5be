mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "workbench")]
#[command(about = "Run JavaScript snippets and preview HTML/CSS")]
#[command(version)]
pub struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute files in order within one session
    Run {
        /// Files to execute; markup and style compose across files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Declared language for every file (default: from the file extension)
        #[arg(short, long)]
        lang: Option<String>,

        /// Session name
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// Print each result as a JSON line
        #[arg(long)]
        json: bool,

        /// Write the last rendered document here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the detected language of each file
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            files,
            lang,
            session,
            json,
            out,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let options = commands::RunOptions {
                lang,
                session,
                json,
                out,
            };
            commands::execute_run(config, &files, &options).await
        }
        Commands::Classify { files } => commands::execute_classify(&files),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "workbench_engine={},workbench={}",
                    log_level, log_level
                ))
            }),
        )
        .init();
}
