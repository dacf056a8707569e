//! sealexam CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use sealexam_core::model::Mode;

mod commands;

use commands::SelectionArgs;

#[derive(Parser)]
#[command(
    name = "sealexam",
    version,
    about = "Blueprint-weighted trade exam simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an interactive exam or training session
    Run {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Session mode: exam or training (default from config)
        #[arg(long)]
        mode: Option<Mode>,

        /// Output directory for saved reports
        #[arg(long, default_value = "./sealexam-results")]
        output: PathBuf,

        /// Save the report: json, html, all (default: not saved)
        #[arg(long)]
        format: Option<String>,
    },

    /// Preview a draw without taking it
    Sample {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check banks and blueprint for problems
    Validate {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Validate a single bank file instead of the configured banks
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Session length to compute task targets for
        #[arg(long)]
        length: Option<usize>,
    },

    /// Show the missed questions of a saved session
    Review {
        /// Session report JSON
        #[arg(long)]
        report: PathBuf,

        /// Also write an HTML report here
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format: text, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config, sample banks and a sample blueprint
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sealexam=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            selection,
            mode,
            output,
            format,
        } => commands::run::execute(selection, mode, output, format).await,
        Commands::Sample { selection, format } => {
            commands::sample::execute(selection, format).await
        }
        Commands::Validate {
            config,
            bank,
            length,
        } => commands::validate::execute(config, bank, length).await,
        Commands::Review {
            report,
            html,
            format,
        } => commands::review::execute(report, html, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
