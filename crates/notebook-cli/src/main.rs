//! nbstream - Command-line tool for streaming notebook chat and content generation
//!
//! Prints the server's event stream as it arrives, either as readable text or
//! as one JSON object per event.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notebook_stream::NotebookClient;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "nbstream")]
#[command(author, version, about = "Notebook streaming chat CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL [default: http://localhost:8000]
    #[arg(short, long, env = "NOTEBOOK_SERVER")]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "NOTEBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about a notebook's documents
    Chat {
        /// Notebook ID
        #[arg(short, long)]
        notebook: i64,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<i64>,

        /// Message to send
        message: String,
    },

    /// Generate content (summary, faq, study guide, ...) from a notebook
    Generate {
        /// Notebook ID
        #[arg(short, long)]
        notebook: i64,

        /// Content type to generate
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        content_type: String,

        /// Custom instructions for the generator
        #[arg(short, long)]
        prompt: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.server.as_deref(),
        cli.output.map(|format| format.as_str()),
        cli.no_color,
    );

    let format = OutputFormat::from_name(&merged.output).unwrap_or_else(|| {
        tracing::warn!(output = %merged.output, "Unknown output format, using text");
        OutputFormat::Text
    });

    // Create output context
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);
    let client = create_client(&merged)?;

    // Execute command
    let succeeded = match &cli.command {
        Commands::Chat {
            notebook,
            conversation,
            message,
        } => commands::chat(&client, *notebook, *conversation, message, &ctx).await,

        Commands::Generate {
            notebook,
            content_type,
            prompt,
        } => {
            commands::generate(&client, *notebook, content_type, prompt.as_deref(), &ctx).await
        }
    };

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}

/// Create a notebook client for the resolved configuration
fn create_client(merged: &MergedConfig) -> Result<NotebookClient> {
    NotebookClient::from_config(&merged.client_config())
        .with_context(|| format!("Failed to create client for {}", merged.server))
}
