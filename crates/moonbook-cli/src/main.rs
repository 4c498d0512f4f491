//! Moonbook CLI - MoonBit notebooks from the terminal.

mod clear;
mod colors;
mod info;
mod new;
mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moonbook")]
#[command(about = "Notebook tools for MoonBit")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty notebook
    New {
        /// Path of the notebook (.ipynb is added if missing)
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show a summary of a notebook
    Info {
        /// Path to the notebook (.ipynb file)
        notebook: String,
    },

    /// Run every code cell through an interpreter program
    Run {
        /// Path to the notebook (.ipynb file)
        notebook: String,

        /// Program that reads cell source on stdin
        #[arg(short, long)]
        interpreter: String,

        /// Extra argument for the interpreter (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Per-cell timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Write the result here instead of in place
        #[arg(short, long)]
        output: Option<String>,

        /// Do not record ExecuteTime metadata
        #[arg(long)]
        no_timing: bool,

        /// Keep running after a failing cell
        #[arg(long)]
        keep_going: bool,
    },

    /// Remove the outputs of every code cell
    Clear {
        /// Path to the notebook (.ipynb file)
        notebook: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::New { path, force } => new::execute(&path, force)?,

        Commands::Info { notebook } => info::execute(&notebook)?,

        Commands::Run {
            notebook,
            interpreter,
            args,
            timeout,
            output,
            no_timing,
            keep_going,
        } => {
            let options = run::RunOptions {
                interpreter,
                args,
                timeout: timeout.map(std::time::Duration::from_secs),
                output,
                record_timing: !no_timing,
                stop_on_error: !keep_going,
            };
            run::execute(&notebook, options).await?;
        }

        Commands::Clear { notebook } => clear::execute(&notebook)?,
    }

    Ok(())
}
