//! Run command implementation for Moonbook CLI.
//!
//! Executes every code cell of a notebook through an external interpreter
//! program and saves the outputs.

use std::path::Path;
use std::time::{Duration, Instant};

use moonbook_core::{CellId, Output};
use moonbook_session::{
    ExecutionOutcome, NotebookSession, ProcessConfig, ProcessInterpreter, SessionConfig,
};

use crate::colors;

/// Options for the run command.
pub struct RunOptions {
    pub interpreter: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
    pub output: Option<String>,
    pub record_timing: bool,
    pub stop_on_error: bool,
}

/// Execute a notebook.
pub async fn execute(notebook_path: &str, options: RunOptions) -> anyhow::Result<()> {
    let start = Instant::now();
    let path = Path::new(notebook_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", notebook_path);
    }

    let config = SessionConfig {
        execution_timeout: options.timeout,
        record_timing: options.record_timing,
        stop_on_error: options.stop_on_error,
        ..SessionConfig::default()
    };
    let interpreter = ProcessInterpreter::new(ProcessConfig {
        program: options.interpreter.clone(),
        args: options.args,
    });

    let (session, _rx) = NotebookSession::<ProcessInterpreter>::open(path, config).await?;
    let mut session = session.with_interpreter(interpreter);

    println!(
        "\n{}Moonbook Run{} - {} via {}",
        colors::BOLD,
        colors::RESET,
        path.display(),
        options.interpreter
    );
    println!("{}", "─".repeat(50));

    let results = session.execute_all().await?;
    if results.is_empty() {
        println!(
            "\n{}No code cells found in notebook.{}",
            colors::YELLOW,
            colors::RESET
        );
    }

    let state = session.state();
    for (cell_id, outcome) in &results {
        print_outcome(cell_id, outcome);
        if let Some(cell) = state.document().cell(cell_id) {
            for output in cell.outputs() {
                print_output(output);
            }
        }
    }

    let saved = match options.output {
        Some(output) => session.save_as(output).await?,
        None => session.save().await?,
    };

    let failed = results.iter().filter(|(_, o)| o.is_failed()).count();
    let cancelled = results.iter().filter(|(_, o)| o.is_cancelled()).count();

    println!("\n{}", "─".repeat(50));
    println!(
        "{}Completed{} {} cells in {:.2}s, saved to {}",
        colors::GREEN,
        colors::RESET,
        results.len(),
        start.elapsed().as_secs_f64(),
        saved.display()
    );

    if failed + cancelled > 0 {
        anyhow::bail!("{} cell(s) failed, {} cancelled", failed, cancelled);
    }

    Ok(())
}

fn print_outcome(cell_id: &CellId, outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Completed { execution_count } => println!(
            "{}[{}]{} {} {}✓{}",
            colors::CYAN,
            execution_count.map_or_else(|| " ".to_string(), |c| c.to_string()),
            colors::RESET,
            cell_id,
            colors::GREEN,
            colors::RESET
        ),
        ExecutionOutcome::Failed { name, message, .. } => println!(
            "{}[{}]{} {} {}✗ {}: {}{}",
            colors::CYAN,
            outcome.execution_count().map_or_else(|| " ".to_string(), |c| c.to_string()),
            colors::RESET,
            cell_id,
            colors::RED,
            name,
            message,
            colors::RESET
        ),
        ExecutionOutcome::Cancelled { reason } => println!(
            "{}[ ]{} {} {}{}{}",
            colors::CYAN,
            colors::RESET,
            cell_id,
            colors::YELLOW,
            reason,
            colors::RESET
        ),
        ExecutionOutcome::Skipped => {}
    }
}

fn print_output(output: &Output) {
    match output {
        Output::Error { traceback, .. } => {
            for line in traceback {
                println!("    {}{}{}", colors::DIM, line, colors::RESET);
            }
        }
        other => {
            if let Some(text) = other.text_plain() {
                for line in text.lines() {
                    println!("    {}", line);
                }
            }
        }
    }
}
