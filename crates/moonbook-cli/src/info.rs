//! Info command implementation for Moonbook CLI.
//!
//! Prints a short summary of a notebook without running anything.

use std::path::Path;

use moonbook_core::{CellKind, ExecuteTime};
use moonbook_sync::read_document;

use crate::colors;

/// Execute the info command.
pub fn execute(notebook_path: &str) -> anyhow::Result<()> {
    let path = Path::new(notebook_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", notebook_path);
    }

    let document = read_document(path)?;

    let code = document.iter().filter(|c| c.kind() == CellKind::Code).count();
    let prose = document.len() - code;
    let executed = document
        .iter()
        .filter(|c| c.execution_count().is_some())
        .count();
    let outputs: usize = document.iter().map(|c| c.outputs().len()).sum();
    let errors = document
        .iter()
        .flat_map(|c| c.outputs())
        .filter(|o| o.is_error())
        .count();
    let timed_ms: i64 = document
        .iter()
        .filter_map(|c| ExecuteTime::from_metadata(c.metadata()).ok().flatten())
        .map(|t| t.duration().num_milliseconds())
        .sum();

    let version = document.format_version();
    let kernel = document
        .metadata()
        .kernelspec
        .as_ref()
        .map(|k| k.display_name.as_str())
        .unwrap_or("unknown");

    println!(
        "\n{}{}{}",
        colors::BOLD,
        path.file_name().unwrap_or_default().to_string_lossy(),
        colors::RESET
    );
    println!("{}", "─".repeat(50));
    println!("  {}Format:{}   {}.{}", colors::DIM, colors::RESET, version.major, version.minor);
    println!("  {}Kernel:{}   {}", colors::DIM, colors::RESET, kernel);
    println!(
        "  {}Cells:{}    {} ({} code, {} prose)",
        colors::DIM,
        colors::RESET,
        document.len(),
        code,
        prose
    );
    println!("  {}Executed:{} {}", colors::DIM, colors::RESET, executed);
    println!("  {}Outputs:{}  {}", colors::DIM, colors::RESET, outputs);
    if errors > 0 {
        println!("  {}Errors:{}   {}", colors::RED, colors::RESET, errors);
    }
    if timed_ms > 0 {
        println!(
            "  {}Run time:{} {:.2}s",
            colors::DIM,
            colors::RESET,
            timed_ms as f64 / 1000.0
        );
    }

    Ok(())
}
