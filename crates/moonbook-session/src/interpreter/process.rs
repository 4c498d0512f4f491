//! Interpreter backed by an external program.
//!
//! Each evaluation spawns the program, writes the cell source to its stdin
//! and streams its stdout back as prints. The child is killed when the
//! evaluation future is dropped, so interrupts and timeouts stop it.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use super::{EvalFailure, EvalRequest, EvalResult, EvalValue, Interpreter};

/// How to launch the interpreter program.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Program to run, resolved through `PATH`.
    pub program: String,
    /// Arguments passed before the source is written to stdin.
    pub args: Vec<String>,
}

impl ProcessConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Runs one process per evaluated cell.
#[derive(Debug, Clone)]
pub struct ProcessInterpreter {
    config: ProcessConfig,
}

impl ProcessInterpreter {
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }
}

impl Interpreter for ProcessInterpreter {
    fn evaluate(
        &mut self,
        request: EvalRequest,
    ) -> impl std::future::Future<Output = EvalResult> + Send {
        let config = self.config.clone();
        async move { run_process(&config, request).await }
    }
}

async fn run_process(config: &ProcessConfig, request: EvalRequest) -> EvalResult {
    tracing::debug!("Spawning {} for cell {}", config.program, request.cell_id);

    let mut child = Command::new(&config.program)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            EvalFailure::new(
                "SpawnError",
                format!("failed to start '{}': {}", config.program, e),
            )
        })?;

    let (Some(mut stdin), Some(stdout), Some(mut stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        return Err(EvalFailure::new(
            "SpawnError",
            format!("'{}' started without piped stdio", config.program),
        ));
    };

    // Feed stdin and drain stderr concurrently so a chatty child cannot
    // block on a full pipe.
    let source = request.source;
    let writer = tokio::spawn(async move {
        if let Err(e) = stdin.write_all(source.as_bytes()).await {
            tracing::debug!("Interpreter closed stdin early: {}", e);
        }
    });
    let stderr_reader = tokio::spawn(async move {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text).await;
        text
    });

    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => request.prints.print(format!("{}\n", line)),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed reading interpreter output: {}", e);
                break;
            }
        }
    }

    let status = child.wait().await.map_err(|e| {
        EvalFailure::new(
            "ProcessError",
            format!("failed waiting for '{}': {}", config.program, e),
        )
    })?;
    let _ = writer.await;
    let stderr_text = stderr_reader.await.unwrap_or_default();

    if status.success() {
        if !stderr_text.is_empty() {
            tracing::debug!("{} wrote to stderr: {}", config.program, stderr_text.trim_end());
        }
        return Ok(EvalValue::none());
    }

    let message = match status.code() {
        Some(code) => format!("{} exited with status {}", config.program, code),
        None => format!("{} was terminated by a signal", config.program),
    };
    let traceback = stderr_text.lines().map(str::to_string).collect();
    Err(EvalFailure::new("ProcessError", message).with_traceback(traceback))
}
