//! The seam between a session and whatever evaluates cell source.
//!
//! An interpreter receives one [`EvalRequest`] at a time and resolves to a
//! value or a structured failure. Text printed while running does not go
//! through the return value: it is sent over the request's [`PrintSink`]
//! and collected by the session once the evaluation ends.

mod process;

pub use process::{ProcessConfig, ProcessInterpreter};

use std::future::Future;

use moonbook_core::CellId;
use tokio::sync::mpsc;

/// Message sent from an interpreter to its session while a cell runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpreterEvent {
    /// Text printed by the cell.
    Print { cell_id: CellId, text: String },
}

/// Sending half of the print channel, bound to one cell.
#[derive(Debug, Clone)]
pub struct PrintSink {
    cell_id: CellId,
    tx: mpsc::UnboundedSender<InterpreterEvent>,
}

impl PrintSink {
    pub(crate) fn new(cell_id: CellId, tx: mpsc::UnboundedSender<InterpreterEvent>) -> Self {
        Self { cell_id, tx }
    }

    pub fn cell_id(&self) -> &CellId {
        &self.cell_id
    }

    /// Print text for the bound cell.
    pub fn print(&self, text: impl Into<String>) {
        self.print_to(self.cell_id.clone(), text);
    }

    /// Print text attributed to another cell.
    pub fn print_to(&self, cell_id: CellId, text: impl Into<String>) {
        // The session owns the receiver; a closed channel means it is gone.
        let _ = self.tx.send(InterpreterEvent::Print {
            cell_id,
            text: text.into(),
        });
    }
}

/// One evaluation request.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub cell_id: CellId,
    /// Full cell source.
    pub source: String,
    pub prints: PrintSink,
}

/// Value produced by a successful evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalValue {
    /// Plain text rendering. `None` or empty records no result output.
    pub text: Option<String>,
}

impl EvalValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Structured failure reported by an interpreter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct EvalFailure {
    pub name: String,
    pub message: String,
    pub traceback: Vec<String>,
}

impl EvalFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            traceback: Vec::new(),
        }
    }

    pub fn with_traceback(mut self, traceback: Vec<String>) -> Self {
        self.traceback = traceback;
        self
    }
}

/// Result of one evaluation.
pub type EvalResult = Result<EvalValue, EvalFailure>;

/// Something that can evaluate cell source.
pub trait Interpreter: Send {
    /// Evaluate one cell.
    ///
    /// Dropping the returned future cancels the evaluation.
    fn evaluate(&mut self, request: EvalRequest) -> impl Future<Output = EvalResult> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_sink_sends_to_bound_cell() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = PrintSink::new(CellId::from("a"), tx);

        sink.print("hello\n");
        sink.print_to(CellId::from("b"), "elsewhere\n");

        assert_eq!(
            rx.try_recv().unwrap(),
            InterpreterEvent::Print {
                cell_id: CellId::from("a"),
                text: "hello\n".into()
            }
        );
        match rx.try_recv().unwrap() {
            InterpreterEvent::Print { cell_id, .. } => assert_eq!(cell_id.as_str(), "b"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_print_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        PrintSink::new(CellId::from("a"), tx).print("lost");
    }

    #[test]
    fn test_failure_display() {
        let failure = EvalFailure::new("TypeError", "expected Int")
            .with_traceback(vec!["at line 1".into()]);
        assert_eq!(failure.to_string(), "TypeError: expected Int");
        assert_eq!(failure.traceback.len(), 1);
    }
}
