//! Notebook session management.
//!
//! A session owns the state store of one open notebook, the interpreter
//! that runs its code cells, and the file it was loaded from. Every state
//! change goes through [`NotebookSession::dispatch`] and is broadcast to
//! subscribers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use moonbook_core::{
    Cell, CellId, Document, ExecuteTime, Operation, Output, State, Store,
};
use tokio::sync::{Notify, broadcast, mpsc};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::interpreter::{
    EvalFailure, EvalRequest, EvalResult, EvalValue, Interpreter, InterpreterEvent, PrintSink,
};
use crate::protocol::{CancelReason, ExecutionOutcome, SessionEvent};

/// Handle for interrupting whatever cell is currently running.
///
/// Cloneable and usable from any task. Interrupting while nothing runs has
/// no effect on later executions.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    notify: Arc<Notify>,
}

impl InterruptHandle {
    /// Cancel the running evaluation.
    pub fn interrupt(&self) {
        tracing::info!("Interrupt requested");
        self.notify.notify_waiters();
    }
}

/// How an evaluation ended, as reported to [`NotebookSession::finish_execution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalOutcome {
    Completed(EvalValue),
    Failed(EvalFailure),
    Cancelled(CancelReason),
}

impl From<EvalResult> for EvalOutcome {
    fn from(result: EvalResult) -> Self {
        match result {
            Ok(value) => Self::Completed(value),
            Err(failure) => Self::Failed(failure),
        }
    }
}

/// A started execution waiting for its result.
///
/// Produced by [`NotebookSession::begin_execution`]. The cell is in the
/// executing set until the pending execution is finished.
#[derive(Debug)]
pub struct PendingExecution {
    request: EvalRequest,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl PendingExecution {
    pub fn cell_id(&self) -> &CellId {
        &self.request.cell_id
    }

    /// The request to hand to an interpreter.
    pub fn request(&self) -> EvalRequest {
        self.request.clone()
    }
}

/// A notebook session.
pub struct NotebookSession<I> {
    /// The state store.
    store: Store,

    /// Evaluates code cells. `None` until one is attached.
    interpreter: Option<I>,

    /// File the notebook is saved to.
    path: Option<PathBuf>,

    config: SessionConfig,

    /// Broadcast channel for session events.
    tx: broadcast::Sender<SessionEvent>,

    /// Print channel shared by every request.
    prints_tx: mpsc::UnboundedSender<InterpreterEvent>,
    prints_rx: mpsc::UnboundedReceiver<InterpreterEvent>,

    interrupt: InterruptHandle,
}

impl<I: Interpreter> NotebookSession<I> {
    /// Create a session holding a fresh document.
    pub fn new(config: SessionConfig) -> (Self, broadcast::Receiver<SessionEvent>) {
        Self::with_document(Document::new(), None, config)
    }

    fn with_document(
        document: Document,
        path: Option<PathBuf>,
        config: SessionConfig,
    ) -> (Self, broadcast::Receiver<SessionEvent>) {
        let (tx, rx) = broadcast::channel(config.event_capacity.max(1));
        let (prints_tx, prints_rx) = mpsc::unbounded_channel();

        let session = Self {
            store: Store::with_document(document),
            interpreter: None,
            path,
            config,
            tx,
            prints_tx,
            prints_rx,
            interrupt: InterruptHandle::default(),
        };
        (session, rx)
    }

    /// Open a notebook file.
    pub async fn open(
        path: impl AsRef<Path>,
        config: SessionConfig,
    ) -> SessionResult<(Self, broadcast::Receiver<SessionEvent>)> {
        let path = path.as_ref();
        let document = read(path).await?;
        tracing::info!("Opened {} ({} cells)", path.display(), document.len());
        Ok(Self::with_document(document, Some(path.to_path_buf()), config))
    }

    /// Attach the interpreter used for code cells.
    pub fn with_interpreter(mut self, interpreter: I) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    pub fn set_interpreter(&mut self, interpreter: Option<I>) {
        self.interpreter = interpreter;
    }

    pub fn interpreter(&self) -> Option<&I> {
        self.interpreter.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<State> {
        self.store.state()
    }

    /// The focused cell, if any.
    pub fn active_cell(&self) -> Option<&Cell> {
        self.store.active_cell()
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Print sink bound to `cell_id`.
    ///
    /// Text sent through it is appended to the cell the next time an
    /// execution finishes.
    pub fn print_sink(&self, cell_id: CellId) -> PrintSink {
        PrintSink::new(cell_id, self.prints_tx.clone())
    }

    /// Apply an operation and broadcast the new snapshot if it changed.
    pub fn dispatch(&mut self, operation: Operation) -> Arc<State> {
        let before = self.store.state();
        let after = self.store.dispatch(operation);
        if !Arc::ptr_eq(&before, &after) {
            let _ = self.tx.send(SessionEvent::StateChanged {
                state: Arc::clone(&after),
            });
        }
        after
    }

    /// Replace the document. The file path is kept.
    pub fn load_document(&mut self, document: Document) -> Arc<State> {
        let state = self.store.load(document);
        self.publish_loaded(&state);
        state
    }

    /// Replace the document with a fresh one and forget the file path.
    pub fn new_document(&mut self) -> Arc<State> {
        self.path = None;
        let state = self.store.reset();
        self.publish_loaded(&state);
        state
    }

    fn publish_loaded(&self, state: &Arc<State>) {
        let _ = self.tx.send(SessionEvent::Loaded {
            path: self.path.clone(),
        });
        let _ = self.tx.send(SessionEvent::StateChanged {
            state: Arc::clone(state),
        });
    }

    /// Clear the dirty flag.
    pub fn mark_saved(&mut self) -> Arc<State> {
        let before = self.store.state();
        let after = self.store.mark_saved();
        if !Arc::ptr_eq(&before, &after) {
            let _ = self.tx.send(SessionEvent::StateChanged {
                state: Arc::clone(&after),
            });
        }
        after
    }

    /// Save to the current path.
    pub async fn save(&mut self) -> SessionResult<PathBuf> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.write_to(&path).await?;
        Ok(path)
    }

    /// Save to `path` and make it the current path.
    pub async fn save_as(&mut self, path: impl AsRef<Path>) -> SessionResult<PathBuf> {
        let path = path.as_ref().to_path_buf();
        self.write_to(&path).await?;
        self.path = Some(path.clone());
        Ok(path)
    }

    async fn write_to(&mut self, path: &Path) -> SessionResult<()> {
        let json = moonbook_sync::to_json(self.store.document())?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| SessionError::io(path, e))?;

        tracing::info!("Saved {}", path.display());
        self.mark_saved();
        let _ = self.tx.send(SessionEvent::Saved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Look up a cell; `Ok(false)` for prose.
    fn check_runnable(&self, cell_id: &CellId) -> SessionResult<bool> {
        self.store
            .document()
            .cell(cell_id)
            .map(Cell::is_code)
            .ok_or_else(|| SessionError::CellNotFound(cell_id.clone()))
    }

    /// Start running a code cell without evaluating it.
    ///
    /// Returns `None` for prose cells. The caller evaluates
    /// [`PendingExecution::request`] and reports back through
    /// [`finish_execution`](Self::finish_execution); the session stays
    /// usable in between.
    pub fn begin_execution(&mut self, cell_id: &CellId) -> SessionResult<Option<PendingExecution>> {
        if !self.check_runnable(cell_id)? {
            tracing::debug!("Skipping prose cell {}", cell_id);
            return Ok(None);
        }

        let source = self
            .store
            .document()
            .cell(cell_id)
            .map(Cell::source_text)
            .unwrap_or_default();

        if self.config.clear_outputs_before_run {
            self.dispatch(Operation::ClearOutputs {
                cell_id: cell_id.clone(),
            });
        }
        self.dispatch(Operation::StartExecution {
            cell_id: cell_id.clone(),
        });
        let _ = self.tx.send(SessionEvent::ExecutionStarted {
            cell_id: cell_id.clone(),
        });

        tracing::debug!("Executing cell {}", cell_id);
        Ok(Some(PendingExecution {
            request: EvalRequest {
                cell_id: cell_id.clone(),
                source,
                prints: self.print_sink(cell_id.clone()),
            },
            started_at: Utc::now(),
            started: Instant::now(),
        }))
    }

    /// Record the result of a pending execution.
    ///
    /// If the cell was deleted while running, nothing is recorded for it.
    pub fn finish_execution(
        &mut self,
        pending: PendingExecution,
        outcome: EvalOutcome,
    ) -> ExecutionOutcome {
        let cell_id = pending.request.cell_id.clone();
        self.drain_prints();

        let outcome = match outcome {
            EvalOutcome::Completed(value) => {
                let count = self.record_execution(&cell_id);
                if let Some(text) = value.text.filter(|t| !t.is_empty()) {
                    self.dispatch(Operation::AppendOutput {
                        cell_id: cell_id.clone(),
                        output: Output::text_result(text, count),
                    });
                }
                self.record_timing(&cell_id, pending.started_at);
                ExecutionOutcome::Completed {
                    execution_count: count,
                }
            }
            EvalOutcome::Failed(failure) => {
                let count = self.record_execution(&cell_id);
                tracing::debug!("Cell {} failed: {}", cell_id, failure);
                self.dispatch(Operation::AppendOutput {
                    cell_id: cell_id.clone(),
                    output: Output::error(
                        failure.name.clone(),
                        failure.message.clone(),
                        failure.traceback,
                    ),
                });
                self.record_timing(&cell_id, pending.started_at);
                ExecutionOutcome::Failed {
                    execution_count: count,
                    name: failure.name,
                    message: failure.message,
                }
            }
            EvalOutcome::Cancelled(reason) => {
                tracing::info!("Cell {} {}", cell_id, reason);
                ExecutionOutcome::Cancelled { reason }
            }
        };

        self.dispatch(Operation::StopExecution {
            cell_id: cell_id.clone(),
        });

        let duration_ms = pending.started.elapsed().as_millis() as u64;
        let _ = self.tx.send(SessionEvent::ExecutionFinished {
            cell_id,
            outcome: outcome.clone(),
            duration_ms,
        });
        outcome
    }

    fn record_execution(&mut self, cell_id: &CellId) -> Option<u32> {
        let state = self.dispatch(Operation::ExecuteCell {
            cell_id: cell_id.clone(),
        });
        state
            .document()
            .cell(cell_id)
            .and_then(Cell::execution_count)
    }

    fn record_timing(&mut self, cell_id: &CellId, started_at: DateTime<Utc>) {
        if !self.config.record_timing {
            return;
        }
        match ExecuteTime::new(started_at, Utc::now()).to_patch() {
            Ok(patch) => {
                self.dispatch(Operation::UpdateCellMetadata {
                    cell_id: cell_id.clone(),
                    patch,
                });
            }
            Err(e) => tracing::warn!("Failed to record timing for {}: {}", cell_id, e),
        }
    }

    /// Append everything printed so far, one stream output per run of
    /// consecutive prints to the same cell.
    fn drain_prints(&mut self) {
        let mut batches: Vec<(CellId, String)> = Vec::new();
        while let Ok(InterpreterEvent::Print { cell_id, text }) = self.prints_rx.try_recv() {
            match batches.last_mut() {
                Some((last, buffer)) if *last == cell_id => buffer.push_str(&text),
                _ => batches.push((cell_id, text)),
            }
        }

        for (cell_id, text) in batches {
            let output = Output::stream(self.config.stream_name.clone(), &text);
            self.dispatch(Operation::AppendOutput { cell_id, output });
        }
    }

    /// Run one cell through the attached interpreter.
    pub async fn execute_cell(&mut self, cell_id: &CellId) -> SessionResult<ExecutionOutcome> {
        if !self.check_runnable(cell_id)? {
            return Ok(ExecutionOutcome::Skipped);
        }
        if self.interpreter.is_none() {
            return Err(SessionError::InterpreterUnavailable);
        }
        let Some(pending) = self.begin_execution(cell_id)? else {
            return Ok(ExecutionOutcome::Skipped);
        };

        let outcome = {
            let Some(interpreter) = self.interpreter.as_mut() else {
                return Err(SessionError::InterpreterUnavailable);
            };
            let interrupted = self.interrupt.notify.notified();
            let evaluation = interpreter.evaluate(pending.request());

            match self.config.execution_timeout {
                Some(limit) => tokio::select! {
                    result = tokio::time::timeout(limit, evaluation) => match result {
                        Ok(result) => EvalOutcome::from(result),
                        Err(_) => EvalOutcome::Cancelled(CancelReason::TimedOut),
                    },
                    _ = interrupted => EvalOutcome::Cancelled(CancelReason::Interrupted),
                },
                None => tokio::select! {
                    result = evaluation => EvalOutcome::from(result),
                    _ = interrupted => EvalOutcome::Cancelled(CancelReason::Interrupted),
                },
            }
        };

        Ok(self.finish_execution(pending, outcome))
    }

    /// Run every code cell in document order.
    ///
    /// Stops after a cancellation, and after a failure when
    /// `stop_on_error` is set. Cells deleted during the run are skipped.
    pub async fn execute_all(&mut self) -> SessionResult<Vec<(CellId, ExecutionOutcome)>> {
        if self.interpreter.is_none() {
            return Err(SessionError::InterpreterUnavailable);
        }

        let ids: Vec<CellId> = self
            .store
            .document()
            .iter()
            .filter(|c| c.is_code())
            .map(|c| c.id().clone())
            .collect();

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.store.document().contains(&id) {
                continue;
            }
            let outcome = self.execute_cell(&id).await?;
            let stop = outcome.is_cancelled() || (outcome.is_failed() && self.config.stop_on_error);
            results.push((id, outcome));
            if stop {
                tracing::info!("Stopping run after cell {}", results.len());
                break;
            }
        }
        Ok(results)
    }
}

async fn read(path: &Path) -> SessionResult<Document> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SessionError::io(path, e))?;
    Ok(moonbook_sync::parse_document(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonbook_core::CellKind;

    struct Echo;

    impl Interpreter for Echo {
        fn evaluate(
            &mut self,
            request: EvalRequest,
        ) -> impl std::future::Future<Output = EvalResult> + Send {
            async move { Ok(EvalValue::text(request.source)) }
        }
    }

    fn session() -> NotebookSession<Echo> {
        NotebookSession::new(SessionConfig::default()).0
    }

    fn first_id(session: &NotebookSession<Echo>) -> CellId {
        session.state().document().cells()[0].id().clone()
    }

    #[test]
    fn test_dispatch_broadcasts_changes_only() {
        let (mut session, mut rx) = NotebookSession::<Echo>::new(SessionConfig::default());
        let id = first_id(&session);

        session.dispatch(Operation::UpdateCell {
            cell_id: id,
            source: vec!["1".into()],
        });
        session.dispatch(Operation::DeleteCell {
            cell_id: CellId::from("missing"),
        });

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::StateChanged { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_begin_execution_marks_executing() {
        let mut session = session();
        let id = first_id(&session);

        let pending = session.begin_execution(&id).unwrap().unwrap();
        assert!(session.state().is_executing(&id));
        assert_eq!(pending.cell_id(), &id);

        session.finish_execution(pending, EvalOutcome::Completed(EvalValue::none()));
        assert!(!session.state().is_executing(&id));
    }

    #[test]
    fn test_begin_execution_skips_prose() {
        let mut session = session();
        let state = session.dispatch(Operation::AddCell {
            kind: CellKind::Prose,
            index: None,
        });
        let prose = state.active_cell().unwrap().clone();

        assert!(session.begin_execution(&prose).unwrap().is_none());
        assert!(!session.state().is_executing(&prose));
    }

    #[test]
    fn test_unknown_cell_rejected() {
        let mut session = session();
        let err = session.begin_execution(&CellId::from("nope")).unwrap_err();
        assert!(matches!(err, SessionError::CellNotFound(_)));
    }

    #[test]
    fn test_prints_grouped_per_cell() {
        let mut session = session();
        let id = first_id(&session);
        let pending = session.begin_execution(&id).unwrap().unwrap();

        let sink = pending.request().prints;
        sink.print("a\n");
        sink.print("b\n");

        session.finish_execution(pending, EvalOutcome::Completed(EvalValue::none()));
        let state = session.state();
        let outputs = state.document().cell(&id).unwrap().outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0], Output::stream("stdout", "a\nb\n"));
    }

    #[test]
    fn test_interrupt_without_execution_is_harmless() {
        let session = session();
        session.interrupt_handle().interrupt();
    }
}
