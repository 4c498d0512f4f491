//! Moonbook notebook sessions.
//!
//! Connects the state store to an interpreter and to the notebook file.
//!
//! # Architecture
//!
//! The session crate consists of:
//! - **Session**: owns the store, runs cells, loads and saves files
//! - **Interpreter**: the evaluation seam, plus a process-backed adapter
//! - **Protocol**: events broadcast to subscribers
//! - **Config**: execution and event settings
//!
//! ```text
//!             dispatch(op)                     evaluate(request)
//!   host ───────────────────► NotebookSession ───────────────────► Interpreter
//!    ▲                          │      ▲                               │
//!    │   SessionEvent           │      └──── InterpreterEvent::Print ──┘
//!    └──────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod interpreter;
pub mod protocol;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use interpreter::{
    EvalFailure, EvalRequest, EvalResult, EvalValue, Interpreter, InterpreterEvent, PrintSink,
    ProcessConfig, ProcessInterpreter,
};
pub use protocol::{CancelReason, ExecutionOutcome, SessionEvent};
pub use session::{EvalOutcome, InterruptHandle, NotebookSession, PendingExecution};
