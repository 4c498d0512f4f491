//! Execution-state machine for Moonbook notebooks.
//!
//! ```text
//! Operation ──► reduce(&State, Operation) ──► State ──► Arc<State> snapshot
//!     ▲                                                      │
//!     └──────────────── host application ◄───────────────────┘
//! ```

mod operation;
mod reducer;
mod snapshot;
mod store;
mod tracker;

pub use operation::Operation;
pub use reducer::{Transition, reduce};
pub use snapshot::State;
pub use store::Store;
pub use tracker::ExecutionTracker;
