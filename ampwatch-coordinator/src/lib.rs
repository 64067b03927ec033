//! Ampwatch Coordinator
//!
//! Client-side driver for long-running battery diagnostic workloads.
//!
//! Architecture:
//! - Configuration: cadence, backoff and timeout settings
//! - Runtime: the step-execution loop and the status poller, one pair per workload
//! - Merge: folds loop observations into one consistent state
//! - Coordinator: lifecycle controls (`start`, `cancel`, `reset`) and the observable state
//!
//! The executor advances a workload at most one step per call, so the step loop
//! keeps triggering steps while the poller independently reports live progress.
//! Both loops only send messages; the coordinator is the single writer of the
//! state.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod merge;
pub mod runtime;

pub use config::CoordinatorConfig;
pub use coordinator::WorkloadCoordinator;
pub use error::{Result, WorkloadError};
pub use events::{StepReport, WorkloadEvent};
