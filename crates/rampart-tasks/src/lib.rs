//! # rampart-tasks
//!
//! Bounded worker-pool task execution for the Rampart admin backend.
//!
//! This crate provides:
//! - A fixed worker pool consuming a bounded queue with non-blocking,
//!   backpressure-aware submission
//! - Task tracking with monotonic status transitions and polled waiting
//! - Batch fan-out helpers: collect-all-errors processing and
//!   order-preserving parallel map
//!
//! ## Modules
//!
//! - [`batch`] - Fan-out/fan-in batch operations
//! - [`error`] - Task error taxonomy
//! - [`executor`] - The worker-pool executor
//! - [`types`] - Task records and status

pub mod batch;
pub mod error;
pub mod executor;
pub mod types;

pub use batch::{chunk, BatchOutcome, BatchProcessor};
pub use error::TaskError;
pub use executor::{ExecutorConfig, TaskExecutor, TaskHandler};
pub use types::{Task, TaskStatus};

/// Type alias for task operation results.
pub type TaskResult<T> = Result<T, TaskError>;
