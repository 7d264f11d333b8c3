// src/task/mod.rs

//! Task data model: definitions, run records, and validation.
//!
//! - [`model`] holds the [`Task`] definition and its run bookkeeping.
//! - [`run`] holds the [`TaskRun`] record for a single invocation.
//! - [`validate`] gates tasks at the store boundary so malformed
//!   definitions never reach the scheduler.

pub mod model;
pub mod run;
pub mod validate;

pub use model::{NotifyConfig, RetryPolicy, Task, TaskStatus};
pub use run::{NotifyOutcome, TaskRun, MAX_OUTPUT_CHARS};
pub use validate::validate_task;
