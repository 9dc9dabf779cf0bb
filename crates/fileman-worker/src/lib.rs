//! Background job consumers for Files Manager.
//!
//! This crate provides:
//! - A [`JobHandler`] per queue implementing the job's contract
//! - A [`JobExecutor`] that runs one job and reports the outcome to its queue
//! - A [`WorkerRunner`] with one consumer loop per queue

pub mod error;
pub mod executor;
pub mod jobs;
pub mod runner;

pub use error::JobError;
pub use executor::{JobExecutor, JobHandler, JobOutcome};
pub use runner::WorkerRunner;
