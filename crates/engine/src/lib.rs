//! Task-assignment eligibility engine.
//!
//! Given a request to assign one or more contributors to a work item, the
//! engine decides whether the assignment is permitted, computes a deadline,
//! and accounts for each contributor's outstanding workload. It holds no
//! state of its own; every decision is recomputed from the platform via
//! the [`tracker::Tracker`] trait.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Fallible paths are documented on the error type

pub mod deadline;
pub mod duration;
pub mod error;
pub mod history;
pub mod limits;
pub mod orchestrator;
pub mod review;
pub mod settings;

pub use error::EngineError;
pub use orchestrator::{
    AssignmentEngine, AssignmentReceipt, AssignmentRequest, Decision, RejectReason,
};
pub use settings::EngineSettings;
