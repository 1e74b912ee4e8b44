//! Typed GitHub access layer for the dibs assignment bot.
//!
//! This crate provides:
//! - Record types for the platform boundary (work items, pull requests,
//!   reviews, assignment history)
//! - The `Tracker` trait the eligibility engine consumes
//! - A GitHub REST implementation of that trait
//! - The read-fallback retry policy for queries with an alternate method

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Most async API methods can fail

pub mod client;
pub mod error;
pub mod models;
pub mod retry;
pub mod traits;

pub use client::{GitHubApi, GitHubTracker};
pub use error::TrackerError;
pub use models::*;
pub use retry::ReadFallback;
pub use traits::Tracker;
