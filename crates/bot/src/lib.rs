//! Webhook service for the dibs task-assignment bot.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - Webhook payload parsing and signature verification
//! - Slash-command parsing (`/start`, `/stop`)
//! - The HTTP server and the handlers bridging commands to the engine

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Many async API methods can fail

pub mod commands;
pub mod config;
pub mod handlers;
pub mod server;
pub mod webhooks;

pub use commands::Command;
pub use config::Config;
pub use server::{build_router, AppState};
pub use webhooks::{verify_webhook_signature, IssueCommentEvent};
