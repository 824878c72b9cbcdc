//! Flowsim - a step-timeline simulator for a serverless order flow
//!
//! This library provides the core functionality for Flowsim, including:
//! - Stage registry, schedule, session and diagram layout models
//! - A deterministic timer queue and the timeline scheduler built on it
//! - An externally driven tracker for flows reported from outside
//! - Progress projection and edge packet animation
//! - CLI command parsing and execution
//! - Duration parsing and formatting utilities
//!
//! # Example
//!
//! ```no_run
//! use flowsim::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod config;
pub mod models;
pub mod timeline;
pub mod cli;
pub mod utils;
