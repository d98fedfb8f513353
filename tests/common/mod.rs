//! Common test utilities for revwatch integration tests.
//!
//! This module provides:
//! - `WatchEnv`: a watcher running on a background thread over a temp root
//! - Deadline polling, since OS notifications arrive asynchronously
//! - Helpers to list and read version artifacts

pub mod env;

pub use env::*;
