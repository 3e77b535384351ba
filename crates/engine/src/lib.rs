// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avian-engine: admission control, launch, liveness and runner logs.
//!
//! The engine owns the two periodic loops (queue and liveness monitor),
//! the per-runner launch protocol, the terminal lifecycle transitions
//! shared with the RPC surface, and the per-runner log files the script
//! writes to through the RPC surface.

pub mod failure;
#[cfg(test)]
mod test_helpers;
pub mod lifecycle;
pub mod monitor;
pub mod queue;
pub mod runlog;
pub mod script;
pub mod spawn;

pub use failure::caused_by;
pub use monitor::Monitor;
pub use queue::Queue;
pub use runlog::{ItemRecord, MessageRecord, RunnerLogs};

use std::time::Duration;

/// Default period for the queue and liveness loops.
pub const LOOP_PERIOD: Duration = Duration::from_secs(2 * 60);
