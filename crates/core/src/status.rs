// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner and stage status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by runners and stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Queued, not yet admitted
    #[default]
    Waiting,
    /// Admitted and executing on a host
    Running,
    /// Ended with an error
    Failed,
    /// Completed cleanly
    Finished,
    /// Timed out by the liveness monitor
    Timeout,
}

impl RunStatus {
    /// Terminal statuses release host and licence capacity.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Finished | RunStatus::Timeout
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Waiting => write!(f, "Waiting"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Failed => write!(f, "Failed"),
            RunStatus::Finished => write!(f, "Finished"),
            RunStatus::Timeout => write!(f, "Timeout"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
