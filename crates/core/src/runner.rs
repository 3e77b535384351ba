// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner: a named pipeline of stages bound to one host and one licence pool.

use crate::case::CaseSettings;
use crate::record::Meta;
use crate::stage::{Stage, StageKind};
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// One forensic job. Owns its stages, switches and case settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runner {
    #[serde(flatten)]
    pub meta: Meta,
    /// Unique name
    pub name: String,
    /// Target worker host
    pub hostname: String,
    /// Address of the licence server to draw from
    pub nms: String,
    /// Licence type to check out
    pub licence: String,
    /// JVM heap tag passed as -Xmx
    pub xmx: String,
    /// Worker count reserved against the licence server pool
    pub workers: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub status: RunStatus,
    /// Last heartbeat while active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_at_ms: Option<u64>,
    /// Case id reported by the script on Start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub case_settings: CaseSettings,
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Raw console-tool switches passed through verbatim
    #[serde(default)]
    pub switches: Vec<String>,
}

impl Runner {
    /// Whether any InApp stage still has work to do.
    pub fn has_pending_inapp(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.kind, StageKind::InApp(_)) && !s.is_finished())
    }

    /// Host-side paths the runner depends on: case location, stage paths,
    /// and any path-bearing switches.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = vec![self.case_settings.case_location.as_str()];
        for stage in &self.stages {
            paths.extend(stage.paths());
        }
        for switch in &self.switches {
            if let Some((_, path)) = switch.split_once('=') {
                if path.contains(':') || path.starts_with('/') || path.starts_with('\\') {
                    paths.push(path);
                }
            }
        }
        paths
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
