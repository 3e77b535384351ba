// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator YAML configuration files.
//!
//! Three shapes under one `api` key: `servers` (host apply requests),
//! `nmsApply` (licence-server apply requests) and `runner` (one runner
//! apply request).

use anyhow::{bail, Context};
use avian_core::{HostSpec, LicenceServerBatch, RunnerSpec};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
}

#[derive(Debug, Default, Deserialize)]
pub struct Api {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    #[serde(default, rename = "nmsApply")]
    pub nms: LicenceServerBatch,
    #[serde(default)]
    pub runner: Option<RunnerSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ServerEntry {
    pub server: HostSpec,
}

/// Read and decode a YAML config file.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("couldn't parse yml-file {}", path.display()))
}

/// Lowercase the names in host and licence-server entries so lookups by
/// hostname/address behave case-insensitively.
pub fn postprocess_fleet(mut api: Api) -> Api {
    for entry in &mut api.servers {
        entry.server.hostname = entry.server.hostname.to_lowercase();
    }
    for nms in &mut api.nms.nms {
        nms.address = nms.address.to_lowercase();
    }
    api
}

/// Normalize a runner request the way the service expects it: names
/// lowercased, missing case entries filled in under the case location.
pub fn postprocess_runner(mut spec: RunnerSpec) -> anyhow::Result<RunnerSpec> {
    let Some(case_settings) = spec.case_settings.as_mut() else {
        bail!("specify caseSettings and caseLocation");
    };
    if case_settings.case_location.is_empty() {
        bail!("must specify caseLocation for caseSettings");
    }

    spec.name = spec.name.to_lowercase();
    spec.hostname = spec.hostname.to_lowercase();
    spec.nms = spec.nms.to_lowercase();
    case_settings.normalize(&spec.name);
    Ok(spec)
}

#[cfg(test)]
#[path = "configs_tests.rs"]
mod tests;
