// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Apply-request shapes accepted by the admin RPCs and the YAML loader.

use crate::case::CaseSettings;
use crate::error::{Error, Result};
use crate::licence::{Licence, LicenceServer};
use crate::record::Meta;
use crate::runner::Runner;
use crate::stage::Stage;
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// Runner apply request: the declarative shape of one runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerSpec {
    pub name: String,
    pub hostname: String,
    pub nms: String,
    pub licence: String,
    pub xmx: String,
    #[serde(default)]
    pub workers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_settings: Option<CaseSettings>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub switches: Vec<String>,
    /// Whether an existing runner of the same name may be replaced
    #[serde(default)]
    pub update: bool,
}

impl RunnerSpec {
    /// Build the Runner entity: normalizes case settings, re-indexes the
    /// stages densely from 0 and resets the admission state to Waiting.
    pub fn into_runner(self) -> Result<Runner> {
        let mut case_settings = self
            .case_settings
            .ok_or_else(|| Error::validation("must specify 'caseSettings' in runner-config"))?;
        case_settings.normalize(&self.name);

        let mut stages = self.stages;
        for (index, stage) in stages.iter_mut().enumerate() {
            stage.index = index as u32;
        }

        Ok(Runner {
            meta: Meta::default(),
            name: self.name,
            hostname: self.hostname,
            nms: self.nms,
            licence: self.licence,
            xmx: self.xmx,
            workers: self.workers,
            active: false,
            status: RunStatus::Waiting,
            healthy_at_ms: None,
            case_id: None,
            case_settings,
            stages,
            switches: self.switches,
        })
    }
}

/// Host apply request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
    pub hostname: String,
    #[serde(default)]
    pub port: u16,
    pub operating_system: String,
    pub username: String,
    pub password: String,
    pub install_path: String,
    #[serde(default)]
    pub scripts_path: String,
}

/// Licence pool entry inside a licence-server apply request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenceSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: u32,
}

/// YAML holder shape: `licences: [{licence: {...}}]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenceEntry {
    pub licence: LicenceSpec,
}

/// Licence server apply request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenceServerSpec {
    pub address: String,
    #[serde(default)]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub workers: u32,
    #[serde(default)]
    pub licences: Vec<LicenceEntry>,
    #[serde(default)]
    pub is_relay: bool,
}

/// Batch of licence-server apply requests (`nmsApply` in YAML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenceServerBatch {
    #[serde(default)]
    pub nms: Vec<LicenceServerSpec>,
}

impl LicenceServerSpec {
    /// Build the LicenceServer entity with zeroed usage counters.
    pub fn into_server(self) -> LicenceServer {
        LicenceServer {
            meta: Meta::default(),
            address: self.address,
            port: self.port,
            username: self.username,
            password: self.password,
            workers: self.workers,
            in_use: 0,
            licences: self
                .licences
                .into_iter()
                .map(|entry| Licence {
                    meta: Meta::default(),
                    kind: entry.licence.kind,
                    amount: entry.licence.amount,
                    in_use: 0,
                })
                .collect(),
            is_relay: self.is_relay,
        }
    }
}
