// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs for the HTTP RPC surface.
//!
//! Every response carries an `error` string; a non-empty string signals
//! failure even when the HTTP status is 200. [`Reply`] folds a service
//! `Result` into that convention.

use avian_core::{Host, Licence, LicenceServer, Runner, Stage};
use serde::{Deserialize, Serialize};

/// Response envelope: the body on success, the error string on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reply<T> {
    #[serde(flatten)]
    pub body: Option<T>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl<T> Reply<T> {
    pub fn from_result(result: avian_core::Result<T>) -> Self {
        match result {
            Ok(body) => Self {
                body: Some(body),
                error: String::new(),
            },
            Err(e) => Self {
                body: None,
                error: e.to_string(),
            },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        if !self.error.is_empty() {
            return Err(self.error);
        }
        self.body.ok_or_else(|| "empty response".to_string())
    }

    /// Success check for operations whose body carries no data.
    pub fn check(self) -> Result<(), String> {
        if self.error.is_empty() {
            Ok(())
        } else {
            Err(self.error)
        }
    }
}

// --- runner service ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerGetRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerDeleteRequest {
    pub name: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerStartRequest {
    pub id: u64,
    #[serde(default)]
    pub runner: String,
    #[serde(default, rename = "caseID")]
    pub case_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFinishRequest {
    pub id: u64,
    #[serde(default)]
    pub runner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFailedRequest {
    pub id: u64,
    #[serde(default)]
    pub runner: String,
    #[serde(default)]
    pub exception: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRequest {
    #[serde(default)]
    pub runner: String,
    #[serde(rename = "stageID")]
    pub stage_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    pub runner: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default, rename = "stageID")]
    pub stage_id: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub exception: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogItemRequest {
    pub runner: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default, rename = "stageID")]
    pub stage_id: u64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub process_stage: String,
    #[serde(default)]
    pub is_corrupted: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_encrypted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunnerBody {
    pub runner: Runner,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunnerListBody {
    pub runners: Vec<Runner>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageBody {
    pub stage: Stage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScriptBody {
    pub script: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadFileBody {
    pub path: String,
}

/// Empty success body for fire-and-forget operations.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ack {}

// --- host service ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HostBody {
    pub server: Host,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostListBody {
    pub servers: Vec<Host>,
}

// --- licence service ---

#[derive(Debug, Serialize, Deserialize)]
pub struct NmsBody {
    pub nms: Vec<LicenceServer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenceListRequest {
    #[serde(rename = "nmsID")]
    pub nms_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LicenceListBody {
    pub licences: Vec<Licence>,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
