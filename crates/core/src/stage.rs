// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage sum type.
//!
//! A stage is one unit of work in a runner's pipeline and carries exactly
//! one variant. The external serde tagging reproduces the wire shape where
//! a stage object holds a single variant key (`process`, `searchAndTag`, …).
//! Each variant owns an independent status so a re-applied runner can skip
//! work that already finished.

use crate::inapp::InAppSettings;
use crate::record::Meta;
use crate::status::RunStatus;
use serde::{Deserialize, Serialize};

/// One pipeline step of a runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(flatten)]
    pub meta: Meta,
    /// Position in the pipeline, dense from 0
    #[serde(default)]
    pub index: u32,
    #[serde(flatten)]
    pub kind: StageKind,
}

/// The stage variants; exactly one per stage row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageKind {
    Process(Process),
    SearchAndTag(SearchAndTag),
    Exclude(Exclude),
    Ocr(Ocr),
    Reload(Reload),
    Populate(Populate),
    InApp(InApp),
    SyncDescendants(SyncDescendants),
    ScanNewChildItems(ScanNewChildItems),
}

/// Processes evidence into the single case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub status: RunStatus,
    pub profile: String,
    #[serde(default)]
    pub profile_path: String,
    #[serde(default)]
    pub evidence_store: Vec<Evidence>,
}

/// One evidence source consumed by a Process stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub directory: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub custodian: String,
    #[serde(default)]
    pub locale: String,
}

/// Tags items matched by a search, or by lists of terms from files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAndTag {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// Path to a term file on the worker host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub path: String,
}

/// Excludes matched items with a reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclude {
    #[serde(default)]
    pub status: RunStatus,
    pub search: String,
    pub reason: String,
}

/// OCR pass over matched items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ocr {
    #[serde(default)]
    pub status: RunStatus,
    pub profile: String,
    #[serde(default)]
    pub profile_path: String,
    pub search: String,
    #[serde(default)]
    pub batch_size: u32,
}

/// Re-processes matched items with a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reload {
    #[serde(default)]
    pub status: RunStatus,
    pub profile: String,
    #[serde(default)]
    pub profile_path: String,
    pub search: String,
}

/// Populates binary stores for matched item types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Populate {
    #[serde(default)]
    pub status: RunStatus,
    pub search: String,
    #[serde(default)]
    pub types: Vec<ItemType>,
}

/// One item type selected by a Populate stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Runs an in-app script with settings from an external config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InApp {
    #[serde(default)]
    pub status: RunStatus,
    pub name: String,
    /// Path of the settings file on the orchestrator
    pub config: String,
    /// Decoded settings, filled by the scheduler before launch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<InAppSettings>,
}

/// Synchronizes descendant metadata for matched items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDescendants {
    #[serde(default)]
    pub status: RunStatus,
    pub search: String,
}

/// Scans matched items for new child items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanNewChildItems {
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub profile: String,
    pub search: String,
}

impl Stage {
    pub fn new(index: u32, kind: StageKind) -> Self {
        Self {
            meta: Meta::default(),
            index,
            kind,
        }
    }

    /// Display name; InApp stages are qualified by their script name.
    pub fn name(&self) -> String {
        match &self.kind {
            StageKind::Process(_) => "Process".to_string(),
            StageKind::SearchAndTag(_) => "SearchAndTag".to_string(),
            StageKind::Exclude(_) => "Exclude".to_string(),
            StageKind::Ocr(_) => "OCR".to_string(),
            StageKind::Reload(_) => "Reload".to_string(),
            StageKind::Populate(_) => "Populate".to_string(),
            StageKind::InApp(s) => format!("InApp-{}", s.name),
            StageKind::SyncDescendants(_) => "SyncDescendants".to_string(),
            StageKind::ScanNewChildItems(_) => "ScanNewChildItems".to_string(),
        }
    }

    pub fn status(&self) -> RunStatus {
        match &self.kind {
            StageKind::Process(s) => s.status,
            StageKind::SearchAndTag(s) => s.status,
            StageKind::Exclude(s) => s.status,
            StageKind::Ocr(s) => s.status,
            StageKind::Reload(s) => s.status,
            StageKind::Populate(s) => s.status,
            StageKind::InApp(s) => s.status,
            StageKind::SyncDescendants(s) => s.status,
            StageKind::ScanNewChildItems(s) => s.status,
        }
    }

    pub fn set_status(&mut self, status: RunStatus) {
        match &mut self.kind {
            StageKind::Process(s) => s.status = status,
            StageKind::SearchAndTag(s) => s.status = status,
            StageKind::Exclude(s) => s.status = status,
            StageKind::Ocr(s) => s.status = status,
            StageKind::Reload(s) => s.status = status,
            StageKind::Populate(s) => s.status = status,
            StageKind::InApp(s) => s.status = status,
            StageKind::SyncDescendants(s) => s.status = status,
            StageKind::ScanNewChildItems(s) => s.status = status,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status() == RunStatus::Finished
    }

    /// Host-side paths this stage depends on, for apply-time validation.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        match &self.kind {
            StageKind::Process(s) => {
                if !s.profile_path.is_empty() {
                    paths.push(s.profile_path.as_str());
                }
                for evidence in &s.evidence_store {
                    paths.push(evidence.directory.as_str());
                }
            }
            StageKind::SearchAndTag(s) => {
                for file in &s.files {
                    paths.push(file.path.as_str());
                }
            }
            StageKind::Ocr(s) => {
                if !s.profile_path.is_empty() {
                    paths.push(s.profile_path.as_str());
                }
            }
            StageKind::Reload(s) => {
                if !s.profile_path.is_empty() {
                    paths.push(s.profile_path.as_str());
                }
            }
            StageKind::InApp(s) => paths.push(s.config.as_str()),
            StageKind::Exclude(_)
            | StageKind::Populate(_)
            | StageKind::SyncDescendants(_)
            | StageKind::ScanNewChildItems(_) => {}
        }
        paths
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
