// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Settings schema for in-app script stages.

use serde::{Deserialize, Serialize};

/// Decoded contents of an InApp stage's settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InAppSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archived_prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archived_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archived_has_duplicate_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub archived_missing_duplicate_tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub has_missing_attachments_tag: String,
    #[serde(default)]
    pub exclude_archived_items_with_duplicates: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub main_directory: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub metadata_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_path: String,
}
