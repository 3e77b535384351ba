// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base record metadata shared by every stored entity.

use serde::{Deserialize, Serialize};

/// Surrogate id plus create/modify/delete timestamps.
///
/// An id of 0 means the record has not been persisted yet; the store
/// assigns ids on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub modified_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at_ms: Option<u64>,
}

impl Meta {
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}
