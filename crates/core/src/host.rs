// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker host record.

use crate::record::Meta;
use serde::{Deserialize, Serialize};

/// A remote machine capable of opening a delegated shell session and
/// running the console tool. `active` means a runner is executing on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(flatten)]
    pub meta: Meta,
    /// Unique hostname
    pub hostname: String,
    #[serde(default)]
    pub port: u16,
    /// "windows" or "linux"
    pub operating_system: String,
    pub username: String,
    pub password: String,
    /// Directory the console tool is installed in; generated scripts land here
    pub install_path: String,
    /// Local scripts tree copied to the host for InApp stages (empty = none)
    #[serde(default)]
    pub scripts_path: String,
    #[serde(default)]
    pub active: bool,
}

impl Host {
    /// Base directory name of the scripts tree as it appears on the host,
    /// under the install path.
    pub fn remote_scripts_dir(&self) -> Option<String> {
        if self.scripts_path.is_empty() {
            return None;
        }
        let base = self
            .scripts_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.scripts_path.as_str());
        Some(format!("{}\\{}", self.install_path, base))
    }
}
