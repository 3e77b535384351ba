// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment configuration for the daemon.

use std::path::PathBuf;

/// Daemon configuration, resolved from `AVIAN_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address for HTTP to listen on (`AVIAN_ADDRESS`)
    pub address: String,
    /// Port for HTTP to listen on (`AVIAN_PORT`)
    pub port: u16,
    /// Directory holding the store snapshot (`AVIAN_STATE_PATH`)
    pub state_dir: PathBuf,
    /// Directory for the daemon and per-runner logs (`AVIAN_LOG_PATH`)
    pub log_dir: PathBuf,
    /// Directory for uploaded files (`AVIAN_DATA_PATH`)
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            address: var_or("AVIAN_ADDRESS", "0.0.0.0"),
            port: std::env::var("AVIAN_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            state_dir: PathBuf::from(var_or("AVIAN_STATE_PATH", "./state")),
            log_dir: PathBuf::from(var_or("AVIAN_LOG_PATH", "./log")),
            data_dir: PathBuf::from(var_or("AVIAN_DATA_PATH", ".")),
        }
    }

    /// The URL generated scripts post back to.
    pub fn service_url(&self) -> String {
        format!("http://{}:{}/api/", self.address, self.port)
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
