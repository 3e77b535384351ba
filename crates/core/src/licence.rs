// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Licence server and licence pool records.

use crate::record::Meta;
use serde::{Deserialize, Serialize};

/// A network licence server issuing floating licences of typed pools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenceServer {
    #[serde(flatten)]
    pub meta: Meta,
    /// Unique address
    pub address: String,
    #[serde(default)]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Total workers licensed to the server
    #[serde(default)]
    pub workers: u32,
    /// Workers currently reserved by active runners
    #[serde(default)]
    pub in_use: u32,
    #[serde(default)]
    pub licences: Vec<Licence>,
    /// Whether this server is a CLS relay
    #[serde(default)]
    pub is_relay: bool,
}

/// A (type, amount, in_use) licence pool owned by a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Licence {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub in_use: u32,
}

impl LicenceServer {
    pub fn licence(&self, kind: &str) -> Option<&Licence> {
        self.licences.iter().find(|l| l.kind == kind)
    }

    pub fn licence_mut(&mut self, kind: &str) -> Option<&mut Licence> {
        self.licences.iter_mut().find(|l| l.kind == kind)
    }

    /// Workers still available for admission.
    pub fn free_workers(&self) -> u32 {
        self.workers.saturating_sub(self.in_use)
    }
}
