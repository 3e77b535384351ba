// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized record state held under the store mutex.

use avian_core::{Host, LicenceServer, Runner, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All persisted records, keyed by surrogate id.
///
/// Lookups by name/address scan the maps; the fleet sizes this store
/// manages (tens of hosts, hundreds of runners) make an index pointless.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct State {
    next_id: u64,
    pub runners: BTreeMap<u64, Runner>,
    pub hosts: BTreeMap<u64, Host>,
    pub licence_servers: BTreeMap<u64, LicenceServer>,
}

impl State {
    /// Allocate the next surrogate id. Ids are shared across record types.
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn runner_id_by_name(&self, name: &str) -> Option<u64> {
        self.runners
            .iter()
            .find(|(_, r)| r.name == name)
            .map(|(id, _)| *id)
    }

    pub fn host_id_by_hostname(&self, hostname: &str) -> Option<u64> {
        self.hosts
            .iter()
            .find(|(_, h)| h.hostname == hostname)
            .map(|(id, _)| *id)
    }

    pub fn host_by_hostname(&self, hostname: &str) -> Option<&Host> {
        self.hosts.values().find(|h| h.hostname == hostname)
    }

    pub fn host_by_hostname_mut(&mut self, hostname: &str) -> Option<&mut Host> {
        self.hosts.values_mut().find(|h| h.hostname == hostname)
    }

    pub fn server_id_by_address(&self, address: &str) -> Option<u64> {
        self.licence_servers
            .iter()
            .find(|(_, s)| s.address == address)
            .map(|(id, _)| *id)
    }

    pub fn server_by_address(&self, address: &str) -> Option<&LicenceServer> {
        self.licence_servers.values().find(|s| s.address == address)
    }

    pub fn server_by_address_mut(&mut self, address: &str) -> Option<&mut LicenceServer> {
        self.licence_servers
            .values_mut()
            .find(|s| s.address == address)
    }

    /// Find a stage by id across all runners.
    pub fn stage_mut(&mut self, stage_id: u64) -> Option<(String, &mut Stage)> {
        self.runners.values_mut().find_map(|runner| {
            let name = runner.name.clone();
            runner
                .stages
                .iter_mut()
                .find(|s| s.meta.id == stage_id)
                .map(|stage| (name, stage))
        })
    }
}
