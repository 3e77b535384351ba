// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LicenceService: registers licence servers and their pools.

use avian_core::{Error, Licence, LicenceServer, LicenceServerBatch, Result};
use avian_store::Store;
use tracing::info;

pub struct LicenceService {
    store: Store,
}

impl LicenceService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Apply a batch of licence servers.
    pub fn apply(&self, batch: LicenceServerBatch) -> Result<Vec<LicenceServer>> {
        let mut servers = Vec::with_capacity(batch.nms.len());
        for spec in batch.nms {
            if spec.address.is_empty() {
                return Err(Error::validation("must specify address for nms"));
            }
            if spec.workers == 0 {
                return Err(Error::validation(format!(
                    "must specify workers for nms {}",
                    spec.address
                )));
            }
            let server = self.store.apply_licence_server(spec)?;
            info!(nms = %server.address, workers = server.workers, "saved nms");
            servers.push(server);
        }
        Ok(servers)
    }

    pub fn list(&self) -> Result<Vec<LicenceServer>> {
        Ok(self.store.list_licence_servers())
    }

    pub fn list_licences(&self, nms_id: u64) -> Result<Vec<Licence>> {
        self.store
            .list_licence_servers()
            .into_iter()
            .find(|s| s.meta.id == nms_id)
            .map(|s| s.licences)
            .ok_or_else(|| Error::not_found(format!("nms {nms_id}")))
    }
}

#[cfg(test)]
#[path = "licences_tests.rs"]
mod tests;
