// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HostService: registers worker hosts.

use avian_core::{Error, Host, HostSpec, Result};
use avian_remote::{Session, Shell};
use avian_store::Store;
use tracing::{debug, info};

pub struct HostService<S: Shell> {
    store: Store,
    shell: S,
}

impl<S: Shell> HostService<S> {
    pub fn new(store: Store, shell: S) -> Self {
        Self { store, shell }
    }

    /// Apply a host. A new host gets the delegation handshake; any host
    /// gets its declared paths verified over a delegated session before
    /// the record is saved. Paths unchanged from the stored row are not
    /// re-checked.
    pub async fn apply(&self, spec: HostSpec) -> Result<Host> {
        if spec.operating_system != "windows" && spec.operating_system != "linux" {
            return Err(Error::validation(format!(
                "specify operating_system for {} - 'linux' or 'windows'",
                spec.hostname
            )));
        }

        let existing = self.store.get_host(&spec.hostname).ok();
        if existing.is_none() {
            debug!(server = %spec.hostname, "new server, enabling credential delegation");
            let session = self
                .shell
                .open(&spec.hostname, &spec.username, &spec.password)
                .await
                .map_err(avian_engine::failure::remote_err)?;
            let enabled = session.enable_delegation().await;
            let _ = session.close().await;
            enabled.map_err(avian_engine::failure::remote_err)?;
        }

        let session = self
            .shell
            .open_delegated(&spec.hostname, &spec.username, &spec.password)
            .await
            .map_err(avian_engine::failure::remote_err)?;
        let checked = check_host_paths(&session, &spec, existing.as_ref()).await;
        let _ = session.close().await;
        checked?;

        info!(server = %spec.hostname, "saving server");
        self.store.apply_host(spec)
    }

    pub fn list(&self) -> Result<Vec<Host>> {
        Ok(self.store.list_hosts())
    }
}

async fn check_host_paths<S: Session>(
    session: &S,
    spec: &HostSpec,
    existing: Option<&Host>,
) -> Result<()> {
    let install_unchanged = existing.is_some_and(|h| h.install_path == spec.install_path);
    if !install_unchanged {
        session
            .check_path(&spec.install_path)
            .await
            .map_err(|e| Error::Validation(format!("failed to test install-path: {e}")))?;
    }

    let scripts_unchanged = existing.is_some_and(|h| h.scripts_path == spec.scripts_path);
    if !spec.scripts_path.is_empty() && !scripts_unchanged {
        session
            .check_path(&spec.scripts_path)
            .await
            .map_err(|e| Error::Validation(format!("failed to test scripts-path: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "hosts_tests.rs"]
mod tests;
