// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store: transactional operations over the record state.

use crate::snapshot::{snapshot_path, Snapshot};
use crate::state::State;
use avian_core::{
    Clock, Error, Host, HostSpec, Licence, LicenceServer, LicenceServerSpec, Result, RunStatus,
    Runner, Stage, SystemClock,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Handle to the record store. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<State>>,
    snapshot_file: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open the store under a state directory, loading the snapshot if one
    /// exists.
    pub fn open(state_dir: impl Into<PathBuf>) -> Result<Self> {
        let path = snapshot_path(&state_dir.into());
        let state = Snapshot::load(&path)
            .map_err(|e| Error::StoreTransient(e.to_string()))?
            .map(|s| s.state)
            .unwrap_or_default();
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            snapshot_file: Some(path),
            clock: Arc::new(SystemClock),
        })
    }

    /// Store without persistence, for tests and dry runs.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            snapshot_file: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for record stamps and heartbeats.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist the committed state. Snapshot failures are logged, not
    /// propagated: the in-memory commit already happened and the next
    /// commit retries the write.
    fn commit(&self, state: &State) {
        let Some(path) = &self.snapshot_file else {
            return;
        };
        let snapshot = Snapshot::new(state.clone(), self.clock.epoch_ms());
        if let Err(e) = snapshot.save(path) {
            warn!(error = %e, path = %path.display(), "failed to write store snapshot");
        }
    }

    // --- hosts ---

    /// Upsert a host by hostname. An existing row keeps its id and its
    /// `active` flag; the scheduler owns that flag.
    pub fn apply_host(&self, spec: HostSpec) -> Result<Host> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();

        let host = match state.host_id_by_hostname(&spec.hostname) {
            Some(id) => {
                #[allow(clippy::unwrap_used)]
                let host = state.hosts.get_mut(&id).unwrap();
                host.port = spec.port;
                host.operating_system = spec.operating_system;
                host.username = spec.username;
                host.password = spec.password;
                host.install_path = spec.install_path;
                host.scripts_path = spec.scripts_path;
                host.meta.modified_at_ms = now;
                host.clone()
            }
            None => {
                let id = state.allocate_id();
                let mut host = Host {
                    hostname: spec.hostname,
                    port: spec.port,
                    operating_system: spec.operating_system,
                    username: spec.username,
                    password: spec.password,
                    install_path: spec.install_path,
                    scripts_path: spec.scripts_path,
                    active: false,
                    ..Host::default()
                };
                host.meta.id = id;
                host.meta.created_at_ms = now;
                host.meta.modified_at_ms = now;
                state.hosts.insert(id, host.clone());
                host
            }
        };

        self.commit(&state);
        Ok(host)
    }

    pub fn get_host(&self, hostname: &str) -> Result<Host> {
        self.state
            .lock()
            .host_by_hostname(hostname)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("host {hostname}")))
    }

    pub fn list_hosts(&self) -> Vec<Host> {
        self.state.lock().hosts.values().cloned().collect()
    }

    // --- licence servers ---

    /// Upsert a licence server by address. The licence set is replaced by
    /// the request; pools whose type persists keep their id and usage
    /// counter so accounting survives a re-apply.
    pub fn apply_licence_server(&self, spec: LicenceServerSpec) -> Result<LicenceServer> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let mut server = spec.into_server();

        match state.server_id_by_address(&server.address) {
            Some(id) => {
                #[allow(clippy::unwrap_used)]
                let existing = state.licence_servers.get(&id).cloned().unwrap();
                server.meta = existing.meta.clone();
                server.meta.modified_at_ms = now;
                server.in_use = existing.in_use;
                for licence in &mut server.licences {
                    match existing.licence(&licence.kind) {
                        Some(old) => {
                            licence.meta = old.meta.clone();
                            licence.meta.modified_at_ms = now;
                            licence.in_use = old.in_use;
                        }
                        None => stamp_licence(&mut state, licence, now),
                    }
                }
                state.licence_servers.insert(id, server.clone());
            }
            None => {
                let id = state.allocate_id();
                server.meta.id = id;
                server.meta.created_at_ms = now;
                server.meta.modified_at_ms = now;
                for licence in &mut server.licences {
                    stamp_licence(&mut state, licence, now);
                }
                state.licence_servers.insert(id, server.clone());
            }
        }

        self.commit(&state);
        Ok(server)
    }

    pub fn get_licence_server(&self, address: &str) -> Result<LicenceServer> {
        self.state
            .lock()
            .server_by_address(address)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("nms {address}")))
    }

    pub fn list_licence_servers(&self) -> Vec<LicenceServer> {
        self.state.lock().licence_servers.values().cloned().collect()
    }

    // --- runners ---

    /// Apply a runner: create, or merge onto an inactive existing runner
    /// when `update` is set. Finished stages whose index and variant match
    /// the request keep their row (id and status), so completed work is
    /// not re-run.
    pub fn apply_runner(&self, mut runner: Runner, update: bool) -> Result<Runner> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();

        if state.host_by_hostname(&runner.hostname).is_none() {
            return Err(Error::not_found(format!(
                "server {} doesn't exist in the backend",
                runner.hostname
            )));
        }
        if state.server_by_address(&runner.nms).is_none() {
            return Err(Error::not_found(format!(
                "nms {} doesn't exist in the backend",
                runner.nms
            )));
        }

        match state.runner_id_by_name(&runner.name) {
            None => {
                let id = state.allocate_id();
                runner.meta.id = id;
                runner.meta.created_at_ms = now;
                runner.meta.modified_at_ms = now;
                stamp_case_settings(&mut state, &mut runner, now);
                for stage in &mut runner.stages {
                    stamp_stage(&mut state, stage, now);
                }
                state.runners.insert(id, runner.clone());
            }
            Some(id) => {
                if !update {
                    return Err(Error::conflict(format!(
                        "runner: {} already exists, create a new runner by a unique name",
                        runner.name
                    )));
                }
                #[allow(clippy::unwrap_used)]
                let existing = state.runners.get(&id).unwrap().clone();
                if existing.active {
                    return Err(Error::conflict("cannot update active runner"));
                }

                runner.meta = existing.meta.clone();
                runner.meta.modified_at_ms = now;
                preserve_case_ids(&mut runner, &existing);
                stamp_case_settings(&mut state, &mut runner, now);

                for (index, stage) in runner.stages.iter_mut().enumerate() {
                    if let Some(old) = existing.stages.get(index) {
                        if old.is_finished() && old.name() == stage.name() {
                            *stage = old.clone();
                            stage.index = index as u32;
                            continue;
                        }
                    }
                    stamp_stage(&mut state, stage, now);
                }

                state.runners.insert(id, runner.clone());
            }
        }

        self.commit(&state);
        Ok(runner)
    }

    pub fn get_runner(&self, name: &str) -> Result<Runner> {
        let state = self.state.lock();
        state
            .runner_id_by_name(name)
            .and_then(|id| state.runners.get(&id))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("runner {name}")))
    }

    pub fn get_runner_by_id(&self, id: u64) -> Result<Runner> {
        self.state
            .lock()
            .runners
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("runner {id}")))
    }

    pub fn list_runners(&self) -> Vec<Runner> {
        self.state.lock().runners.values().cloned().collect()
    }

    /// Delete a runner by name. Deleting an active runner requires
    /// `force` and releases its host and licence reservation.
    pub fn delete_runner(&self, name: &str, force: bool) -> Result<Runner> {
        let mut state = self.state.lock();
        let id = state
            .runner_id_by_name(name)
            .ok_or_else(|| Error::not_found(format!("runner {name}")))?;
        #[allow(clippy::unwrap_used)]
        let runner = state.runners.get(&id).unwrap().clone();

        if runner.active {
            if !force {
                return Err(Error::conflict(
                    "cannot delete active runner - use force argument",
                ));
            }
            release_reservation(&mut state, &runner);
        }

        state.runners.remove(&id);
        self.commit(&state);
        Ok(runner)
    }

    /// All admittable runners, oldest first.
    pub fn find_waiting_runners(&self) -> Vec<Runner> {
        let state = self.state.lock();
        let mut waiting: Vec<Runner> = state
            .runners
            .values()
            .filter(|r| !r.active && r.status == RunStatus::Waiting)
            .cloned()
            .collect();
        waiting.sort_by_key(|r| (r.meta.created_at_ms, r.meta.id));
        waiting
    }

    /// Active runners whose heartbeat is older than `threshold_ms`.
    pub fn find_expired_runners(&self, threshold_ms: u64) -> Vec<Runner> {
        self.state
            .lock()
            .runners
            .values()
            .filter(|r| r.active && r.healthy_at_ms.unwrap_or(0) < threshold_ms)
            .cloned()
            .collect()
    }

    // --- capacity accounting ---

    /// Admit a runner: verify the host is idle and the licence pool has
    /// room, then flip all reservation state in one transaction. Rolls
    /// back with no visible effect on any failure.
    pub fn reserve_capacity(&self, runner_id: u64) -> Result<(Host, LicenceServer)> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();

        let runner = state
            .runners
            .get(&runner_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("runner {runner_id}")))?;

        let host = state
            .host_by_hostname(&runner.hostname)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("host {}", runner.hostname)))?;
        if host.active {
            return Err(Error::HostBusy(host.hostname.clone()));
        }

        let server = state
            .server_by_address(&runner.nms)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("nms {}", runner.nms)))?;
        if server.free_workers() < runner.workers {
            return Err(Error::LicenceExhausted(format!(
                "not enough workers available - requested: {} - available: {}/{}",
                runner.workers, server.in_use, server.workers
            )));
        }
        let licence = server
            .licence(&runner.licence)
            .ok_or_else(|| Error::not_found(format!("licencetype {}", runner.licence)))?;
        if licence.in_use >= licence.amount {
            return Err(Error::LicenceExhausted(format!(
                "not enough licences available for {} - {}/{} in use",
                runner.licence, licence.in_use, licence.amount
            )));
        }

        // All checks passed; apply the reservation.
        #[allow(clippy::unwrap_used)]
        {
            let host = state.host_by_hostname_mut(&runner.hostname).unwrap();
            host.active = true;
            host.meta.modified_at_ms = now;

            let server = state.server_by_address_mut(&runner.nms).unwrap();
            server.in_use += runner.workers;
            server.meta.modified_at_ms = now;
            let licence = server.licence_mut(&runner.licence).unwrap();
            licence.in_use += 1;

            let runner = state.runners.get_mut(&runner_id).unwrap();
            runner.active = true;
            runner.status = RunStatus::Running;
            runner.healthy_at_ms = Some(now);
            runner.meta.modified_at_ms = now;
        }

        #[allow(clippy::unwrap_used)]
        let host = state.host_by_hostname(&runner.hostname).cloned().unwrap();
        #[allow(clippy::unwrap_used)]
        let server = state.server_by_address(&runner.nms).cloned().unwrap();
        self.commit(&state);
        Ok((host, server))
    }

    /// Terminal transition: set the status, drop the active flag and give
    /// back host and licence capacity. Release is keyed on the runner's
    /// `active` flag, so a Finish arriving after a Timeout sweep (or any
    /// repeated terminal RPC) cannot double-decrement the counters.
    pub fn release_capacity(&self, runner_id: u64, terminal: RunStatus) -> Result<Runner> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();

        let runner = state
            .runners
            .get(&runner_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("runner {runner_id}")))?;

        if runner.active {
            release_reservation(&mut state, &runner);
        }

        #[allow(clippy::unwrap_used)]
        let runner = {
            let runner = state.runners.get_mut(&runner_id).unwrap();
            runner.active = false;
            runner.status = terminal;
            runner.meta.modified_at_ms = now;
            runner.clone()
        };

        self.commit(&state);
        Ok(runner)
    }

    // --- script-facing updates ---

    /// Mark the runner started by its script. A repeat call refreshes the
    /// heartbeat and case id but is otherwise a no-op.
    pub fn start_runner(&self, runner_id: u64, case_id: Option<String>) -> Result<Runner> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let runner = state
            .runners
            .get_mut(&runner_id)
            .ok_or_else(|| Error::not_found(format!("runner {runner_id}")))?;

        runner.status = RunStatus::Running;
        runner.healthy_at_ms = Some(now.max(runner.healthy_at_ms.unwrap_or(0)));
        if case_id.is_some() {
            runner.case_id = case_id;
        }
        runner.meta.modified_at_ms = now;
        let runner = runner.clone();
        self.commit(&state);
        Ok(runner)
    }

    pub fn set_runner_heartbeat(&self, runner_id: u64) -> Result<()> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let runner = state
            .runners
            .get_mut(&runner_id)
            .ok_or_else(|| Error::not_found(format!("runner {runner_id}")))?;
        // healthy_at never moves backwards
        runner.healthy_at_ms = Some(now.max(runner.healthy_at_ms.unwrap_or(0)));
        self.commit(&state);
        Ok(())
    }

    /// Set the status of whichever variant the stage row carries.
    pub fn update_stage_status(&self, stage_id: u64, status: RunStatus) -> Result<Stage> {
        let mut state = self.state.lock();
        let now = self.clock.epoch_ms();
        let (_, stage) = state
            .stage_mut(stage_id)
            .ok_or_else(|| Error::not_found(format!("stage {stage_id}")))?;
        stage.set_status(status);
        stage.meta.modified_at_ms = now;
        let stage = stage.clone();
        self.commit(&state);
        Ok(stage)
    }
}

/// Give back the host and licence capacity attributed to an active runner.
/// Counterpart of the mutation block in [`Store::reserve_capacity`].
fn release_reservation(state: &mut State, runner: &Runner) {
    if let Some(host) = state.host_by_hostname_mut(&runner.hostname) {
        host.active = false;
    }
    if let Some(server) = state.server_by_address_mut(&runner.nms) {
        server.in_use = server.in_use.saturating_sub(runner.workers);
        if let Some(licence) = server.licence_mut(&runner.licence) {
            licence.in_use = licence.in_use.saturating_sub(1);
        }
    }
}

fn stamp_licence(state: &mut State, licence: &mut Licence, now: u64) {
    licence.meta.id = state.allocate_id();
    licence.meta.created_at_ms = now;
    licence.meta.modified_at_ms = now;
}

fn stamp_stage(state: &mut State, stage: &mut Stage, now: u64) {
    stage.meta.id = state.allocate_id();
    stage.meta.created_at_ms = now;
    stage.meta.modified_at_ms = now;
    if let avian_core::StageKind::Process(process) = &mut stage.kind {
        for evidence in &mut process.evidence_store {
            evidence.meta.id = state.allocate_id();
            evidence.meta.created_at_ms = now;
            evidence.meta.modified_at_ms = now;
        }
    }
}

/// Keep the stored ids of the case settings row and its owned cases so an
/// update does not orphan them.
fn preserve_case_ids(runner: &mut Runner, existing: &Runner) {
    runner.case_settings.meta = existing.case_settings.meta.clone();
    let pairs = [
        (&mut runner.case_settings.single, &existing.case_settings.single),
        (
            &mut runner.case_settings.compound_case,
            &existing.case_settings.compound_case,
        ),
        (
            &mut runner.case_settings.review_compound,
            &existing.case_settings.review_compound,
        ),
    ];
    for (new_case, old_case) in pairs {
        if let (Some(new_case), Some(old_case)) = (new_case.as_mut(), old_case.as_ref()) {
            new_case.meta = old_case.meta.clone();
            if let (Some(new_es), Some(old_es)) = (
                new_case.elastic_search.as_mut(),
                old_case.elastic_search.as_ref(),
            ) {
                new_es.meta = old_es.meta.clone();
            }
        }
    }
}

/// Stamp ids onto any case rows that do not have one yet.
fn stamp_case_settings(state: &mut State, runner: &mut Runner, now: u64) {
    let settings = &mut runner.case_settings;
    if !settings.meta.is_persisted() {
        settings.meta.id = state.allocate_id();
        settings.meta.created_at_ms = now;
    }
    settings.meta.modified_at_ms = now;
    for case in [
        settings.single.as_mut(),
        settings.compound_case.as_mut(),
        settings.review_compound.as_mut(),
    ]
    .into_iter()
    .flatten()
    {
        if !case.meta.is_persisted() {
            case.meta.id = state.allocate_id();
            case.meta.created_at_ms = now;
        }
        case.meta.modified_at_ms = now;
        if let Some(es) = case.elastic_search.as_mut() {
            if !es.meta.is_persisted() {
                es.meta.id = state.allocate_id();
                es.meta.created_at_ms = now;
            }
            es.meta.modified_at_ms = now;
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
