// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake shell for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::session::{Session, SessionError, Shell};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Recorded session call, tagged with the host it targeted
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Open {
        host: String,
        delegated: bool,
    },
    CheckPath(String),
    RemoveItem(String),
    CreateFile {
        dir: String,
        name: String,
        bytes: usize,
    },
    CopyTree {
        src: String,
        dst: String,
    },
    SetEnv {
        key: String,
        value: String,
    },
    SetWorkingDir(String),
    Run {
        program: String,
        args: Vec<String>,
    },
    EnableDelegation,
    Close,
}

#[derive(Default)]
struct FakeState {
    /// Paths that exist on the fake hosts. When `strict_paths` is off all
    /// paths exist except those explicitly removed.
    existing_paths: HashSet<String>,
    removed_paths: HashSet<String>,
    strict_paths: bool,
    open_error: Option<String>,
    run_error: Option<String>,
    calls: Vec<(String, SessionCall)>,
}

/// Fake shell recording every call, for engine and daemon tests.
#[derive(Clone, Default)]
pub struct FakeShell {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only paths added with [`FakeShell::add_path`] exist.
    pub fn strict_paths(self) -> Self {
        self.inner.lock().strict_paths = true;
        self
    }

    pub fn add_path(&self, path: &str) {
        self.inner.lock().existing_paths.insert(path.to_string());
    }

    /// Make every `open`/`open_delegated` fail.
    pub fn set_open_error(&self, message: &str) {
        self.inner.lock().open_error = Some(message.to_string());
    }

    /// Make [`Session::run`] fail with this message.
    pub fn set_run_error(&self, message: &str) {
        self.inner.lock().run_error = Some(message.to_string());
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<(String, SessionCall)> {
        self.inner.lock().calls.clone()
    }

    /// Calls recorded against one host.
    pub fn calls_for(&self, host: &str) -> Vec<SessionCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Files created on a host as `dir\name` paths.
    pub fn created_files(&self, host: &str) -> Vec<String> {
        self.calls_for(host)
            .into_iter()
            .filter_map(|c| match c {
                SessionCall::CreateFile { dir, name, .. } => Some(format!("{dir}\\{name}")),
                _ => None,
            })
            .collect()
    }

    /// Paths removed on a host.
    pub fn removed_items(&self, host: &str) -> Vec<String> {
        self.calls_for(host)
            .into_iter()
            .filter_map(|c| match c {
                SessionCall::RemoveItem(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// The argument vectors run on a host.
    pub fn runs(&self, host: &str) -> Vec<(String, Vec<String>)> {
        self.calls_for(host)
            .into_iter()
            .filter_map(|c| match c {
                SessionCall::Run { program, args } => Some((program, args)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, host: &str, call: SessionCall) {
        self.inner.lock().calls.push((host.to_string(), call));
    }

    fn path_exists(&self, path: &str) -> bool {
        let state = self.inner.lock();
        if state.removed_paths.contains(path) {
            return false;
        }
        if state.strict_paths {
            state.existing_paths.contains(path)
        } else {
            true
        }
    }
}

#[async_trait]
impl Shell for FakeShell {
    type Session = FakeSession;

    async fn open(
        &self,
        host: &str,
        _username: &str,
        _password: &str,
    ) -> Result<FakeSession, SessionError> {
        self.open_fake(host, false)
    }

    async fn open_delegated(
        &self,
        host: &str,
        _username: &str,
        _password: &str,
    ) -> Result<FakeSession, SessionError> {
        self.open_fake(host, true)
    }
}

impl FakeShell {
    fn open_fake(&self, host: &str, delegated: bool) -> Result<FakeSession, SessionError> {
        if let Some(err) = self.inner.lock().open_error.clone() {
            return Err(SessionError::OpenFailed(host.to_string(), err));
        }
        self.record(
            host,
            SessionCall::Open {
                host: host.to_string(),
                delegated,
            },
        );
        Ok(FakeSession {
            host: host.to_string(),
            shell: self.clone(),
        })
    }
}

/// Session handle produced by [`FakeShell`].
pub struct FakeSession {
    host: String,
    shell: FakeShell,
}

#[async_trait]
impl Session for FakeSession {
    fn hostname(&self) -> &str {
        &self.host
    }

    async fn check_path(&self, path: &str) -> Result<(), SessionError> {
        self.shell
            .record(&self.host, SessionCall::CheckPath(path.to_string()));
        if !self.shell.path_exists(path) {
            return Err(SessionError::CommandFailed(format!("no such path: {path}")));
        }
        Ok(())
    }

    async fn remove_item(&self, path: &str) -> Result<(), SessionError> {
        self.shell
            .record(&self.host, SessionCall::RemoveItem(path.to_string()));
        if !self.shell.path_exists(path) {
            return Err(SessionError::CommandFailed(format!("no such path: {path}")));
        }
        let mut state = self.shell.inner.lock();
        state.existing_paths.remove(path);
        state.removed_paths.insert(path.to_string());
        Ok(())
    }

    async fn create_file(&self, dir: &str, name: &str, data: &[u8]) -> Result<(), SessionError> {
        self.shell.record(
            &self.host,
            SessionCall::CreateFile {
                dir: dir.to_string(),
                name: name.to_string(),
                bytes: data.len(),
            },
        );
        self.shell.add_path(&format!("{dir}\\{name}"));
        Ok(())
    }

    async fn copy_tree(&self, src: &str, dst: &str) -> Result<(), SessionError> {
        self.shell.record(
            &self.host,
            SessionCall::CopyTree {
                src: src.to_string(),
                dst: dst.to_string(),
            },
        );
        self.shell.add_path(dst);
        Ok(())
    }

    async fn set_env(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.shell.record(
            &self.host,
            SessionCall::SetEnv {
                key: key.to_string(),
                value: value.to_string(),
            },
        );
        Ok(())
    }

    async fn set_working_dir(&self, path: &str) -> Result<(), SessionError> {
        self.shell
            .record(&self.host, SessionCall::SetWorkingDir(path.to_string()));
        if !self.shell.path_exists(path) {
            return Err(SessionError::CommandFailed(format!("no such path: {path}")));
        }
        Ok(())
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<(), SessionError> {
        self.shell.record(
            &self.host,
            SessionCall::Run {
                program: program.to_string(),
                args: args.to_vec(),
            },
        );
        if let Some(err) = self.shell.inner.lock().run_error.clone() {
            return Err(SessionError::CommandFailed(err));
        }
        Ok(())
    }

    async fn enable_delegation(&self) -> Result<(), SessionError> {
        self.shell.record(&self.host, SessionCall::EnableDelegation);
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.shell.record(&self.host, SessionCall::Close);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
