// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote session traits.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from remote session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open session to {0}: {1}")]
    OpenFailed(String, String),
    #[error("{0}")]
    CommandFailed(String),
    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),
    #[error("transport io: {0}")]
    Io(String),
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e.to_string())
    }
}

/// Opens sessions against worker hosts.
#[async_trait]
pub trait Shell: Clone + Send + Sync + 'static {
    type Session: Session;

    /// Open an authenticated session.
    async fn open(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Self::Session, SessionError>;

    /// Open a session with delegated credentials, so commands running on
    /// the host can authenticate onward (evidence shares, licence server).
    async fn open_delegated(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<Self::Session, SessionError>;
}

/// A scoped connection to one worker host.
///
/// All operations target the host the session was opened against. State
/// set through [`Session::set_env`] and [`Session::set_working_dir`]
/// persists for the lifetime of the session.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// The host this session was opened against. Needed because enabling
    /// delegation is a two-sided operation keyed by hostname.
    fn hostname(&self) -> &str;

    /// Succeeds iff the path exists on the host.
    async fn check_path(&self, path: &str) -> Result<(), SessionError>;

    /// Recursive delete. Fails on a missing path; callers treat absence
    /// as success by guarding with [`Session::check_path`].
    async fn remove_item(&self, path: &str) -> Result<(), SessionError>;

    /// Place a file on the host.
    async fn create_file(&self, dir: &str, name: &str, data: &[u8]) -> Result<(), SessionError>;

    /// Recursive copy from the orchestrator machine onto the host.
    async fn copy_tree(&self, src: &str, dst: &str) -> Result<(), SessionError>;

    async fn set_env(&self, key: &str, value: &str) -> Result<(), SessionError>;

    async fn set_working_dir(&self, path: &str) -> Result<(), SessionError>;

    /// Start a process on the host and block until it terminates. A
    /// non-zero exit surfaces as an error carrying the exit code.
    async fn run(&self, program: &str, args: &[String]) -> Result<(), SessionError>;

    /// Enable credential delegation: server role in the session, client
    /// role on the orchestrator naming this host as delegate.
    async fn enable_delegation(&self) -> Result<(), SessionError>;

    /// Tear down the session. Also performed on drop, but calling it
    /// surfaces errors instead of swallowing them.
    async fn close(&self) -> Result<(), SessionError>;
}
