// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced across the orchestrator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classification shared by the store, the engine, and the RPC
/// surface. Admin RPCs serialize the message into the response `error`
/// field; the loops log and continue.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("host unreachable: {0}")]
    HostUnreachable(String),
    #[error("host busy: {0}")]
    HostBusy(String),
    #[error("licence exhausted: {0}")]
    LicenceExhausted(String),
    #[error("remote operation failed: {0}")]
    RemoteOp(String),
    #[error("store transient error: {0}")]
    StoreTransient(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    /// Admission misses that the scheduler retries next tick.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::HostBusy(_) | Error::LicenceExhausted(_))
    }
}
