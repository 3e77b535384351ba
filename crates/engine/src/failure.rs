// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-text handling.

use avian_core::Error;
use avian_remote::SessionError;

/// Reduce a nested console-tool stack trace to its root cause: the first
/// line after `Caused by:` when present, the full text otherwise.
pub fn caused_by(text: &str) -> String {
    let Some((_, rest)) = text.split_once("Caused by:") else {
        return text.to_string();
    };
    rest.lines()
        .next()
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Classify a transport error: failure to open a session means the host
/// is unreachable, anything after that is a failed remote operation.
pub fn remote_err(e: SessionError) -> Error {
    match e {
        SessionError::OpenFailed(host, reason) => {
            Error::HostUnreachable(format!("{host}: {reason}"))
        }
        other => Error::RemoteOp(other.to_string()),
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
