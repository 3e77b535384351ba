// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avian-remote: remote-execution transport for worker hosts.
//!
//! A [`Shell`] opens scoped [`Session`]s against one host; the PowerShell
//! implementation drives WinRM through a local `pwsh` child process per
//! session, so a runner blocking in [`Session::run`] for hours never stalls
//! another host's commands.

mod powershell;
mod session;

pub use powershell::{PowerShell, PsSession};
pub use session::{Session, SessionError, Shell};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSession, FakeShell, SessionCall};
