// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup privilege check.
//!
//! Opening delegated sessions requires administrator rights, so the
//! daemon refuses to start without them instead of failing on the first
//! launch.

use avian_core::Error;

#[cfg(windows)]
pub fn ensure_admin() -> Result<(), Error> {
    // `net session` fails with access-denied unless elevated.
    let elevated = std::process::Command::new("net")
        .arg("session")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if elevated {
        Ok(())
    } else {
        Err(Error::Unauthorized(
            "service must run as administrator".to_string(),
        ))
    }
}

#[cfg(unix)]
pub fn ensure_admin() -> Result<(), Error> {
    let euid = std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(|s| s.trim().parse::<u32>().ok());
    match euid {
        Some(0) => Ok(()),
        _ => Err(Error::Unauthorized(
            "service must run as root".to_string(),
        )),
    }
}
