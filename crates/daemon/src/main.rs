// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! aviand: the Avian orchestrator daemon.
//!
//! Normally started through `avian service`; running the binary
//! directly is equivalent.

#[tokio::main]
async fn main() {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("aviand {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--help" | "-h" | "help" => {
                println!("aviand {}", env!("CARGO_PKG_VERSION"));
                println!("Avian orchestrator daemon - schedules forensic runners on worker hosts");
                println!();
                println!("USAGE:");
                println!("    aviand");
                println!();
                println!("Configuration comes from AVIAN_ADDRESS, AVIAN_PORT, AVIAN_STATE_PATH,");
                println!("AVIAN_LOG_PATH and AVIAN_DATA_PATH.");
                return;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: aviand [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = avian_daemon::run().await {
        eprintln!("could not start avian service: {e}");
        std::process::exit(1);
    }
}
