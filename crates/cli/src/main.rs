// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! avian: operator CLI for the Avian orchestrator.

mod client;
mod configs;
mod output;

use avian_daemon::protocol::{
    HostBody, HostListBody, NmsBody, RunnerBody, RunnerDeleteRequest, RunnerGetRequest,
    RunnerListBody, ScriptBody,
};
use clap::{Parser, Subcommand};
use client::Client;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "avian", version, about = "Queue forensic processing-jobs on worker hosts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator service in the foreground
    Service,
    /// Handle the worker hosts in your infrastructure
    Servers {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Handle the licence servers in your infrastructure
    Nms {
        #[command(subcommand)]
        command: NmsCommands,
    },
    /// Handle runners
    Runner {
        #[command(subcommand)]
        command: RunnerCommands,
    },
}

#[derive(Subcommand)]
enum ServerCommands {
    /// Apply server-configuration from a yml-file
    Apply { file: PathBuf },
    /// List servers from the backend
    List,
}

#[derive(Subcommand)]
enum NmsCommands {
    /// Apply nms-configuration from a yml-file
    Apply { file: PathBuf },
    /// List nms-servers from the backend
    List,
    /// List licences per nms-server
    Licences,
}

#[derive(Subcommand)]
enum RunnerCommands {
    /// Apply runner-configuration from a yml-file
    Apply { file: PathBuf },
    /// List runners from the backend
    List,
    /// Show one runner
    Get { name: String },
    /// Delete a runner
    Delete {
        name: String,
        /// Delete even if the runner is active
        #[arg(long)]
        force: bool,
    },
    /// Print the generated host-side script for a runner
    Script { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Service => {
            avian_daemon::run().await?;
        }
        Commands::Servers { command } => servers(command).await?,
        Commands::Nms { command } => nms(command).await?,
        Commands::Runner { command } => runner(command).await?,
    }
    Ok(())
}

async fn servers(command: ServerCommands) -> anyhow::Result<()> {
    let client = Client::from_env();
    match command {
        ServerCommands::Apply { file } => {
            let api = configs::postprocess_fleet(configs::load(&file)?.api);
            let mut applied = 0;
            for entry in api.servers {
                let _: HostBody = client.post("HostService.Apply", &entry.server).await?;
                applied += 1;
            }
            println!("applied {applied} servers to backend");
        }
        ServerCommands::List => {
            let body: HostListBody = client
                .post("HostService.List", &serde_json::json!({}))
                .await?;
            println!("{}", output::host_table(&body.servers));
        }
    }
    Ok(())
}

async fn nms(command: NmsCommands) -> anyhow::Result<()> {
    let client = Client::from_env();
    match command {
        NmsCommands::Apply { file } => {
            let api = configs::postprocess_fleet(configs::load(&file)?.api);
            let body: NmsBody = client.post("LicenceService.Apply", &api.nms).await?;
            println!("applied {} nuix management servers to backend", body.nms.len());
        }
        NmsCommands::List => {
            let body: NmsBody = client
                .post("LicenceService.List", &serde_json::json!({}))
                .await?;
            println!("{}", output::nms_table(&body.nms));
        }
        NmsCommands::Licences => {
            let body: NmsBody = client
                .post("LicenceService.List", &serde_json::json!({}))
                .await?;
            println!("{}", output::licence_table(&body.nms));
        }
    }
    Ok(())
}

async fn runner(command: RunnerCommands) -> anyhow::Result<()> {
    let client = Client::from_env();
    match command {
        RunnerCommands::Apply { file } => {
            let config = configs::load(&file)?;
            let spec = config
                .api
                .runner
                .ok_or_else(|| anyhow::anyhow!("no runner in config file"))?;
            let spec = configs::postprocess_runner(spec)?;
            let body: RunnerBody = client.post("RunnerService.Apply", &spec).await?;
            println!(
                "applied runner {} ({})",
                body.runner.name, body.runner.status
            );
        }
        RunnerCommands::List => {
            let body: RunnerListBody = client
                .post("RunnerService.List", &serde_json::json!({}))
                .await?;
            println!("{}", output::runner_table(&body.runners));
        }
        RunnerCommands::Get { name } => {
            let body: RunnerBody = client
                .post("RunnerService.Get", &RunnerGetRequest { name })
                .await?;
            println!("{}", output::runner_table(&[body.runner]));
        }
        RunnerCommands::Delete { name, force } => {
            client
                .post_ack(
                    "RunnerService.Delete",
                    &RunnerDeleteRequest { name: name.clone(), force },
                )
                .await?;
            println!("deleted runner {name}");
        }
        RunnerCommands::Script { name } => {
            let body: ScriptBody = client
                .post("RunnerService.Script", &RunnerGetRequest { name })
                .await?;
            println!("{}", body.script);
        }
    }
    Ok(())
}
