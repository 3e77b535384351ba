// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table rendering for list commands.

use avian_core::{Host, LicenceServer, Runner};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Install-Path")]
    install_path: String,
    #[tabled(rename = "Active")]
    active: bool,
}

pub fn host_table(hosts: &[Host]) -> String {
    Table::new(hosts.iter().map(|h| HostRow {
        id: h.meta.id,
        hostname: h.hostname.clone(),
        os: h.operating_system.clone(),
        install_path: h.install_path.clone(),
        active: h.active,
    }))
    .to_string()
}

#[derive(Tabled)]
struct NmsRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Workers")]
    workers: u32,
    #[tabled(rename = "In-Use")]
    in_use: u32,
}

pub fn nms_table(servers: &[LicenceServer]) -> String {
    Table::new(servers.iter().map(|s| NmsRow {
        id: s.meta.id,
        address: s.address.clone(),
        port: s.port,
        workers: s.workers,
        in_use: s.in_use,
    }))
    .to_string()
}

#[derive(Tabled)]
struct LicenceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Licences")]
    amount: u32,
    #[tabled(rename = "In-Use")]
    in_use: u32,
}

pub fn licence_table(servers: &[LicenceServer]) -> String {
    Table::new(servers.iter().flat_map(|s| {
        s.licences.iter().map(|l| LicenceRow {
            id: l.meta.id,
            address: s.address.clone(),
            kind: l.kind.clone(),
            amount: l.amount,
            in_use: l.in_use,
        })
    }))
    .to_string()
}

#[derive(Tabled)]
struct RunnerRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "NMS")]
    nms: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Active")]
    active: bool,
}

pub fn runner_table(runners: &[Runner]) -> String {
    Table::new(runners.iter().map(|r| RunnerRow {
        id: r.meta.id,
        name: r.name.clone(),
        hostname: r.hostname.clone(),
        nms: r.nms.clone(),
        status: r.status.to_string(),
        active: r.active,
    }))
    .to_string()
}
