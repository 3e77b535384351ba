// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders for other crates' tests.
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::unwrap_used)]

use crate::case::CaseSettings;
use crate::request::{
    HostSpec, LicenceEntry, LicenceServerSpec, LicenceSpec, RunnerSpec,
};
use crate::runner::Runner;
use crate::stage::{
    Evidence, Process, SearchAndTag, Stage, StageKind,
};

/// A minimal valid runner spec targeting `hostname`/`nms`.
pub fn runner_spec(name: &str, hostname: &str, nms: &str) -> RunnerSpec {
    RunnerSpec {
        name: name.to_string(),
        hostname: hostname.to_string(),
        nms: nms.to_string(),
        licence: "enterprise".to_string(),
        xmx: "4g".to_string(),
        workers: 2,
        case_settings: Some(CaseSettings {
            case_location: "D:/cases".to_string(),
            ..CaseSettings::default()
        }),
        stages: vec![process_stage(), search_and_tag_stage("foo", "bar")],
        switches: Vec::new(),
        update: false,
    }
}

/// A built, validated runner ready for store insertion.
pub fn runner(name: &str, hostname: &str, nms: &str) -> Runner {
    let runner = runner_spec(name, hostname, nms).into_runner().unwrap();
    runner.validate().unwrap();
    runner
}

pub fn process_stage() -> Stage {
    Stage::new(
        0,
        StageKind::Process(Process {
            profile: "default".to_string(),
            evidence_store: vec![Evidence {
                name: "ev1".to_string(),
                directory: "E:/evidence/ev1".to_string(),
                ..Evidence::default()
            }],
            ..Process::default()
        }),
    )
}

pub fn search_and_tag_stage(search: &str, tag: &str) -> Stage {
    Stage::new(
        0,
        StageKind::SearchAndTag(SearchAndTag {
            search: search.to_string(),
            tag: tag.to_string(),
            ..SearchAndTag::default()
        }),
    )
}

pub fn host_spec(hostname: &str) -> HostSpec {
    HostSpec {
        hostname: hostname.to_string(),
        port: 5985,
        operating_system: "windows".to_string(),
        username: "svc-avian".to_string(),
        password: "secret".to_string(),
        install_path: "C:/nuix".to_string(),
        scripts_path: String::new(),
    }
}

pub fn nms_spec(address: &str, workers: u32, licence: &str, amount: u32) -> LicenceServerSpec {
    LicenceServerSpec {
        address: address.to_string(),
        port: 27443,
        username: "nms-admin".to_string(),
        password: "secret".to_string(),
        workers,
        licences: vec![LicenceEntry {
            licence: LicenceSpec {
                kind: licence.to_string(),
                amount,
            },
        }],
        is_relay: false,
    }
}
