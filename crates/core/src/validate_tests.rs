// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::stage::{
    Evidence, Exclude, Ocr, Populate, Process, SearchAndTag, Stage, StageKind,
};
use crate::test_support;
use crate::Error;
use yare::parameterized;

#[parameterized(
    lower_g = { "4g", true },
    upper_g = { "16G", true },
    megabytes = { "512m", true },
    kilobytes = { "1024k", true },
    unit_suffix = { "4GB", false },
    missing_unit = { "4", false },
    missing_number = { "g", false },
    empty = { "", false },
)]
fn xmx_rule(xmx: &str, ok: bool) {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.xmx = xmx.to_string();
    let runner = spec.into_runner().unwrap();
    assert_eq!(runner.validate().is_ok(), ok, "xmx: {xmx}");
}

#[parameterized(
    danish = { "da-DK", true },
    english = { "en-US", true },
    plain = { "english", false },
    trailing_dash = { "en-", false },
)]
fn locale_rule(locale: &str, ok: bool) {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(
        0,
        StageKind::Process(Process {
            profile: "default".to_string(),
            evidence_store: vec![Evidence {
                name: "ev1".to_string(),
                directory: "E:/ev1".to_string(),
                locale: locale.to_string(),
                ..Evidence::default()
            }],
            ..Process::default()
        }),
    )];
    let runner = spec.into_runner().unwrap();
    assert_eq!(runner.validate().is_ok(), ok, "locale: {locale}");
}

#[test]
fn missing_fields_rejected() {
    for field in ["name", "hostname", "nms", "licence", "xmx"] {
        let mut spec = test_support::runner_spec("r1", "h1", "nms1");
        match field {
            "name" => spec.name.clear(),
            "hostname" => spec.hostname.clear(),
            "nms" => spec.nms.clear(),
            "licence" => spec.licence.clear(),
            _ => spec.xmx.clear(),
        }
        let runner = spec.into_runner().unwrap();
        assert!(
            matches!(runner.validate(), Err(Error::Validation(_))),
            "expected validation error for empty {field}"
        );
    }

    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.workers = 0;
    assert!(spec.into_runner().unwrap().validate().is_err());
}

#[test]
fn missing_case_settings_rejected() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.case_settings = None;
    assert!(matches!(spec.into_runner(), Err(Error::Validation(_))));
}

#[test]
fn at_most_one_process_stage() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![test_support::process_stage(), test_support::process_stage()];
    let runner = spec.into_runner().unwrap();
    assert!(runner.validate().is_err());
}

#[test]
fn search_and_tag_needs_tag_or_files() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(
        0,
        StageKind::SearchAndTag(SearchAndTag {
            search: "kind:email".to_string(),
            ..SearchAndTag::default()
        }),
    )];
    assert!(spec.into_runner().unwrap().validate().is_err());

    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(0, StageKind::SearchAndTag(SearchAndTag::default()))];
    assert!(spec.into_runner().unwrap().validate().is_err());
}

#[test]
fn populate_needs_types() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(
        0,
        StageKind::Populate(Populate {
            search: "kind:email".to_string(),
            types: Vec::new(),
            ..Populate::default()
        }),
    )];
    assert!(spec.into_runner().unwrap().validate().is_err());
}

#[test]
fn ocr_needs_positive_batch_size() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(
        0,
        StageKind::Ocr(Ocr {
            profile: "ocr-default".to_string(),
            search: "kind:image".to_string(),
            batch_size: 0,
            ..Ocr::default()
        }),
    )];
    assert!(spec.into_runner().unwrap().validate().is_err());
}

#[test]
fn exclude_needs_search_and_reason() {
    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.stages = vec![Stage::new(
        0,
        StageKind::Exclude(Exclude {
            search: "tag:junk".to_string(),
            reason: String::new(),
            ..Exclude::default()
        }),
    )];
    assert!(spec.into_runner().unwrap().validate().is_err());
}

#[test]
fn long_case_dir_requires_short_spool_dir() {
    let ocr = Stage::new(
        0,
        StageKind::Ocr(Ocr {
            profile: "ocr-default".to_string(),
            search: "kind:image".to_string(),
            batch_size: 50,
            ..Ocr::default()
        }),
    );

    let mut spec = test_support::runner_spec("r1", "h1", "nms1");
    spec.case_settings.as_mut().unwrap().case_location =
        "D:/a/very/long/case/location/path/for/processing/work".to_string();
    spec.stages = vec![ocr.clone()];
    assert!(spec.clone().into_runner().unwrap().validate().is_err());

    // A short spoolDir switch satisfies the rule
    spec.switches = vec!["-Dnuix.export.spoolDir=D:/spool".to_string()];
    assert!(spec.clone().into_runner().unwrap().validate().is_ok());

    // A long spoolDir does not
    spec.switches =
        vec!["-Dnuix.export.spoolDir=D:/another/very/long/spool/path/that/wont/fit".to_string()];
    assert!(spec.into_runner().unwrap().validate().is_err());
}
