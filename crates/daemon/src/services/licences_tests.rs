// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use avian_core::test_support;

fn service() -> LicenceService {
    LicenceService::new(Store::in_memory())
}

#[test]
fn apply_batch_saves_every_server() {
    let service = service();
    let servers = service
        .apply(avian_core::LicenceServerBatch {
            nms: vec![
                test_support::nms_spec("nms1", 4, "enterprise", 2),
                test_support::nms_spec("nms2", 8, "workstation", 1),
            ],
        })
        .unwrap();

    assert_eq!(servers.len(), 2);
    assert_eq!(service.list().unwrap().len(), 2);
}

#[test]
fn apply_rejects_missing_address_or_workers() {
    let service = service();
    let mut spec = test_support::nms_spec("", 4, "enterprise", 2);
    spec.address = String::new();
    let err = service
        .apply(avian_core::LicenceServerBatch { nms: vec![spec] })
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let spec = test_support::nms_spec("nms1", 0, "enterprise", 2);
    let err = service
        .apply(avian_core::LicenceServerBatch { nms: vec![spec] })
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn list_licences_resolves_by_server_id() {
    let service = service();
    let servers = service
        .apply(avian_core::LicenceServerBatch {
            nms: vec![test_support::nms_spec("nms1", 4, "enterprise", 2)],
        })
        .unwrap();

    let licences = service.list_licences(servers[0].meta.id).unwrap();
    assert_eq!(licences.len(), 1);
    assert_eq!(licences[0].kind, "enterprise");
    assert_eq!(licences[0].amount, 2);

    assert!(matches!(
        service.list_licences(9999).unwrap_err(),
        Error::NotFound(_)
    ));
}
