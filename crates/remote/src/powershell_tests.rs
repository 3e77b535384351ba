// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn quote_wraps_and_escapes() {
    assert_eq!(quote("plain"), "'plain'");
    assert_eq!(quote("it's"), "'it''s'");
    assert_eq!(quote(""), "''");
    assert_eq!(quote("C:\\nuix"), "'C:\\nuix'");
}

#[test]
fn first_words_truncates_long_commands() {
    assert_eq!(
        first_words("Copy-Item 'a' -Destination 'b' -Force"),
        "Copy-Item 'a' -Destination"
    );
    assert_eq!(first_words("Test-Path"), "Test-Path");
}
