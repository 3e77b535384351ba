// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Case settings owned by a runner.
//!
//! A runner processes into three cases under one parent location: the
//! single case the script works in, a compound case the single case is
//! added to on teardown, and a review compound for the review team.

use crate::record::Meta;
use serde::{Deserialize, Serialize};

/// Parent location plus the three cases a runner touches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSettings {
    #[serde(flatten)]
    pub meta: Meta,
    /// Parent folder for all cases of this runner
    pub case_location: String,
    #[serde(rename = "case", default, skip_serializing_if = "Option::is_none")]
    pub single: Option<Case>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_case: Option<Case>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_compound: Option<Case>,
}

/// One case: name, directory and descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub investigator: String,
    /// Search-index configuration for the single case, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_search: Option<Elasticsearch>,
}

/// Search-index settings applied when the single case is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elasticsearch {
    #[serde(flatten)]
    pub meta: Meta,
    pub cluster_name: String,
    pub nuix_transport_host: String,
    #[serde(default)]
    pub index_number_of_replicas: u32,
    #[serde(default)]
    pub index_number_of_shards: u32,
}

impl CaseSettings {
    /// Fill missing case entries with `<runner>-single|-compound|-review`
    /// defaults under the case location. Description and investigator are
    /// carried over from a partially specified entry.
    pub fn normalize(&mut self, runner_name: &str) {
        let single = self.single.get_or_insert_with(Case::default);
        if single.name.is_empty() {
            single.name = format!("{runner_name}-single");
        }
        if single.directory.is_empty() {
            single.directory = format!("{}/{}-single", self.case_location, runner_name);
        }

        fill_case(
            &mut self.compound_case,
            &self.case_location,
            runner_name,
            "compound",
        );
        fill_case(
            &mut self.review_compound,
            &self.case_location,
            runner_name,
            "review",
        );
    }

    /// Directories of all configured cases, single first.
    pub fn case_dirs(&self) -> Vec<&str> {
        [&self.single, &self.compound_case, &self.review_compound]
            .into_iter()
            .flatten()
            .map(|c| c.directory.as_str())
            .collect()
    }
}

fn fill_case(slot: &mut Option<Case>, location: &str, runner_name: &str, suffix: &str) {
    let needs_fill = slot.as_ref().is_none_or(|c| c.directory.is_empty());
    if !needs_fill {
        return;
    }
    let (description, investigator) = slot
        .as_ref()
        .map(|c| (c.description.clone(), c.investigator.clone()))
        .unwrap_or_default();
    let meta = slot.as_ref().map(|c| c.meta.clone()).unwrap_or_default();
    *slot = Some(Case {
        meta,
        name: format!("{runner_name}-{suffix}"),
        directory: format!("{location}/{runner_name}-{suffix}"),
        description,
        investigator,
        elastic_search: None,
    });
}

#[cfg(test)]
#[path = "case_tests.rs"]
mod tests;
