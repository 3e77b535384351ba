// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner validation rules applied before a runner is persisted.

use crate::error::{Error, Result};
use crate::runner::Runner;
use crate::stage::{Stage, StageKind};
use regex::Regex;
use std::sync::LazyLock;

/// OCR and populate spill worker temp data under the case directory; the
/// console tool fails on paths longer than this.
const WORKER_TEMP_DIR_LENGTH: usize = 45;

const SPOOL_DIR_SWITCH: &str = "-Dnuix.export.spoolDir=";

static XMX_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new("^[0-9]+[kKmMgG]$").unwrap()
});

static LOCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new("^(?:[a-zA-Z0-9]{1,8}-)[a-zA-Z0-9]{1,8}$").unwrap()
});

impl Runner {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation("must specify unique name for runner"));
        }
        if self.hostname.is_empty() {
            return Err(Error::validation(
                "must specify 'hostname' for server to run the runner",
            ));
        }
        if self.nms.is_empty() {
            return Err(Error::validation("must specify 'nms' for licencesource"));
        }
        if self.licence.is_empty() {
            return Err(Error::validation(
                "must specify 'licence' for the correct licence-type",
            ));
        }
        if self.xmx.is_empty() {
            return Err(Error::validation(
                "must specify 'xmx' for memory allocation in jvm",
            ));
        }
        if !XMX_RE.is_match(&self.xmx) {
            return Err(Error::validation(format!(
                "invalid xmx: {} - must match {}",
                self.xmx,
                XMX_RE.as_str()
            )));
        }
        if self.workers == 0 {
            return Err(Error::validation("must specify amount of workers"));
        }
        if self.case_settings.case_location.is_empty() {
            return Err(Error::validation(
                "must specify caseLocation for caseSettings",
            ));
        }

        let process_stages = self
            .stages
            .iter()
            .filter(|s| matches!(s.kind, StageKind::Process(_)))
            .count();
        if process_stages > 1 {
            return Err(Error::validation(
                "a runner may contain at most one process-stage",
            ));
        }

        for (i, stage) in self.stages.iter().enumerate() {
            validate_stage(stage)
                .map_err(|e| Error::validation(format!("stage {}: {}", i + 1, e)))?;

            // OCR and populate need a short worker temp dir; when the case
            // directory is too long a spoolDir switch must provide one.
            if matches!(stage.kind, StageKind::Ocr(_) | StageKind::Populate(_)) {
                self.validate_spool_dir()?;
            }
        }
        Ok(())
    }

    fn validate_spool_dir(&self) -> Result<()> {
        let case_dir_len = self
            .case_settings
            .single
            .as_ref()
            .map(|c| c.directory.len())
            .unwrap_or(0);
        if case_dir_len <= WORKER_TEMP_DIR_LENGTH {
            return Ok(());
        }

        let spool_dir_ok = self.switches.iter().any(|s| {
            s.strip_prefix(SPOOL_DIR_SWITCH)
                .is_some_and(|dir| dir.len() < WORKER_TEMP_DIR_LENGTH)
        });
        if !spool_dir_ok {
            return Err(Error::validation(format!(
                "provide a path with less than {} characters in the switch: '{}' to perform ocr/populate",
                WORKER_TEMP_DIR_LENGTH, SPOOL_DIR_SWITCH,
            )));
        }
        Ok(())
    }
}

fn validate_stage(stage: &Stage) -> std::result::Result<(), String> {
    match &stage.kind {
        StageKind::Process(p) => {
            if p.profile.is_empty() {
                return Err("must specify processing-profile for process-stage".to_string());
            }
            if p.evidence_store.is_empty() {
                return Err("must specify evidence for the process-stage".to_string());
            }
            for (i, evidence) in p.evidence_store.iter().enumerate() {
                if evidence.name.is_empty() {
                    return Err(format!("must specify name for evidence: #{i}"));
                }
                if evidence.directory.is_empty() {
                    return Err(format!("must specify directory for evidence: #{i}"));
                }
                if !evidence.locale.is_empty() && !LOCALE_RE.is_match(&evidence.locale) {
                    return Err(format!(
                        "invalid locale for evidence: #{i} - {}",
                        evidence.locale
                    ));
                }
            }
            Ok(())
        }
        StageKind::SearchAndTag(s) => {
            if s.search.is_empty() {
                if s.files.is_empty() {
                    return Err(
                        "must specify a search-query or files for search and tag-stage".to_string(),
                    );
                }
                for (i, file) in s.files.iter().enumerate() {
                    if file.path.is_empty() {
                        return Err(format!("must specify path to file for search and tag #{i}"));
                    }
                }
            } else if s.tag.is_empty() {
                return Err("must specify a tag for search and tag".to_string());
            }
            Ok(())
        }
        StageKind::Populate(p) => {
            if p.search.is_empty() {
                return Err("must specify a search-query for populate-stage".to_string());
            }
            if p.types.is_empty() {
                return Err("must specify types for populate-stage".to_string());
            }
            for (i, t) in p.types.iter().enumerate() {
                if t.kind.is_empty() {
                    return Err(format!("must specify type for populate-stage type #{i}"));
                }
            }
            Ok(())
        }
        StageKind::Ocr(o) => {
            if o.profile.is_empty() {
                return Err("must specify a processing-profile for OCR-stage".to_string());
            }
            if o.search.is_empty() {
                return Err("must specify a search-query for OCR-stage".to_string());
            }
            if o.batch_size == 0 {
                return Err("must specify a batch-size for OCR-stage".to_string());
            }
            Ok(())
        }
        StageKind::Exclude(e) => {
            if e.search.is_empty() {
                return Err("must specify a search-query for exclude-stage".to_string());
            }
            if e.reason.is_empty() {
                return Err("must specify a reason for exclude-stage".to_string());
            }
            Ok(())
        }
        StageKind::InApp(i) => {
            if i.name.is_empty() {
                return Err("must specify a name for in-app script".to_string());
            }
            if i.config.is_empty() {
                return Err("must specify a config for in-app script".to_string());
            }
            Ok(())
        }
        StageKind::Reload(r) => {
            if r.search.is_empty() {
                return Err("must specify a search-query for reload-stage".to_string());
            }
            Ok(())
        }
        StageKind::SyncDescendants(s) => {
            if s.search.is_empty() {
                return Err("must specify a search-query for sync-descendants-stage".to_string());
            }
            Ok(())
        }
        StageKind::ScanNewChildItems(s) => {
            if s.search.is_empty() {
                return Err(
                    "must specify a search-query for scan-new-child-items-stage".to_string()
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
