// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-runner log files written through the RPC surface.
//!
//! Each runner gets an item log (`<runner>-item.log`) and a message log
//! (`<runner>-runner.log`) of JSON lines. Handles are opened lazily on
//! first use and kept in a process-wide map; the janitor closes handles
//! idle for longer than an hour to cap open file descriptors.

use avian_core::Clock;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How often the janitor sweeps, and how long a handle may sit unused.
pub const JANITOR_PERIOD: Duration = Duration::from_secs(60 * 60);

/// One processed item reported by the script.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemRecord {
    pub runner: String,
    pub stage: String,
    pub stage_id: u64,
    pub message: String,
    pub count: u64,
    pub mime_type: String,
    pub guid: String,
    pub process_stage: String,
    pub is_corrupted: bool,
    pub is_deleted: bool,
    pub is_encrypted: bool,
}

/// One log message reported by the script.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageRecord {
    pub runner: String,
    pub stage: String,
    pub stage_id: u64,
    pub message: String,
    pub exception: String,
}

struct LogHolder {
    file: File,
    last_used_ms: u64,
}

/// Process-wide map of open per-runner log files.
pub struct RunnerLogs {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    inner: Mutex<HashMap<String, LogHolder>>,
}

impl RunnerLogs {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Append a processed-item record to the runner's item log.
    pub fn item(&self, record: &ItemRecord) {
        let mut line = json!({
            "level": "debug",
            "runner": record.runner,
            "stage": record.stage,
            "stageID": record.stage_id,
            "count": record.count,
            "msg": record.message,
        });
        if !record.process_stage.is_empty() {
            line["processStage"] = json!(record.process_stage);
        }
        if !record.mime_type.is_empty() {
            line["mimeType"] = json!(record.mime_type);
        }
        if !record.guid.is_empty() {
            line["guid"] = json!(record.guid);
        }
        let mut flags = Vec::new();
        if record.is_corrupted {
            flags.push("CORRUPTED");
        }
        if record.is_deleted {
            flags.push("DELETED");
        }
        if record.is_encrypted {
            flags.push("ENCRYPTED");
        }
        if !flags.is_empty() {
            line["flags"] = json!(flags);
        }
        self.append(&format!("{}-item.log", record.runner), line);
    }

    /// Append a message record to the runner's message log.
    pub fn message(&self, level: &str, record: &MessageRecord) {
        let mut line = json!({
            "level": level,
            "runner": record.runner,
            "msg": record.message,
        });
        if !record.stage.is_empty() {
            line["stage"] = json!(record.stage);
            line["stageID"] = json!(record.stage_id);
        }
        if !record.exception.is_empty() {
            line["exception"] = json!(record.exception);
        }
        self.append(&format!("{}-runner.log", record.runner), line);
    }

    /// Write one JSON line. Logging must not break the engine: failures
    /// are warned about and dropped.
    fn append(&self, name: &str, mut line: serde_json::Value) {
        let now = self.clock.epoch_ms();
        line["ts"] = json!(now);

        let mut inner = self.inner.lock();
        if !inner.contains_key(name) {
            match self.open(name) {
                Ok(file) => {
                    inner.insert(
                        name.to_string(),
                        LogHolder {
                            file,
                            last_used_ms: now,
                        },
                    );
                }
                Err(e) => {
                    warn!(log = name, error = %e, "failed to open runner log");
                    return;
                }
            }
        }
        let Some(holder) = inner.get_mut(name) else {
            return;
        };
        holder.last_used_ms = now;
        if let Err(e) = writeln!(holder.file, "{line}") {
            warn!(log = name, error = %e, "failed to write runner log");
        }
    }

    fn open(&self, name: &str) -> std::io::Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(name))
    }

    /// Close handles not used since `cutoff_ms`.
    pub fn clean(&self, cutoff_ms: u64) {
        self.inner
            .lock()
            .retain(|_, holder| holder.last_used_ms >= cutoff_ms);
    }

    /// Number of currently open handles.
    pub fn open_handles(&self) -> usize {
        self.inner.lock().len()
    }

    /// Hourly sweep closing idle handles.
    pub async fn janitor(self: Arc<Self>) {
        let mut interval = tokio::time::interval(JANITOR_PERIOD);
        interval.tick().await;
        loop {
            interval.tick().await;
            let cutoff = self
                .clock
                .epoch_ms()
                .saturating_sub(JANITOR_PERIOD.as_millis() as u64);
            self.clean(cutoff);
        }
    }
}

#[cfg(test)]
#[path = "runlog_tests.rs"]
mod tests;
