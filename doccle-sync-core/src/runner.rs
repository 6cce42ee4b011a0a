//! `SyncRunner`: the one `run_once()` shared by every trigger.
//!
//! The scheduler, the manual HTTP trigger and the one-shot CLI all call
//! [`SyncRunner::run_once`]. Runs never overlap: a trigger that fires while a
//! run is in progress is skipped rather than queued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::SynchroniseConfig;
use crate::contract::{DocumentSource, Ingestor};
use crate::error::SyncError;
use crate::synchronise::{synchronise, SynchroniseReport};

/// Summary of the last completed run, as exposed on the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub finished_at: DateTime<Utc>,
    pub documents: usize,
    pub forwarded: usize,
    pub failed: usize,
    pub archive_failures: usize,
}

impl RunRecord {
    fn from_report(report: &SynchroniseReport) -> Self {
        Self {
            finished_at: Utc::now(),
            documents: report.documents.len(),
            forwarded: report.forwarded(),
            failed: report.failed(),
            archive_failures: report.archive_failures(),
        }
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Completed(SynchroniseReport),
    /// Another run held the lock.
    Skipped,
}

pub struct SyncRunner {
    config: SynchroniseConfig,
    source: Arc<dyn DocumentSource>,
    ingestor: Arc<dyn Ingestor>,
    in_progress: tokio::sync::Mutex<()>,
    /// Mirrors `in_progress` for observers; reading it never takes the lock.
    running: AtomicBool,
    last_run: Mutex<Option<RunRecord>>,
}

/// Clears the running flag when a run ends, however it ends.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncRunner {
    pub fn new(
        config: SynchroniseConfig,
        source: Arc<dyn DocumentSource>,
        ingestor: Arc<dyn Ingestor>,
    ) -> Self {
        config.trace_loaded();
        Self {
            config,
            source,
            ingestor,
            in_progress: tokio::sync::Mutex::new(()),
            running: AtomicBool::new(false),
            last_run: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SynchroniseConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn last_run(&self) -> Option<RunRecord> {
        self.last_run
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub async fn run_once(&self) -> Result<RunStatus, SyncError> {
        let Ok(_guard) = self.in_progress.try_lock() else {
            warn!("[SYNC] Previous run still in progress, skipping this trigger");
            return Ok(RunStatus::Skipped);
        };
        let _running = RunningFlag::raise(&self.running);

        let report = synchronise(&self.config, self.source.as_ref(), self.ingestor.as_ref()).await?;
        let record = RunRecord::from_report(&report);
        info!(
            documents = record.documents,
            forwarded = record.forwarded,
            failed = record.failed,
            "[SYNC] Run recorded"
        );
        *self
            .last_run
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record);
        Ok(RunStatus::Completed(report))
    }
}
