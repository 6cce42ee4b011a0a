#![doc = "doccle-sync-core: core logic library for doccle-sync."]

//! This crate holds the document synchronisation pipeline and everything it
//! talks to: the Doccle source client, the Paperless ingestion client, the
//! filename formatter and the retry sweep.
//!
//! Process concerns (CLI, configuration loading, scheduling, HTTP health
//! endpoint, log setup) live in the `doccle-sync` binary crate.
//!
//! # Usage
//! Build a [`runner::SyncRunner`] from a [`config::SynchroniseConfig`] and the two
//! client implementations, then call [`runner::SyncRunner::run_once`] from
//! whichever trigger owns the cycle.

pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod naming;
pub mod runner;
pub mod sweep;
pub mod synchronise;
pub mod uploader;
