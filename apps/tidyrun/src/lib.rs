//! tidyrun core library.
//!
//! This crate exposes programmatic APIs for running clang-tidy incrementally
//! over a C/C++ source tree and reporting the warnings it finds.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `catalog`: Source discovery, ordering, and build folder lookup.
//! - `rules`: Rule list compiler producing `.clang-tidy`.
//! - `cache`: Persistent analyzer output cache.
//! - `invoke`: Analyzer subprocess and the cache-aware engine.
//! - `classify`: Warning extraction from analyzer output.
//! - `tidy`: Per-project/per-file orchestration.
//! - `format`: In-place formatting with an external formatter.
//! - `models`: Entries, counters, reports, timing.
//! - `output`: Human/JSON printers.
//! - `utils`: Supporting helpers.
pub mod cache;
pub mod cancel;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod invoke;
pub mod models;
pub mod output;
pub mod rules;
pub mod tidy;
pub mod utils;

pub use error::{Result, TidyError};
