use crate::orchestrator::{Stage, StageTally};

/// Trait for reporting run progress.
///
/// CLI implements with indicatif, tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_catalog_start(&self, _library: &str) {}
    fn on_catalog_progress(&self, _examined: usize, _blacklisted: usize, _current_title: &str) {}
    fn on_catalog_complete(&self, _examined: usize, _blacklisted: usize, _duration_secs: f64) {}
    fn on_stage_start(&self, _stage: Stage, _items: usize) {}
    fn on_stage_progress(&self, _stage: Stage, _done: usize, _items: usize) {}
    fn on_stage_complete(&self, _stage: Stage, _tally: &StageTally) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
