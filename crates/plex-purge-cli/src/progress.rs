use indicatif::{ProgressBar, ProgressStyle};
use plex_purge_core::orchestrator::{Stage, StageTally};
use plex_purge_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Catalog phase: spinner (library size unknown until the last page)
/// - Deletion stages: progress bar per stage
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_catalog_start(&self, library: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(format!("Evaluating '{}'...", library));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_catalog_progress(&self, examined: usize, blacklisted: usize, current_title: &str) {
        self.with_bar(|pb| {
            pb.set_message(format!(
                "Evaluating... {} examined, {} blacklisted ({})",
                examined, blacklisted, current_title
            ))
        });
    }

    fn on_catalog_complete(&self, examined: usize, blacklisted: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Evaluation complete: {} items, {} blacklisted in {:.2}s",
            examined, blacklisted, duration_secs
        );
    }

    fn on_stage_start(&self, stage: Stage, items: usize) {
        let pb = ProgressBar::new(items as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos}/{len}",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.set_message(format!("{}", stage));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_stage_progress(&self, _stage: Stage, done: usize, _items: usize) {
        self.with_bar(|pb| pb.set_position(done as u64));
    }

    fn on_stage_complete(&self, stage: Stage, tally: &StageTally) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {}: {} removed, {} not found, {} errors",
            stage, tally.removed, tally.not_found, tally.error
        );
    }
}
