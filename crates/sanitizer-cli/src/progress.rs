use indicatif::{ProgressBar, ProgressStyle};
use sanitizer_core::ProgressReporter;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Walk phase: spinner (entry count unknown upfront)
/// - Synthesis and link phases: progress bars (totals known from the walk)
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

    /// Clear whatever bar is active so it stops drawing over later output.
    pub fn abandon(&self) {
        self.finish_bar();
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.bar.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn start_bar(&self, label: &str, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(&format!(
            "  {{spinner:.cyan}} {label} [{{bar:30.cyan/dim}}] {{pos}}/{{len}}"
        )) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }
}

impl ProgressReporter for CliReporter {
    fn on_walk_start(&self) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message("Walking source tree...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_walk_progress(&self, entries_seen: usize, _current_path: &Path) {
        self.with_bar(|pb| pb.set_message(format!("Walking... {} entries", entries_seen)));
    }

    fn on_walk_complete(&self, images: usize, copied: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Walk complete: {} images, {} files copied in {:.2}s",
            images, copied, duration_secs
        );
    }

    fn on_synthesis_start(&self, groups: usize) {
        self.start_bar("Placeholders", groups);
    }

    fn on_synthesis_progress(&self, written: usize, _groups: usize) {
        self.with_bar(|pb| pb.set_position(written as u64));
    }

    fn on_synthesis_complete(&self, written: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Synthesis complete: {} placeholders in {:.2}s",
            written, duration_secs
        );
    }

    fn on_link_start(&self, total_links: usize) {
        self.start_bar("Linking", total_links);
    }

    fn on_link_progress(&self, linked: usize, _total_links: usize) {
        self.with_bar(|pb| pb.set_position(linked as u64));
    }

    fn on_link_complete(&self, linked: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Linking complete: {} images in {:.2}s",
            linked, duration_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandon_clears_an_active_spinner() {
        let reporter = CliReporter::new();
        reporter.on_walk_start();
        assert!(!reporter.is_idle());

        reporter.abandon();
        assert!(reporter.is_idle());
    }

    #[test]
    fn test_abandon_clears_an_active_bar() {
        let reporter = CliReporter::new();
        reporter.on_link_start(10);
        reporter.on_link_progress(3, 10);

        reporter.abandon();
        assert!(reporter.is_idle());
        // Idempotent once nothing is drawing.
        reporter.abandon();
        assert!(reporter.is_idle());
    }
}
