use std::path::Path;

/// Trait for reporting sanitization progress.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self) {}
    fn on_walk_progress(&self, _entries_seen: usize, _current_path: &Path) {}
    fn on_walk_complete(&self, _images: usize, _copied: usize, _duration_secs: f64) {}
    fn on_synthesis_start(&self, _groups: usize) {}
    fn on_synthesis_progress(&self, _written: usize, _groups: usize) {}
    fn on_synthesis_complete(&self, _written: usize, _duration_secs: f64) {}
    fn on_link_start(&self, _total_links: usize) {}
    fn on_link_progress(&self, _linked: usize, _total_links: usize) {}
    fn on_link_complete(&self, _linked: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
