/// Trait for reporting pipeline progress.
///
/// The CLI implements it with indicatif; library callers and tests use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_locate_start(&self) {}
    fn on_locate_complete(&self, _recordings: usize, _duration_secs: f64) {}
    fn on_group_complete(&self, _sessions: usize) {}
    fn on_render_start(&self, _total_sessions: usize) {}
    fn on_session_complete(&self, _output_name: &str, _skipped: bool) {}
    fn on_render_complete(&self, _rendered: usize, _skipped: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
