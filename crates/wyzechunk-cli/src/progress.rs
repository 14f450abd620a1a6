use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use wyzechunk_core::ProgressReporter;

/// CLI progress reporter using indicatif.
///
/// - Locate phase: spinner (fragment count unknown upfront)
/// - Render phase: progress bar over sessions
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
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for CliReporter {
    fn drop(&mut self) {
        self.finish_bar();
    }
}

impl ProgressReporter for CliReporter {
    fn on_locate_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Locating fragments...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_locate_complete(&self, recordings: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Found {} fragments in {:.2}s",
            recordings, duration_secs
        );
    }

    fn on_group_complete(&self, sessions: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m Grouped into {} videos", sessions);
    }

    fn on_render_start(&self, total_sessions: usize) {
        if total_sessions == 0 {
            return;
        }
        let pb = ProgressBar::new(total_sessions as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Rendering [{bar:30.cyan/dim}] {pos}/{len} videos {msg}",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_session_complete(&self, output_name: &str, _skipped: bool) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(output_name.to_string());
            pb.inc(1);
        }
    }

    fn on_render_complete(&self, rendered: usize, skipped: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Render complete: {} new, {} already present in {:.2}s",
            rendered, skipped, duration_secs
        );
    }
}
