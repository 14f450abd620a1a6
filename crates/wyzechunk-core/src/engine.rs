use crate::config::AppConfig;
use crate::error::Error;
use crate::grouping::{self, Session};
use crate::locator::{self, FragmentPattern};
use crate::progress::ProgressReporter;
use crate::render::{ConcatTool, FfmpegConcat, RenderOutcome, SessionRenderer};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct ChunkEngine {
    config: AppConfig,
    tool: Box<dyn ConcatTool>,
    cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct ChunkResult {
    pub locate_duration: Duration,
    pub render_duration: Duration,
    pub recordings_found: usize,
    pub sessions: usize,
    pub rendered: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl ChunkEngine {
    pub fn new(config: AppConfig) -> Self {
        let tool = FfmpegConcat::new(config.ffmpeg_path.clone()).with_timeout(config.render_timeout());
        Self {
            config,
            tool: Box::new(tool),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_tool(mut self, tool: impl ConcatTool + 'static) -> Self {
        self.tool = Box::new(tool);
        self
    }

    /// Share a flag that, once set, stops rendering and kills the running tool.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Locate and group without rendering anything.
    pub fn plan(&self, recordings_dir: &Path) -> Result<Vec<Session>, Error> {
        self.config.validate()?;
        let pattern = FragmentPattern::new(&self.config.fragment_extension)?;
        let recordings = locator::locate_recordings(recordings_dir, &pattern)?;
        Ok(grouping::group_sessions(recordings, self.config.gap_threshold()?))
    }

    /// Checks that need no output directory: configuration, the external
    /// tool and the recordings directory. Callers that create the output
    /// directory run this first so a doomed run leaves nothing behind.
    pub fn preflight(&self, recordings_dir: &Path) -> Result<(), Error> {
        self.config.validate()?;
        self.tool.check_available()?;
        if !recordings_dir.is_dir() {
            return Err(Error::Config(format!(
                "Camera recording directory not found or invalid: {}",
                recordings_dir.display()
            )));
        }
        Ok(())
    }

    /// Output file a session renders to, whether or not it exists yet.
    pub fn output_path(&self, output_dir: &Path, session: &Session) -> PathBuf {
        SessionRenderer::new(&*self.tool, output_dir, &self.config.output_extension)
            .output_path(session)
    }

    /// Run the full pipeline:
    /// 1. Locate fragments under `recordings_dir` and derive their timestamps
    /// 2. Sort and split them into sessions on the gap threshold
    /// 3. Render each session into `output_dir`, skipping existing outputs
    pub fn run(
        &self,
        recordings_dir: &Path,
        output_dir: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<ChunkResult, Error> {
        self.preflight(recordings_dir)?;
        if !output_dir.is_dir() {
            return Err(Error::Config(format!(
                "Not a directory: {}",
                output_dir.display()
            )));
        }
        let output_dir = output_dir.canonicalize()?;
        let threshold = self.config.gap_threshold()?;
        let pattern = FragmentPattern::new(&self.config.fragment_extension)?;

        // Phase 1: Locate
        info!("Locating fragments in {}...", recordings_dir.display());
        reporter.on_locate_start();
        let locate_start = Instant::now();
        let recordings = locator::locate_recordings(recordings_dir, &pattern)?;
        let locate_duration = locate_start.elapsed();
        let recordings_found = recordings.len();
        reporter.on_locate_complete(recordings_found, locate_duration.as_secs_f64());
        debug!(
            "Locate completed in {:.2}s, {} fragments",
            locate_duration.as_secs_f64(),
            recordings_found
        );

        // Phase 2: Group
        let sessions = grouping::group_sessions(recordings, threshold);
        reporter.on_group_complete(sessions.len());
        info!(
            "{} fragments form {} sessions",
            recordings_found,
            sessions.len()
        );

        // Phase 3: Render
        reporter.on_render_start(sessions.len());
        let render_start = Instant::now();
        let renderer = SessionRenderer::new(
            &*self.tool,
            &output_dir,
            &self.config.output_extension,
        )
        .with_cancel_flag(&self.cancel);

        let outcomes = if self.config.jobs <= 1 {
            self.render_sequential(&renderer, &sessions, reporter)?
        } else {
            self.render_parallel(&renderer, &sessions, reporter)?
        };
        let render_duration = render_start.elapsed();

        let (skipped, rendered): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(RenderOutcome::is_skipped);
        let rendered: Vec<PathBuf> = rendered.iter().map(|o| o.path().to_path_buf()).collect();
        let skipped: Vec<PathBuf> = skipped.iter().map(|o| o.path().to_path_buf()).collect();
        reporter.on_render_complete(
            rendered.len(),
            skipped.len(),
            render_duration.as_secs_f64(),
        );

        Ok(ChunkResult {
            locate_duration,
            render_duration,
            recordings_found,
            sessions: sessions.len(),
            rendered,
            skipped,
        })
    }

    fn render_sequential(
        &self,
        renderer: &SessionRenderer<'_>,
        sessions: &[Session],
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<RenderOutcome>, Error> {
        let mut outcomes = Vec::with_capacity(sessions.len());
        for session in sessions {
            let outcome = renderer.render(session)?;
            report_session(reporter, &outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Sessions are independent, so a failure is recorded and the rest still
    /// render. Completed outputs are never touched by a later failure.
    fn render_parallel(
        &self,
        renderer: &SessionRenderer<'_>,
        sessions: &[Session],
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<RenderOutcome>, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| Error::Config(format!("Could not start render pool: {}", e)))?;

        let results: Vec<Result<RenderOutcome, Error>> = pool.install(|| {
            sessions
                .par_iter()
                .map(|session| {
                    let result = renderer.render(session);
                    match &result {
                        Ok(outcome) => report_session(reporter, outcome),
                        Err(Error::Cancelled) => {}
                        Err(e) => error!("Session {} failed: {}", session.label(), e),
                    }
                    result
                })
                .collect()
        });

        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        let mut outcomes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => failures.push(e),
            }
        }
        if failures.is_empty() {
            Ok(outcomes)
        } else {
            Err(Error::Sessions(failures))
        }
    }
}

fn report_session(reporter: &dyn ProgressReporter, outcome: &RenderOutcome) {
    let name = outcome
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    reporter.on_session_complete(&name, outcome.is_skipped());
}
