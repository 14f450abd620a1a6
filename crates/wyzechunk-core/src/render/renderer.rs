use super::manifest::write_manifest;
use super::tool::ConcatTool;
use crate::error::{Error, ToolError};
use crate::grouping::Session;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

static NOT_CANCELLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(PathBuf),
    /// The final output already existed; nothing was run.
    Skipped(PathBuf),
}

impl RenderOutcome {
    pub fn path(&self) -> &Path {
        match self {
            RenderOutcome::Rendered(p) | RenderOutcome::Skipped(p) => p,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RenderOutcome::Skipped(_))
    }
}

/// `20240101_1000_to_20240101_1002.mkv`
pub fn output_file_name(session: &Session, extension: &str) -> String {
    format!("{}.{}", session.label(), extension)
}

/// Hidden sibling of the final output. Keeps the container extension so the
/// tool still picks the right muxer.
pub fn partial_file_name(session: &Session, extension: &str) -> String {
    format!(".{}.partial.{}", session.label(), extension)
}

/// Renders one session into `output_dir`, skipping sessions whose output is
/// already present and only ever exposing complete files at the final name.
pub struct SessionRenderer<'a> {
    tool: &'a dyn ConcatTool,
    output_dir: &'a Path,
    extension: &'a str,
    cancel: &'a AtomicBool,
}

impl<'a> SessionRenderer<'a> {
    pub fn new(tool: &'a dyn ConcatTool, output_dir: &'a Path, extension: &'a str) -> Self {
        Self {
            tool,
            output_dir,
            extension,
            cancel: &NOT_CANCELLED,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn output_path(&self, session: &Session) -> PathBuf {
        self.output_dir.join(output_file_name(session, self.extension))
    }

    pub fn render(&self, session: &Session) -> Result<RenderOutcome, Error> {
        let final_path = self.output_path(session);
        if final_path.exists() {
            info!("Skipping {}: output already exists", final_path.display());
            return Ok(RenderOutcome::Skipped(final_path));
        }
        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        let inputs = session
            .recordings()
            .iter()
            .map(|r| fs::canonicalize(&r.path))
            .collect::<io::Result<Vec<PathBuf>>>()?;
        let manifest = write_manifest(&inputs)?;

        let partial = PartialOutput::new(
            self.output_dir
                .join(partial_file_name(session, self.extension)),
        );
        debug!(
            "Concatenating {} fragments for {} via {} into {}",
            inputs.len(),
            session.label(),
            self.tool.name(),
            partial.path().display()
        );

        let label = session.label();
        match self.tool.concat(manifest.path(), partial.path(), self.cancel) {
            Ok(()) => {}
            Err(ToolError::Interrupted) => return Err(Error::Cancelled),
            Err(_) if self.cancel.load(Ordering::SeqCst) => return Err(Error::Cancelled),
            Err(source) => {
                return Err(Error::Render {
                    session: label,
                    source,
                })
            }
        }
        if !partial.path().is_file() {
            return Err(Error::Render {
                session: label,
                source: ToolError::NoOutput,
            });
        }

        if self.cancel.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }
        partial.persist(&final_path)?;
        info!(
            "Rendered {} ({} fragments)",
            final_path.display(),
            session.len()
        );
        Ok(RenderOutcome::Rendered(final_path))
    }
}

/// Temporary tool output, removed on drop unless it was renamed into place.
struct PartialOutput {
    path: PathBuf,
    persisted: bool,
}

impl PartialOutput {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Same-directory rename, so readers see either nothing or the whole file.
    fn persist(mut self, destination: &Path) -> io::Result<()> {
        fs::rename(&self.path, destination)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial output {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove partial output {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
