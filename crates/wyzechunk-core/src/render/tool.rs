use crate::error::{Error, ToolError};
use crate::platform;
use std::ffi::OsString;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_DIAGNOSTIC_BYTES: usize = 8 * 1024;

/// Seam to the external stream-copy concatenation tool.
///
/// `concat` reads the ordered manifest and writes the joined media to
/// `output`, overwriting it. It must return promptly with
/// [`ToolError::Interrupted`] once `cancel` is set.
pub trait ConcatTool: Send + Sync {
    fn name(&self) -> &str;

    /// Fail with a configuration error when the tool cannot be run at all.
    fn check_available(&self) -> Result<(), Error> {
        Ok(())
    }

    fn concat(&self, manifest: &Path, output: &Path, cancel: &AtomicBool) -> Result<(), ToolError>;
}

/// Runs `ffmpeg` with the concat demuxer in stream-copy mode.
#[derive(Debug, Clone)]
pub struct FfmpegConcat {
    program: String,
    timeout: Option<Duration>,
}

impl FfmpegConcat {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn args(manifest: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostdin",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(manifest.into());
        args.extend(["-c", "copy", "-y"].iter().map(OsString::from));
        args.push(output.into());
        args
    }
}

impl ConcatTool for FfmpegConcat {
    fn name(&self) -> &str {
        &self.program
    }

    fn check_available(&self) -> Result<(), Error> {
        match platform::find_program(&self.program) {
            Some(found) => {
                debug!("Using {} at {}", self.program, found.display());
                Ok(())
            }
            None => Err(Error::Config(format!("{} not found", self.program))),
        }
    }

    fn concat(&self, manifest: &Path, output: &Path, cancel: &AtomicBool) -> Result<(), ToolError> {
        // stderr goes to a file rather than a pipe so a chatty child can never
        // block on a full pipe while we poll it.
        let mut stderr_sink = tempfile::tempfile()?;

        let mut child = Command::new(&self.program)
            .args(Self::args(manifest, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_sink.try_clone()?))
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if cancel.load(Ordering::SeqCst) {
                terminate(&mut child);
                return Err(ToolError::Interrupted);
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    terminate(&mut child);
                    return Err(ToolError::TimedOut(timeout));
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        if status.success() {
            return Ok(());
        }
        // A terminal Ctrl-C reaches the child too; its non-zero exit is the
        // interruption, not a render failure.
        if cancel.load(Ordering::SeqCst) {
            return Err(ToolError::Interrupted);
        }
        Err(ToolError::Failed {
            status: status.to_string(),
            diagnostics: read_diagnostics(&mut stderr_sink)?,
        })
    }
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill child process {}: {}", child.id(), e);
    }
    let _ = child.wait();
}

/// Tail of the captured stderr; ffmpeg puts the useful line last.
fn read_diagnostics(sink: &mut File) -> std::io::Result<String> {
    sink.seek(SeekFrom::Start(0))?;
    let mut raw = Vec::new();
    sink.read_to_end(&mut raw)?;
    let start = raw.len().saturating_sub(MAX_DIAGNOSTIC_BYTES);
    Ok(String::from_utf8_lossy(&raw[start..]).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_request_stream_copy_concat() {
        let args = FfmpegConcat::args(Path::new("/tmp/list.txt"), Path::new("/out/.a.partial.mkv"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");

        assert!(joined.contains("-f concat -safe 0 -i /tmp/list.txt"));
        assert!(joined.contains("-c copy -y"));
        assert_eq!(args.last().unwrap(), "/out/.a.partial.mkv");
    }

    #[test]
    fn test_missing_program_is_configuration_error() {
        let tool = FfmpegConcat::new("wyzechunk-no-such-ffmpeg");
        assert!(matches!(tool.check_available(), Err(Error::Config(_))));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let tool = FfmpegConcat::new("/definitely/not/here/ffmpeg");
        let cancel = AtomicBool::new(false);
        let err = tool
            .concat(Path::new("/tmp/list.txt"), Path::new("/tmp/out.mkv"), &cancel)
            .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
