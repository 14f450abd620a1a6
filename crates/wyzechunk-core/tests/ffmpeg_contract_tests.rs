//! Drives `FfmpegConcat` against shell scripts standing in for ffmpeg.
//!
//! Everything lives in one test so no other test thread can fork while a
//! script file is still open for writing (which makes exec fail with ETXTBSY).
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use tempfile::tempdir;

use wyzechunk_core::{AppConfig, ChunkEngine, ConcatTool, Error, FfmpegConcat, SilentReporter, ToolError};

/// Logs its arguments, then concatenates every `file '...'` entry of the
/// manifest given after `-i` into the last argument.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/args.log"
manifest=""
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then manifest="$2"; shift; fi
  out="$1"
  shift
done
sed -n "s/^file '\(.*\)'$/\1/p" "$manifest" | while IFS= read -r f; do cat "$f"; done > "$out"
"#;

const FAILING_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
printf 'partial' > "$last"
echo "concat.txt: Invalid data found when processing input" >&2
exit 1
"#;

const SLOW_FFMPEG: &str = r#"#!/bin/sh
for last; do :; done
printf 'partial' > "$last"
exec sleep 30
"#;

/// What ffmpeg does when the terminal's SIGINT reaches it as well.
const SIGINT_FFMPEG: &str = r#"#!/bin/sh
echo "Exiting normally, received signal 2." >&2
exit 255
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn create_fragments(root: &Path, minutes: &[u32]) {
    let dir = root.join("20240101").join("10");
    fs::create_dir_all(&dir).unwrap();
    for m in minutes {
        fs::write(dir.join(format!("{:02}.mp4", m)), format!("<{:02}>", m)).unwrap();
    }
}

fn engine_for(script: &Path, timeout_secs: Option<u64>) -> ChunkEngine {
    ChunkEngine::new(AppConfig {
        ffmpeg_path: script.to_string_lossy().into_owned(),
        render_timeout_secs: timeout_secs,
        ..AppConfig::default()
    })
}

#[test]
fn test_ffmpeg_process_contract() {
    let bin = tempdir().unwrap();
    let ok_dir = bin.path().join("ok");
    let fail_dir = bin.path().join("fail");
    let slow_dir = bin.path().join("slow");
    let sigint_dir = bin.path().join("sigint");
    for dir in [&ok_dir, &fail_dir, &slow_dir, &sigint_dir] {
        fs::create_dir(dir).unwrap();
    }
    let ok = write_script(&ok_dir, "ffmpeg", FAKE_FFMPEG);
    let failing = write_script(&fail_dir, "ffmpeg", FAILING_FFMPEG);
    let slow = write_script(&slow_dir, "ffmpeg", SLOW_FFMPEG);
    let sigint = write_script(&sigint_dir, "ffmpeg", SIGINT_FFMPEG);

    let tmp = tempdir().unwrap();
    let record = tmp.path().join("camera record");
    create_fragments(&record, &[0, 1, 2, 5, 6]);

    // Success: stream-copy arguments, quoted manifest, atomic rename.
    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    let result = engine_for(&ok, None)
        .run(&record, &out, &SilentReporter)
        .unwrap();
    assert_eq!(result.rendered.len(), 2);
    assert_eq!(
        fs::read_to_string(out.join("20240101_1000_to_20240101_1002.mkv")).unwrap(),
        "<00><01><02>"
    );
    assert_eq!(
        fs::read_to_string(out.join("20240101_1005_to_20240101_1006.mkv")).unwrap(),
        "<05><06>"
    );
    assert_eq!(fs::read_dir(&out).unwrap().count(), 2);

    let args = fs::read_to_string(ok_dir.join("args.log")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let pos = |flag: &str| args.iter().position(|a| *a == flag).unwrap();
    assert_eq!(args[pos("-f") + 1], "concat");
    assert_eq!(args[pos("-safe") + 1], "0");
    assert_eq!(args[pos("-c") + 1], "copy");
    assert!(args.contains(&"-y"));
    assert!(args
        .last()
        .unwrap()
        .ends_with(".20240101_1005_to_20240101_1006.partial.mkv"));
    let manifest = PathBuf::from(args[pos("-i") + 1]);
    assert!(!manifest.exists(), "manifest should be removed after render");

    // Failure: diagnostics surface, nothing promoted, nothing left behind.
    let out = tmp.path().join("out_fail");
    fs::create_dir(&out).unwrap();
    let err = engine_for(&failing, None)
        .run(&record, &out, &SilentReporter)
        .unwrap_err();
    match err {
        Error::Render {
            session,
            source: ToolError::Failed { diagnostics, .. },
        } => {
            assert_eq!(session, "20240101_1000_to_20240101_1002");
            assert!(diagnostics.contains("Invalid data found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);

    // Timeout: child is killed and its partial output discarded.
    let out = tmp.path().join("out_slow");
    fs::create_dir(&out).unwrap();
    let started = Instant::now();
    let err = engine_for(&slow, Some(1))
        .run(&record, &out, &SilentReporter)
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(matches!(
        err,
        Error::Render {
            source: ToolError::TimedOut(_),
            ..
        }
    ));
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);

    // Cancellation reports Interrupted without waiting for the child.
    let cancel = AtomicBool::new(true);
    let started = Instant::now();
    let err = FfmpegConcat::new(slow.to_string_lossy().into_owned())
        .concat(&ok_dir.join("none.txt"), &out.join(".x.partial.mkv"), &cancel)
        .unwrap_err();
    assert!(matches!(err, ToolError::Interrupted));
    assert!(started.elapsed() < Duration::from_secs(20));

    // A child that dies from the same Ctrl-C is an interruption, not a failure.
    let cancel = AtomicBool::new(true);
    let err = FfmpegConcat::new(sigint.to_string_lossy().into_owned())
        .concat(&ok_dir.join("none.txt"), &out.join(".y.partial.mkv"), &cancel)
        .unwrap_err();
    assert!(matches!(err, ToolError::Interrupted));
}
