use super::{timestamp_from_path, Recording};
use crate::error::Error;
use glob::Pattern;
use std::path::Path;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// File-name pattern for camera fragments: a two character stem plus the
/// fragment extension, i.e. `??.mp4`.
#[derive(Debug, Clone)]
pub struct FragmentPattern {
    pattern: Pattern,
}

impl FragmentPattern {
    pub fn new(extension: &str) -> Result<Self, Error> {
        let glob = format!("??.{}", Pattern::escape(extension));
        let pattern = Pattern::new(&glob)
            .map_err(|e| Error::Config(format!("Invalid fragment pattern '{}': {}", glob, e)))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }
}

/// Walk `root` and return every fragment beneath it with its derived
/// timestamp. Order follows the (name-sorted) walk, not time; callers sort.
///
/// A fragment whose path does not encode a timestamp fails the whole walk.
pub fn locate_recordings(root: &Path, pattern: &FragmentPattern) -> Result<Vec<Recording>, Error> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Camera recording directory not found or invalid: {}",
            root.display()
        )));
    }

    let mut recordings = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str() else {
            warn!("Skipping {}: file name is not valid UTF-8", path.display());
            continue;
        };
        if !pattern.matches(name) || !path.is_file() {
            trace!("Skipping {}", path.display());
            continue;
        }

        let timestamp = timestamp_from_path(path)?;
        debug!("Found fragment {} at {}", path.display(), timestamp);
        recordings.push(Recording::new(path.to_path_buf(), timestamp));
    }

    Ok(recordings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_two_char_stem_only() {
        let pattern = FragmentPattern::new("mp4").unwrap();
        assert!(pattern.matches("05.mp4"));
        assert!(pattern.matches("ab.mp4"));
        assert!(!pattern.matches("5.mp4"));
        assert!(!pattern.matches("005.mp4"));
        assert!(!pattern.matches("05.mkv"));
        assert!(!pattern.matches("05.mp4.part"));
    }

    #[test]
    fn test_pattern_escapes_extension() {
        let pattern = FragmentPattern::new("m[p]4").unwrap();
        assert!(pattern.matches("05.m[p]4"));
        assert!(!pattern.matches("05.mp4"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_is_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::tempdir().unwrap();
        let hour = tmp.path().join("20240101").join("10");
        std::fs::create_dir_all(&hour).unwrap();
        std::fs::write(hour.join("00.mp4"), "x").unwrap();
        std::fs::write(hour.join(OsStr::from_bytes(b"\xff1.mp4")), "x").unwrap();

        let pattern = FragmentPattern::new("mp4").unwrap();
        let found = locate_recordings(tmp.path(), &pattern).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, hour.join("00.mp4"));
    }
}
