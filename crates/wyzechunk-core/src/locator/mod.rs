mod timestamp;
mod walk;

use chrono::NaiveDateTime;
use std::path::PathBuf;

pub use timestamp::timestamp_from_path;
pub use walk::{locate_recordings, FragmentPattern};

/// One camera fragment and the minute it started recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub path: PathBuf,
    pub timestamp: NaiveDateTime,
}

impl Recording {
    pub fn new(path: PathBuf, timestamp: NaiveDateTime) -> Self {
        Self { path, timestamp }
    }
}
