use crate::locator::Recording;
use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

/// Compact, sortable timestamp used in session labels and output names.
pub const SESSION_TIME_FORMAT: &str = "%Y%m%d_%H%M";

/// A maximal run of fragments whose consecutive gaps are all below the
/// threshold. Always non-empty and sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    recordings: Vec<Recording>,
}

impl Session {
    fn start_with(first: Recording) -> Self {
        Self {
            recordings: vec![first],
        }
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    /// Sessions are never empty; present for the usual `len` pairing.
    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.recordings[0].timestamp
    }

    pub fn end(&self) -> NaiveDateTime {
        self.recordings[self.recordings.len() - 1].timestamp
    }

    /// Time covered from the first fragment's start to the last one's start.
    pub fn span(&self) -> TimeDelta {
        self.end() - self.start()
    }

    /// `<start>_to_<end>`, e.g. `20240101_1000_to_20240101_1002`.
    pub fn label(&self) -> String {
        format!(
            "{}_to_{}",
            self.start().format(SESSION_TIME_FORMAT),
            self.end().format(SESSION_TIME_FORMAT)
        )
    }
}

/// Sort recordings by `(timestamp, path)` and split them wherever the gap to
/// the previous fragment reaches `threshold`.
pub fn group_sessions(mut recordings: Vec<Recording>, threshold: TimeDelta) -> Vec<Session> {
    recordings.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut sessions: Vec<Session> = Vec::new();
    let mut current: Option<Session> = None;

    for recording in recordings {
        current = Some(match current.take() {
            None => Session::start_with(recording),
            Some(mut session) => {
                let gap = recording.timestamp - session.end();
                if gap == TimeDelta::zero() {
                    warn!(
                        "Duplicate timestamp {} for {}; keeping both in path order",
                        recording.timestamp,
                        recording.path.display()
                    );
                }
                if gap < threshold {
                    session.recordings.push(recording);
                    session
                } else {
                    debug!("Gap of {}s closes session {}", gap.num_seconds(), session.label());
                    sessions.push(session);
                    Session::start_with(recording)
                }
            }
        });
    }
    sessions.extend(current);

    sessions
}
