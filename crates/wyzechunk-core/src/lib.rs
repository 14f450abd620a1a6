pub mod config;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod locator;
pub mod platform;
pub mod progress;
pub mod render;

pub use config::AppConfig;
pub use engine::{ChunkEngine, ChunkResult};
pub use error::{Error, ToolError};
pub use grouping::{group_sessions, Session};
pub use locator::{locate_recordings, timestamp_from_path, Recording};
pub use progress::{ProgressReporter, SilentReporter};
pub use render::{ConcatTool, FfmpegConcat, RenderOutcome, SessionRenderer};
