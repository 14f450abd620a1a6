mod manifest;
mod renderer;
mod tool;

pub use manifest::{manifest_line, write_manifest};
pub use renderer::{output_file_name, partial_file_name, RenderOutcome, SessionRenderer};
pub use tool::{ConcatTool, FfmpegConcat};
