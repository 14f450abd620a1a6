use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wyzechunk")]
#[command(
    about = "Combine 1min video fragments recorded by Wyze V3 cameras into full videos",
    long_about = None
)]
pub struct Cli {
    /// Path to folder containing Wyze recordings (usually called "record")
    pub recordings_dir: PathBuf,

    /// Path to output combined videos to [default: current directory]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of sessions to render at once
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Gap in seconds between fragments that starts a new video
    #[arg(long, value_name = "SECS")]
    pub gap_threshold: Option<i64>,

    /// Kill ffmpeg if a single video takes longer than this
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// List the videos that would be rendered without running ffmpeg
    #[arg(long)]
    pub dry_run: bool,
}
