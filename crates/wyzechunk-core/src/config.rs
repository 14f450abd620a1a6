use crate::error::Error;
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::time::Duration;

/// Fragments written back to back are 60s apart; anything up to 90s still
/// counts as the same burst of motion.
pub const DEFAULT_GAP_THRESHOLD_SECS: i64 = 90;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gap_threshold_secs: i64,
    pub fragment_extension: String,
    pub output_extension: String,
    pub ffmpeg_path: String,
    pub jobs: usize,
    pub render_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gap_threshold_secs: DEFAULT_GAP_THRESHOLD_SECS,
            fragment_extension: "mp4".to_string(),
            output_extension: "mkv".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            jobs: 1,
            render_timeout_secs: None,
        }
    }
}

impl AppConfig {
    pub fn gap_threshold(&self) -> Result<TimeDelta, Error> {
        TimeDelta::try_seconds(self.gap_threshold_secs).ok_or_else(|| {
            Error::Config(format!(
                "gap threshold {}s is out of range",
                self.gap_threshold_secs
            ))
        })
    }

    pub fn render_timeout(&self) -> Option<Duration> {
        self.render_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.gap_threshold_secs <= 0 {
            return Err(Error::Config(format!(
                "gap threshold must be positive, got {}s",
                self.gap_threshold_secs
            )));
        }
        self.gap_threshold()?;
        if self.jobs == 0 {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        if self.render_timeout_secs == Some(0) {
            return Err(Error::Config("render timeout must be positive".to_string()));
        }
        for (name, ext) in [
            ("fragment_extension", &self.fragment_extension),
            ("output_extension", &self.output_extension),
        ] {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(Error::Config(format!(
                    "{} must be a bare extension like \"mp4\", got {:?}",
                    name, ext
                )));
            }
        }
        if self.ffmpeg_path.trim().is_empty() {
            return Err(Error::Config("ffmpeg_path is empty".to_string()));
        }
        Ok(())
    }
}

/// Optional `wyzechunk.{toml,yaml,json}` in the working directory, overridden
/// by `WYZECHUNK_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("wyzechunk").required(false))
        .add_source(Environment::with_prefix("WYZECHUNK").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
