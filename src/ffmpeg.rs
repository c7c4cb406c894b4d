//! FFmpeg's own stderr logging.
//!
//! FFmpeg prints warnings about damaged packets straight to stderr, outside
//! the `log` facade. [`set_ffmpeg_log_level`] quiets or raises that output.
//!
//! ```no_run
//! pixelgrid::set_ffmpeg_log_level("error".parse()?);
//! # Ok::<(), pixelgrid::PixelGridError>(())
//! ```

use std::str::FromStr;

use ffmpeg_next::util::log::{self as av_log, Level};

use crate::error::PixelGridError;

/// Verbosity of FFmpeg's internal logging, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Error,
    /// FFmpeg's default.
    Warning,
    Info,
    Verbose,
    Debug,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = PixelGridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(FfmpegLogLevel::Quiet),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            _ => Err(PixelGridError::InvalidLogLevel(value.to_string())),
        }
    }
}

/// Set what FFmpeg itself prints to stderr while decoding.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    log::debug!("FFmpeg log level set to {level:?}");
    av_log::set_level(level.into());
}
