//! Error types for the `pixelgrid` crate.
//!
//! This module defines [`PixelGridError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! dimensions, upstream messages) to be printed directly to the user.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `pixelgrid` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PixelGridError {
    /// The input video could not be opened.
    #[error("Input file could not be opened at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The source reports a zero width or height.
    #[error("Source video reports invalid dimensions {width}x{height}")]
    InvalidSourceDimensions {
        /// Reported source width.
        width: u32,
        /// Reported source height.
        height: u32,
    },

    /// The output grid does not have the source's aspect ratio.
    #[error(
        "Grid size {grid_width}/{grid_height} is not the same aspect ratio as the source \
         ({source_width}x{source_height})"
    )]
    AspectRatioMismatch {
        /// Configured grid width.
        grid_width: u32,
        /// Configured grid height.
        grid_height: u32,
        /// Source frame width.
        source_width: u32,
        /// Source frame height.
        source_height: u32,
    },

    /// A grid dimension of zero was configured.
    #[error("Grid size must be at least 1x1 (got {width}x{height})")]
    InvalidGridSize {
        /// Configured grid width.
        width: u32,
        /// Configured grid height.
        height: u32,
    },

    /// Frame skipping was enabled with a trigger period of zero.
    #[error("Frame-skip period must be greater than zero")]
    InvalidSkipPeriod,

    /// A channel specifier could not be parsed.
    #[error("Invalid channel: {0} (expected 0, 1, 2 or red, green, blue)")]
    InvalidChannel(String),

    /// A value transform specifier could not be parsed.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// An interpolation mode could not be parsed.
    #[error("Invalid interpolation mode: {0}")]
    InvalidInterpolation(String),

    /// An FFmpeg log level name could not be parsed.
    #[error("Invalid FFmpeg log level: {0} (expected quiet, error, warning, info, verbose or debug)")]
    InvalidLogLevel(String),

    /// An in-memory frame does not match the declared source size.
    #[error("Frame {index} is {actual_width}x{actual_height}, expected {width}x{height}")]
    FrameSizeMismatch {
        /// Position of the offending frame.
        index: usize,
        /// Declared frame width.
        width: u32,
        /// Declared frame height.
        height: u32,
        /// Actual frame width.
        actual_width: u32,
        /// Actual frame height.
        actual_height: u32,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing the output document.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The output document could not be serialized.
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] JsonError),
}

impl From<FfmpegError> for PixelGridError {
    fn from(error: FfmpegError) -> Self {
        PixelGridError::FfmpegError(error.to_string())
    }
}
