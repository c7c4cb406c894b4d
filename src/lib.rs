//! # pixelgrid
//!
//! Turn a video into a JSON array of tiny pixel grids.
//!
//! Every decoded frame is shrunk to a fixed `width` x `height` grid, one
//! color channel is sampled per cell, a numeric transform is applied, and the
//! frames are written as a nested JSON array: frames, then rows, then
//! integers. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pixelgrid::{Channel, ConversionOptions, FrameSkip, Interpolation, ValueTransform};
//!
//! let options = ConversionOptions::new(8, 6)
//!     .with_channel(Channel::Red)
//!     .with_interpolation(Interpolation::Area)
//!     .with_frame_skip(FrameSkip::Disabled)
//!     .with_transform(ValueTransform::Identity);
//!
//! let report = pixelgrid::convert_file("input.mp4", "result.json", &options)?;
//! println!("{} frames written", report.frames_written);
//! # Ok::<(), pixelgrid::PixelGridError>(())
//! ```
//!
//! ## Pipeline
//!
//! - [`VideoFile`] opens the container and caches [`VideoMetadata`].
//! - A [`FrameCursor`] ([`DecodeCursor`] for files, [`MemoryCursor`] for
//!   frames already in memory) yields full-resolution RGB frames.
//! - [`FrameSource`] applies the [`FrameSkip`] rule and resizes each frame
//!   with the chosen [`Interpolation`].
//! - [`extract_grid`] samples one [`Channel`] through a [`ValueTransform`];
//!   grids accumulate in an [`OutputDocument`] that is written in one step.
//!
//! The grid must have exactly the source's aspect ratio; a mismatch is
//! reported before any frame is decoded and before the output file is
//! touched.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod convert;
pub mod cursor;
pub mod decode;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod frame_source;
pub mod metadata;
pub mod progress;
pub mod resize;
pub mod transform;
mod utilities;
pub mod video_file;

pub use configuration::{Channel, ConversionOptions, FrameSkip, Interpolation};
pub use convert::{ConversionReport, build_document, convert_file, position_ceiling};
pub use cursor::{FrameCursor, MemoryCursor};
pub use decode::DecodeCursor;
pub use document::{FrameGrid, GridFormatter, OutputDocument, extract_grid};
pub use error::PixelGridError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_source::{FrameSource, StreamEnd};
pub use metadata::{AspectRatio, MediaMetadata, VideoMetadata};
pub use progress::{ProgressCallback, ProgressInfo};
pub use resize::resize_frame;
pub use transform::ValueTransform;
pub use video_file::{MediaProbe, VideoFile};
