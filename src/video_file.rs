//! Core [`VideoFile`] implementation.
//!
//! `VideoFile` is the entry point for FFmpeg-backed conversions. It opens a
//! container, selects the best video stream, caches its metadata and hands
//! out a [`DecodeCursor`] for sequential frame decoding.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{
    decode::DecodeCursor,
    error::PixelGridError,
    metadata::{MediaMetadata, VideoMetadata},
};

/// An opened video file.
///
/// Created via [`VideoFile::open`]. The demuxer stays open until the value is
/// dropped or [`close`](VideoFile::close)d.
///
/// # Example
///
/// ```no_run
/// use pixelgrid::VideoFile;
///
/// let video = VideoFile::open("input.mp4")?;
/// if let Some(stream) = &video.metadata().video {
///     println!("{}x{} @ {:.2} fps", stream.width, stream.height, stream.frames_per_second);
/// }
/// video.close();
/// # Ok::<(), pixelgrid::PixelGridError>(())
/// ```
pub struct VideoFile {
    /// The opened FFmpeg input (demuxer) context.
    pub(crate) input_context: Input,
    /// Cached metadata extracted at open time.
    pub(crate) metadata: MediaMetadata,
    /// Index of the best video stream, if one exists.
    pub(crate) video_stream_index: Option<usize>,
    pub(crate) file_path: PathBuf,
    /// Set once a cursor has read packets; the next cursor rewinds first.
    pub(crate) demuxed: bool,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the best
    /// video stream and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PixelGridError::FileOpen`] if the file is missing or cannot
    /// be recognised as media. A file without a video stream opens
    /// successfully; conversions then fail with
    /// [`PixelGridError::NoVideoStream`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PixelGridError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| PixelGridError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| PixelGridError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let format = input_context.format().name().to_string();

        let video_stream_index = input_context
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index());

        let video = match video_stream_index {
            Some(index) => {
                let stream = input_context
                    .stream(index)
                    .ok_or(PixelGridError::NoVideoStream)?;

                let decoder_context = CodecContext::from_parameters(stream.parameters())
                    .map_err(|error| PixelGridError::FileOpen {
                        path: file_path.clone(),
                        reason: format!("Failed to read video codec parameters: {error}"),
                    })?;
                let video_decoder =
                    decoder_context
                        .decoder()
                        .video()
                        .map_err(|error| PixelGridError::FileOpen {
                            path: file_path.clone(),
                            reason: format!("Failed to create video decoder: {error}"),
                        })?;

                let frame_rate = stream.avg_frame_rate();
                let frames_per_second = if frame_rate.denominator() != 0 {
                    frame_rate.numerator() as f64 / frame_rate.denominator() as f64
                } else {
                    let rate = stream.rate();
                    if rate.denominator() != 0 {
                        rate.numerator() as f64 / rate.denominator() as f64
                    } else {
                        0.0
                    }
                };

                let frame_count = if stream.frames() > 0 {
                    stream.frames() as u64
                } else if frames_per_second > 0.0 {
                    (duration.as_secs_f64() * frames_per_second).round() as u64
                } else {
                    0
                };

                let codec = video_decoder
                    .codec()
                    .map(|codec| codec.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                Some(VideoMetadata {
                    width: video_decoder.width(),
                    height: video_decoder.height(),
                    frames_per_second,
                    frame_count,
                    codec,
                })
            }
            None => None,
        };

        if let Some(video) = &video {
            log::debug!(
                "Video stream: {}x{} @ {:.3} fps, ~{} frames [{}]",
                video.width,
                video.height,
                video.frames_per_second,
                video.frame_count,
                video.codec,
            );
        }

        Ok(Self {
            input_context,
            metadata: MediaMetadata {
                video,
                duration,
                format,
            },
            video_stream_index,
            file_path,
            demuxed: false,
        })
    }

    /// Metadata cached at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Create a decode cursor positioned at frame 0.
    ///
    /// The cursor borrows the file mutably, so only one can exist at a time.
    ///
    /// # Errors
    ///
    /// - [`PixelGridError::NoVideoStream`] if the file has no video.
    /// - [`PixelGridError::FfmpegError`] if the decoder cannot be created.
    pub fn cursor(&mut self) -> Result<DecodeCursor<'_>, PixelGridError> {
        DecodeCursor::new(self)
    }

    /// Release the demuxer and every FFmpeg resource held by the file.
    pub fn close(self) {
        log::debug!("Releasing video file: {}", self.file_path.display());
        drop(self);
    }
}

/// Lightweight metadata probe.
///
/// Opens the file, copies its metadata and closes the demuxer immediately.
pub struct MediaProbe;

impl MediaProbe {
    /// Probe a video file and return its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`PixelGridError::FileOpen`] if the file cannot be opened.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaMetadata, PixelGridError> {
        let video = VideoFile::open(path)?;
        let metadata = video.metadata.clone();
        video.close();
        Ok(metadata)
    }
}
