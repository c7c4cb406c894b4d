//! Conversion pipeline.
//!
//! Wires a [`FrameCursor`] through a [`FrameSource`] into an
//! [`OutputDocument`]:
//!
//! 1. validate the options and the grid's aspect ratio against the source,
//!    before any frame is read or any output is opened;
//! 2. iterate resized frames, sampling one channel per pixel;
//! 3. write the finished document in one step.
//!
//! [`convert_file`] runs the whole pipeline on a video file and releases it
//! afterwards, whether or not the conversion succeeded.

use std::path::{Path, PathBuf};

use crate::{
    configuration::ConversionOptions,
    cursor::FrameCursor,
    document::{OutputDocument, extract_grid},
    error::PixelGridError,
    frame_source::{FrameSource, StreamEnd},
    metadata::VideoMetadata,
    progress::ProgressTracker,
    video_file::VideoFile,
};

/// Summary of a finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Number of frame grids written.
    pub frames_written: u64,
    /// Why frame iteration stopped.
    pub end: StreamEnd,
    /// Where the document was written.
    pub output: PathBuf,
    /// Metadata of the converted video stream.
    pub source: VideoMetadata,
}

/// Safety bound on the decode position for a source reporting
/// `frame_count` frames: the reported count plus one second of frames.
///
/// Returns `None` when the source does not report a frame count.
pub fn position_ceiling(frame_count: Option<u64>, frames_per_second: Option<f64>) -> Option<u64> {
    let frame_count = frame_count.filter(|&count| count > 0)?;
    let slack = frames_per_second
        .filter(|fps| fps.is_finite() && *fps > 0.0)
        .map_or(1, |fps| fps.ceil() as u64)
        .max(1);
    Some(frame_count.saturating_add(slack))
}

/// Convert every frame `cursor` produces into an in-memory document.
///
/// Returns the document and the reason iteration stopped.
///
/// # Errors
///
/// - [`PixelGridError::InvalidGridSize`] or
///   [`PixelGridError::InvalidSkipPeriod`] for invalid options.
/// - [`PixelGridError::InvalidSourceDimensions`] or
///   [`PixelGridError::AspectRatioMismatch`] when the grid does not fit the
///   source; no frame has been read at that point.
/// - Any decode error when strict decoding is enabled.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use pixelgrid::{ConversionOptions, MemoryCursor, StreamEnd};
///
/// let red = RgbImage::from_pixel(8, 6, Rgb([255, 0, 0]));
/// let cursor = MemoryCursor::new(8, 6, vec![red.clone(), red])?;
/// let (document, end) = pixelgrid::build_document(cursor, &ConversionOptions::new(8, 6))?;
///
/// assert_eq!(document.len(), 2);
/// assert_eq!(end, StreamEnd::Exhausted);
/// assert!(document.frames()[0].rows().iter().flatten().all(|&value| value == 255));
/// # Ok::<(), pixelgrid::PixelGridError>(())
/// ```
pub fn build_document<C: FrameCursor>(
    cursor: C,
    options: &ConversionOptions,
) -> Result<(OutputDocument, StreamEnd), PixelGridError> {
    options.validate()?;
    let (source_width, source_height) = cursor.dimensions();
    options.check_aspect_ratio(source_width, source_height)?;

    let frame_count = cursor.frame_count_hint();
    let ceiling = position_ceiling(frame_count, cursor.frames_per_second());
    log::debug!(
        "Converting {}x{} source to {}x{} grid (channel={:?}, interpolation={:?}, skip={:?}, ceiling={:?})",
        source_width,
        source_height,
        options.width,
        options.height,
        options.channel,
        options.interpolation,
        options.frame_skip,
        ceiling,
    );

    let total = options
        .max_frames
        .map_or(frame_count, |limit| Some(frame_count.map_or(limit, |count| count.min(limit))));
    let mut tracker = ProgressTracker::new(options.progress.clone(), total, options.batch_size);

    let mut source = FrameSource::new(cursor, options).with_position_ceiling(ceiling);
    let mut document = OutputDocument::new();
    while let Some(frame) = source.next() {
        let frame = frame?;
        document.push(extract_grid(&frame, options.channel, &options.transform));
        tracker.advance(source.last_position());
    }
    tracker.finish();

    let end = source.end().cloned().unwrap_or(StreamEnd::Exhausted);
    Ok((document, end))
}

impl VideoFile {
    /// Convert this video and write the document to `output`.
    ///
    /// The output file is only created once every frame has been processed,
    /// so a configuration error leaves any existing file untouched.
    ///
    /// # Errors
    ///
    /// - [`PixelGridError::NoVideoStream`] if the file has no video.
    /// - Everything [`build_document`] reports.
    /// - [`PixelGridError::IoError`] if the output cannot be written.
    pub fn convert<P: AsRef<Path>>(
        &mut self,
        output: P,
        options: &ConversionOptions,
    ) -> Result<ConversionReport, PixelGridError> {
        let source = self
            .metadata
            .video
            .clone()
            .ok_or(PixelGridError::NoVideoStream)?;

        options.validate()?;
        options.check_aspect_ratio(source.width, source.height)?;

        let (document, end) = build_document(self.cursor()?, options)?;

        let output = output.as_ref().to_path_buf();
        document.write(&output)?;

        Ok(ConversionReport {
            frames_written: document.len() as u64,
            end,
            output,
            source,
        })
    }
}

/// Open `input`, convert it, write `output` and release the video.
///
/// # Errors
///
/// - [`PixelGridError::FileOpen`] if `input` cannot be opened.
/// - Everything [`VideoFile::convert`] reports.
///
/// # Example
///
/// ```no_run
/// use pixelgrid::{Channel, ConversionOptions, ValueTransform};
///
/// let options = ConversionOptions::new(8, 6)
///     .with_channel(Channel::Red)
///     .with_transform(ValueTransform::Identity);
/// let report = pixelgrid::convert_file("input.mp4", "result.json", &options)?;
/// println!("wrote {} frames", report.frames_written);
/// # Ok::<(), pixelgrid::PixelGridError>(())
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConversionOptions,
) -> Result<ConversionReport, PixelGridError> {
    let mut video = VideoFile::open(input)?;
    let result = video.convert(output, options);
    video.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_adds_one_second_of_slack() {
        assert_eq!(position_ceiling(Some(100), Some(25.0)), Some(125));
        assert_eq!(position_ceiling(Some(2), Some(29.97)), Some(32));
        assert_eq!(position_ceiling(Some(10), None), Some(11));
    }

    #[test]
    fn no_ceiling_without_frame_count() {
        assert_eq!(position_ceiling(None, Some(25.0)), None);
        assert_eq!(position_ceiling(Some(0), Some(25.0)), None);
    }
}
