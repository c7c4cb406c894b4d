//! Lazy sequence of resized frames.
//!
//! [`FrameSource`] wraps a [`FrameCursor`] and implements [`Iterator`]: each
//! call to [`next()`](Iterator::next) applies the frame-skip rule, reads one
//! frame and resizes it onto the output grid. The sequence is finite and
//! forward-only; once it ends it stays ended.
//!
//! Why it ended is available from [`FrameSource::end`].

use image::RgbImage;

use crate::{
    configuration::{ConversionOptions, FrameSkip, Interpolation},
    cursor::FrameCursor,
    error::PixelGridError,
    resize::resize_frame,
};

/// Why a [`FrameSource`] stopped producing frames.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StreamEnd {
    /// The decoder reported no more frames.
    Exhausted,
    /// The decoder failed mid-stream. Frames read before the failure are
    /// kept.
    DecodeFailure(String),
    /// The configured maximum number of frames was emitted.
    FrameLimit(u64),
    /// The decode position passed the safety ceiling derived from the
    /// source's reported frame count.
    PositionCeiling(u64),
}

/// Iterator over frames resized to the output grid.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use pixelgrid::{ConversionOptions, FrameSource, MemoryCursor, StreamEnd};
///
/// let frames = vec![RgbImage::from_pixel(16, 12, Rgb([255, 0, 0])); 3];
/// let cursor = MemoryCursor::new(16, 12, frames)?;
/// let mut source = FrameSource::new(cursor, &ConversionOptions::new(8, 6));
///
/// let resized: Vec<RgbImage> = source.by_ref().collect::<Result<_, _>>()?;
/// assert_eq!(resized.len(), 3);
/// assert_eq!(resized[0].dimensions(), (8, 6));
/// assert_eq!(source.end(), Some(&StreamEnd::Exhausted));
/// # Ok::<(), pixelgrid::PixelGridError>(())
/// ```
pub struct FrameSource<C> {
    cursor: C,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    frame_skip: FrameSkip,
    max_frames: Option<u64>,
    position_ceiling: Option<u64>,
    strict_decoding: bool,
    emitted: u64,
    last_position: Option<u64>,
    end: Option<StreamEnd>,
}

impl<C: FrameCursor> FrameSource<C> {
    /// Build a frame source over `cursor` using the grid size, resize
    /// policy, skip policy, frame limit and decoding strictness from
    /// `options`.
    pub fn new(cursor: C, options: &ConversionOptions) -> Self {
        Self {
            cursor,
            width: options.width,
            height: options.height,
            interpolation: options.interpolation,
            frame_skip: options.frame_skip,
            max_frames: options.max_frames,
            position_ceiling: None,
            strict_decoding: options.strict_decoding,
            emitted: 0,
            last_position: None,
            end: None,
        }
    }

    /// Stop once the decode position reaches `ceiling`, even if the decoder
    /// keeps producing frames.
    #[must_use]
    pub fn with_position_ceiling(mut self, ceiling: Option<u64>) -> Self {
        self.position_ceiling = ceiling;
        self
    }

    /// Why the sequence ended, or `None` while it is still running.
    pub fn end(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }

    /// Number of frames produced so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Decode position of the most recently produced frame.
    pub fn last_position(&self) -> Option<u64> {
        self.last_position
    }

    /// The underlying cursor.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Consume the source and return the cursor.
    pub fn into_cursor(self) -> C {
        self.cursor
    }

    fn finish(&mut self, end: StreamEnd) {
        self.end = Some(end);
    }

    /// Reposition per the skip rule, then read one full-resolution frame.
    fn read_next(&mut self) -> Result<Option<(u64, RgbImage)>, PixelGridError> {
        let position = self.cursor.position();
        if let Some(target) = self.frame_skip.jump_from(position) {
            log::trace!("Skipping from frame {position} to {target}");
            self.cursor.seek(target)?;
        }

        let position = self.cursor.position();
        if let Some(ceiling) = self.position_ceiling {
            if position >= ceiling {
                log::warn!(
                    "Decode position {position} reached the safety ceiling {ceiling}; stopping"
                );
                self.finish(StreamEnd::PositionCeiling(ceiling));
                return Ok(None);
            }
        }

        Ok(self.cursor.read()?.map(|frame| (position, frame)))
    }
}

impl<C: FrameCursor> Iterator for FrameSource<C> {
    type Item = Result<RgbImage, PixelGridError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }

        if let Some(limit) = self.max_frames {
            if self.emitted >= limit {
                log::info!("Frame limit of {limit} reached");
                self.finish(StreamEnd::FrameLimit(limit));
                return None;
            }
        }

        match self.read_next() {
            Ok(Some((position, frame))) => {
                self.emitted += 1;
                self.last_position = Some(position);
                Some(Ok(resize_frame(
                    &frame,
                    self.width,
                    self.height,
                    self.interpolation,
                )))
            }
            Ok(None) => {
                if self.end.is_none() {
                    log::info!(
                        "No more frames after {} emitted (stream end); stopping",
                        self.emitted
                    );
                    self.finish(StreamEnd::Exhausted);
                }
                None
            }
            Err(error) if self.strict_decoding => {
                self.finish(StreamEnd::DecodeFailure(error.to_string()));
                Some(Err(error))
            }
            Err(error) => {
                log::warn!("Can't receive frame ({error}); treating as end of stream");
                self.finish(StreamEnd::DecodeFailure(error.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::cursor::MemoryCursor;

    fn numbered_frames(count: u8) -> Vec<RgbImage> {
        (0..count)
            .map(|index| RgbImage::from_pixel(4, 3, Rgb([index, 0, 0])))
            .collect()
    }

    fn emitted_indices(options: &ConversionOptions, count: u8) -> Vec<u8> {
        let cursor = MemoryCursor::new(4, 3, numbered_frames(count)).unwrap();
        FrameSource::new(cursor, options)
            .map(|frame| frame.unwrap().get_pixel(0, 0)[0])
            .collect()
    }

    #[test]
    fn reads_every_frame_without_skip() {
        let options = ConversionOptions::new(4, 3);
        assert_eq!(emitted_indices(&options, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn periodic_skip_jumps_at_period_end() {
        let options = ConversionOptions::new(4, 3).with_frame_skip(FrameSkip::periodic(3, 1));
        assert_eq!(emitted_indices(&options, 10), vec![0, 1, 3, 4, 6, 7, 9]);
    }

    #[test]
    fn max_frames_limits_output() {
        let options = ConversionOptions::new(4, 3).with_max_frames(Some(2));
        let cursor = MemoryCursor::new(4, 3, numbered_frames(5)).unwrap();
        let mut source = FrameSource::new(cursor, &options);
        assert_eq!(source.by_ref().count(), 2);
        assert_eq!(source.end(), Some(&StreamEnd::FrameLimit(2)));
    }

    #[test]
    fn position_ceiling_stops_runaway_streams() {
        let options = ConversionOptions::new(4, 3);
        let cursor = MemoryCursor::new(4, 3, numbered_frames(8)).unwrap();
        let mut source = FrameSource::new(cursor, &options).with_position_ceiling(Some(5));
        assert_eq!(source.by_ref().count(), 5);
        assert_eq!(source.end(), Some(&StreamEnd::PositionCeiling(5)));
        assert_eq!(source.last_position(), Some(4));
    }

    #[test]
    fn stays_ended_after_exhaustion() {
        let cursor = MemoryCursor::new(4, 3, numbered_frames(1)).unwrap();
        let mut source = FrameSource::new(cursor, &ConversionOptions::new(4, 3));
        assert!(source.next().is_some());
        assert!(source.next().is_none());
        assert!(source.next().is_none());
        assert_eq!(source.end(), Some(&StreamEnd::Exhausted));
        assert_eq!(source.emitted(), 1);
    }
}
