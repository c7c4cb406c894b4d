//! Forward decode cursors.
//!
//! A [`FrameCursor`] is the mutable decode position behind a
//! [`FrameSource`](crate::FrameSource): it yields full-resolution RGB frames
//! one at a time and can be repositioned for the frame-skip policy.
//!
//! Two implementations ship with the crate:
//!
//! - [`DecodeCursor`](crate::DecodeCursor) decodes a video file with FFmpeg.
//! - [`MemoryCursor`] replays frames already held in memory.

use image::RgbImage;

use crate::error::PixelGridError;

/// Sequential, repositionable source of decoded frames.
pub trait FrameCursor {
    /// Source frame size as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Number of frames the source claims to hold, if known.
    fn frame_count_hint(&self) -> Option<u64>;

    /// Frame rate of the source, if known.
    fn frames_per_second(&self) -> Option<f64> {
        None
    }

    /// Zero-based index of the frame the next [`read`](FrameCursor::read)
    /// returns.
    fn position(&self) -> u64;

    /// Move the cursor so the next read returns frame `position`.
    ///
    /// Seeking past the end is allowed; the next read then reports the end
    /// of the stream.
    fn seek(&mut self, position: u64) -> Result<(), PixelGridError>;

    /// Decode the frame at the current position and advance by one.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    fn read(&mut self) -> Result<Option<RgbImage>, PixelGridError>;
}

impl<C: FrameCursor + ?Sized> FrameCursor for &mut C {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (**self).frame_count_hint()
    }

    fn frames_per_second(&self) -> Option<f64> {
        (**self).frames_per_second()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn seek(&mut self, position: u64) -> Result<(), PixelGridError> {
        (**self).seek(position)
    }

    fn read(&mut self) -> Result<Option<RgbImage>, PixelGridError> {
        (**self).read()
    }
}

/// A cursor over frames held in memory.
///
/// Useful for synthetic videos and for frames decoded elsewhere.
///
/// # Example
///
/// ```
/// use image::{Rgb, RgbImage};
/// use pixelgrid::{FrameCursor, MemoryCursor};
///
/// let red = RgbImage::from_pixel(8, 6, Rgb([255, 0, 0]));
/// let mut cursor = MemoryCursor::new(8, 6, vec![red.clone(), red])?;
/// assert_eq!(cursor.frame_count_hint(), Some(2));
/// assert!(cursor.read()?.is_some());
/// assert_eq!(cursor.position(), 1);
/// # Ok::<(), pixelgrid::PixelGridError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    width: u32,
    height: u32,
    frames: Vec<RgbImage>,
    position: u64,
}

impl MemoryCursor {
    /// Wrap `frames`, all of which must be `width` x `height`.
    ///
    /// An empty `frames` vector models a valid video with no frames.
    ///
    /// # Errors
    ///
    /// Returns [`PixelGridError::FrameSizeMismatch`] for the first frame of
    /// a different size.
    pub fn new(width: u32, height: u32, frames: Vec<RgbImage>) -> Result<Self, PixelGridError> {
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, frame)| frame.dimensions() != (width, height))
        {
            return Err(PixelGridError::FrameSizeMismatch {
                index,
                width,
                height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        Ok(Self {
            width,
            height,
            frames,
            position: 0,
        })
    }
}

impl FrameCursor for MemoryCursor {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count_hint(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, position: u64) -> Result<(), PixelGridError> {
        self.position = position;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<RgbImage>, PixelGridError> {
        let frame = usize::try_from(self.position)
            .ok()
            .and_then(|index| self.frames.get(index))
            .cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn solid(value: u8) -> RgbImage {
        RgbImage::from_pixel(4, 3, Rgb([value, value, value]))
    }

    #[test]
    fn reads_in_order_then_ends() {
        let mut cursor = MemoryCursor::new(4, 3, vec![solid(1), solid(2)]).unwrap();
        assert_eq!(cursor.read().unwrap().unwrap().get_pixel(0, 0)[0], 1);
        assert_eq!(cursor.read().unwrap().unwrap().get_pixel(0, 0)[0], 2);
        assert!(cursor.read().unwrap().is_none());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn seek_past_end_reports_end_of_stream() {
        let mut cursor = MemoryCursor::new(4, 3, vec![solid(1)]).unwrap();
        cursor.seek(10).unwrap();
        assert!(cursor.read().unwrap().is_none());
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn rejects_mismatched_frame() {
        let odd = RgbImage::new(5, 3);
        let result = MemoryCursor::new(4, 3, vec![solid(0), odd]);
        assert!(matches!(
            result,
            Err(PixelGridError::FrameSizeMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn empty_video_is_valid() {
        let mut cursor = MemoryCursor::new(4, 3, Vec::new()).unwrap();
        assert_eq!(cursor.frame_count_hint(), Some(0));
        assert!(cursor.read().unwrap().is_none());
    }
}
