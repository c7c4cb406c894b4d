//! Source video metadata.
//!
//! Metadata is read once when a [`VideoFile`](crate::VideoFile) is opened and
//! cached for the lifetime of the handle.

use std::{fmt, time::Duration};

/// Container-level metadata plus the selected video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Metadata of the best video stream, if the container has one.
    pub video: Option<VideoMetadata>,
    /// Total duration of the media file.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Frame count reported by the container, or duration × frame rate when
    /// the container does not store one.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"ffv1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Reduced width:height ratio of the frames.
    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.width, self.height)
    }
}

/// Upper bound on the sizes [`AspectRatio::grid_sizes`] returns.
pub const MAX_GRID_SIZES: u32 = 256;

/// A width:height ratio in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    /// Reduced width term.
    pub width: u32,
    /// Reduced height term.
    pub height: u32,
}

impl AspectRatio {
    /// Reduce `width:height` by their greatest common divisor.
    pub fn new(width: u32, height: u32) -> Self {
        let divisor = gcd(width, height).max(1);
        Self {
            width: width / divisor,
            height: height / divisor,
        }
    }

    /// Grid sizes with this ratio, smallest first, whose width does not
    /// exceed `max_width`. At most [`MAX_GRID_SIZES`] are returned.
    pub fn grid_sizes(self, max_width: u32) -> Vec<(u32, u32)> {
        if self.width == 0 || self.height == 0 {
            return Vec::new();
        }
        let factors = (max_width / self.width).min(MAX_GRID_SIZES);
        (1..=factors)
            .map_while(|factor| {
                Some((
                    self.width.checked_mul(factor)?,
                    self.height.checked_mul(factor)?,
                ))
            })
            .collect()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_common_resolutions() {
        assert_eq!(AspectRatio::new(640, 480).to_string(), "4:3");
        assert_eq!(AspectRatio::new(1920, 1080).to_string(), "16:9");
        assert_eq!(AspectRatio::new(8, 6).to_string(), "4:3");
        assert_eq!(AspectRatio::new(0, 0), AspectRatio { width: 0, height: 0 });
    }

    #[test]
    fn grid_sizes_are_multiples() {
        let sizes = AspectRatio::new(640, 480).grid_sizes(12);
        assert_eq!(sizes, vec![(4, 3), (8, 6), (12, 9)]);
        assert!(AspectRatio::new(0, 5).grid_sizes(100).is_empty());
    }

    #[test]
    fn grid_sizes_stay_bounded_for_huge_inputs() {
        assert_eq!(
            AspectRatio::new(3_000_000_000, 1).grid_sizes(u32::MAX),
            vec![(3_000_000_000, 1)]
        );
        assert_eq!(
            AspectRatio::new(3, 2).grid_sizes(u32::MAX).len(),
            MAX_GRID_SIZES as usize
        );
        // Height overflows on the second multiple.
        assert_eq!(
            AspectRatio::new(1, 3_000_000_000).grid_sizes(u32::MAX),
            vec![(1, 3_000_000_000)]
        );
    }
}
