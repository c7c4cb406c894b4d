//! Conversion configuration.
//!
//! [`ConversionOptions`] is an immutable builder describing one conversion
//! run: the output grid size, which color channel to sample, how frames are
//! resized, the frame-skip policy, and the value transform. It is constructed
//! once and passed by reference to every stage.
//!
//! # Example
//!
//! ```
//! use pixelgrid::{Channel, ConversionOptions, FrameSkip, Interpolation, ValueTransform};
//!
//! let options = ConversionOptions::new(8, 6)
//!     .with_channel(Channel::Green)
//!     .with_interpolation(Interpolation::Bilinear)
//!     .with_frame_skip(FrameSkip::periodic(3, 1))
//!     .with_transform(ValueTransform::Invert);
//!
//! assert!(options.validate().is_ok());
//! assert!(options.check_aspect_ratio(640, 480).is_ok());
//! assert!(options.check_aspect_ratio(1920, 1080).is_err());
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use crate::{
    error::PixelGridError,
    progress::{NoOpProgress, ProgressCallback},
    transform::ValueTransform,
};

/// One color component of a decoded RGB pixel.
///
/// Frames are decoded to packed RGB, so index 0 is red, 1 is green and 2 is
/// blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    /// Component 0. This is the default.
    #[default]
    Red,
    /// Component 1.
    Green,
    /// Component 2.
    Blue,
}

impl Channel {
    /// Map a zero-based component index to a channel.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Channel::Red),
            1 => Some(Channel::Green),
            2 => Some(Channel::Blue),
            _ => None,
        }
    }

    /// Zero-based component index within an RGB pixel.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl FromStr for Channel {
    type Err = PixelGridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "r" | "red" => Ok(Channel::Red),
            "1" | "g" | "green" => Ok(Channel::Green),
            "2" | "b" | "blue" => Ok(Channel::Blue),
            _ => Err(PixelGridError::InvalidChannel(value.to_string())),
        }
    }
}

/// Resampling policy used to shrink a frame onto the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Nearest-neighbour sampling.
    Nearest,
    /// Area averaging: every output cell is the mean of the source pixels
    /// it covers. This is the default.
    #[default]
    Area,
    /// Bilinear (triangle) filtering.
    Bilinear,
    /// Bicubic (Catmull-Rom) filtering.
    Bicubic,
    /// Lanczos filtering with a window of 3.
    Lanczos,
}

impl FromStr for Interpolation {
    type Err = PixelGridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" | "point" => Ok(Interpolation::Nearest),
            "area" | "box" => Ok(Interpolation::Area),
            "bilinear" | "linear" | "triangle" => Ok(Interpolation::Bilinear),
            "bicubic" | "cubic" => Ok(Interpolation::Bicubic),
            "lanczos" | "lanczos3" => Ok(Interpolation::Lanczos),
            _ => Err(PixelGridError::InvalidInterpolation(value.to_string())),
        }
    }
}

/// Periodic frame-skip policy.
///
/// With `Periodic { period, amount }`, whenever the decode position `p`
/// satisfies `p % period == period - 1`, the cursor jumps forward by
/// `amount` frames before the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSkip {
    /// Read every frame. This is the default.
    #[default]
    Disabled,
    /// Skip `amount` frames each time the position hits the trigger.
    Periodic {
        /// Trigger period, must be greater than zero.
        period: u64,
        /// Number of frames jumped over per trigger.
        amount: u64,
    },
}

impl FrameSkip {
    /// Shorthand for [`FrameSkip::Periodic`].
    pub fn periodic(period: u64, amount: u64) -> Self {
        FrameSkip::Periodic { period, amount }
    }

    /// Where the cursor should jump to before reading at `position`, if the
    /// skip rule fires there.
    pub fn jump_from(self, position: u64) -> Option<u64> {
        match self {
            FrameSkip::Periodic { period, amount }
                if period > 0 && amount > 0 && position % period == period - 1 =>
            {
                Some(position.saturating_add(amount))
            }
            _ => None,
        }
    }
}

/// Settings for one video-to-grid conversion.
///
/// All fields have defaults except the grid size. See the
/// [module documentation](self) for an example.
#[derive(Clone)]
pub struct ConversionOptions {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) channel: Channel,
    pub(crate) interpolation: Interpolation,
    pub(crate) frame_skip: FrameSkip,
    pub(crate) transform: ValueTransform,
    /// Stop after this many emitted frames.
    pub(crate) max_frames: Option<u64>,
    /// Yield decode failures as errors instead of ending the stream.
    pub(crate) strict_decoding: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// How often the progress callback fires (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ConversionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConversionOptions")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channel", &self.channel)
            .field("interpolation", &self.interpolation)
            .field("frame_skip", &self.frame_skip)
            .field("transform", &self.transform)
            .field("max_frames", &self.max_frames)
            .field("strict_decoding", &self.strict_decoding)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl ConversionOptions {
    /// Create options for a `width` x `height` output grid.
    ///
    /// Defaults: red channel, area interpolation, no frame skipping,
    /// identity transform, no frame limit, lenient decoding, no progress
    /// reporting.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channel: Channel::default(),
            interpolation: Interpolation::default(),
            frame_skip: FrameSkip::default(),
            transform: ValueTransform::default(),
            max_frames: None,
            strict_decoding: false,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the sampled color channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Set the resize interpolation policy.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the frame-skip policy.
    #[must_use]
    pub fn with_frame_skip(mut self, frame_skip: FrameSkip) -> Self {
        self.frame_skip = frame_skip;
        self
    }

    /// Set the per-pixel value transform.
    #[must_use]
    pub fn with_transform(mut self, transform: ValueTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Stop after `max_frames` frames have been emitted.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// When `true`, a decode failure mid-stream aborts the conversion
    /// instead of being treated as the end of the video.
    #[must_use]
    pub fn with_strict_decoding(mut self, strict: bool) -> Self {
        self.strict_decoding = strict;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Output grid width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output grid height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sampled channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Resize policy.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Frame-skip policy.
    pub fn frame_skip(&self) -> FrameSkip {
        self.frame_skip
    }

    /// Value transform.
    pub fn transform(&self) -> &ValueTransform {
        &self.transform
    }

    /// Check the values that do not depend on the source video.
    ///
    /// # Errors
    ///
    /// - [`PixelGridError::InvalidGridSize`] if either grid dimension is zero.
    /// - [`PixelGridError::InvalidSkipPeriod`] if frame skipping is enabled
    ///   with a period of zero.
    pub fn validate(&self) -> Result<(), PixelGridError> {
        if self.width == 0 || self.height == 0 {
            return Err(PixelGridError::InvalidGridSize {
                width: self.width,
                height: self.height,
            });
        }
        if let FrameSkip::Periodic { period: 0, .. } = self.frame_skip {
            return Err(PixelGridError::InvalidSkipPeriod);
        }
        Ok(())
    }

    /// Require `width / height == source_width / source_height` exactly.
    ///
    /// The comparison cross-multiplies in integers, so `8x6` matches
    /// `640x480` but not `641x480`.
    ///
    /// # Errors
    ///
    /// - [`PixelGridError::InvalidSourceDimensions`] if the source reports a
    ///   zero dimension.
    /// - [`PixelGridError::AspectRatioMismatch`] if the ratios differ.
    pub fn check_aspect_ratio(
        &self,
        source_width: u32,
        source_height: u32,
    ) -> Result<(), PixelGridError> {
        if source_width == 0 || source_height == 0 {
            return Err(PixelGridError::InvalidSourceDimensions {
                width: source_width,
                height: source_height,
            });
        }

        let grid = u64::from(self.width) * u64::from(source_height);
        let source = u64::from(self.height) * u64::from(source_width);
        if grid != source {
            return Err(PixelGridError::AspectRatioMismatch {
                grid_width: self.width,
                grid_height: self.height,
                source_width,
                source_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ConversionOptions::new(8, 6);
        assert_eq!(options.channel(), Channel::Red);
        assert_eq!(options.interpolation(), Interpolation::Area);
        assert_eq!(options.frame_skip(), FrameSkip::Disabled);
        assert!(matches!(options.transform(), ValueTransform::Identity));
        let debug = format!("{options:?}");
        assert!(debug.contains("batch_size: 1"));
        assert!(debug.contains("strict_decoding: false"));
    }

    #[test]
    fn batch_size_clamps_zero() {
        let options = ConversionOptions::new(8, 6).with_batch_size(0);
        assert!(format!("{options:?}").contains("batch_size: 1"));
    }

    #[test]
    fn aspect_ratio_exact_match() {
        let options = ConversionOptions::new(8, 6);
        assert!(options.check_aspect_ratio(8, 6).is_ok());
        assert!(options.check_aspect_ratio(640, 480).is_ok());
        assert!(options.check_aspect_ratio(1024, 768).is_ok());
    }

    #[test]
    fn aspect_ratio_mismatch() {
        let options = ConversionOptions::new(8, 6);
        assert!(matches!(
            options.check_aspect_ratio(1920, 1080),
            Err(PixelGridError::AspectRatioMismatch { .. })
        ));
        assert!(matches!(
            options.check_aspect_ratio(641, 480),
            Err(PixelGridError::AspectRatioMismatch { .. })
        ));
    }

    #[test]
    fn aspect_ratio_rejects_empty_source() {
        let options = ConversionOptions::new(8, 6);
        assert!(matches!(
            options.check_aspect_ratio(0, 0),
            Err(PixelGridError::InvalidSourceDimensions { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_grid_and_period() {
        assert!(matches!(
            ConversionOptions::new(0, 6).validate(),
            Err(PixelGridError::InvalidGridSize { .. })
        ));
        assert!(matches!(
            ConversionOptions::new(8, 6)
                .with_frame_skip(FrameSkip::periodic(0, 1))
                .validate(),
            Err(PixelGridError::InvalidSkipPeriod)
        ));
    }

    #[test]
    fn skip_rule_fires_at_period_end() {
        let skip = FrameSkip::periodic(3, 1);
        assert_eq!(skip.jump_from(0), None);
        assert_eq!(skip.jump_from(1), None);
        assert_eq!(skip.jump_from(2), Some(3));
        assert_eq!(skip.jump_from(5), Some(6));
        assert_eq!(FrameSkip::Disabled.jump_from(2), None);
        assert_eq!(FrameSkip::periodic(1, 2).jump_from(0), Some(2));
    }

    #[test]
    fn channel_parsing() {
        assert_eq!("0".parse::<Channel>().ok(), Some(Channel::Red));
        assert_eq!("green".parse::<Channel>().ok(), Some(Channel::Green));
        assert_eq!("B".parse::<Channel>().ok(), Some(Channel::Blue));
        assert!("3".parse::<Channel>().is_err());
        assert_eq!(Channel::from_index(2), Some(Channel::Blue));
        assert_eq!(Channel::Green.index(), 1);
    }

    #[test]
    fn interpolation_parsing() {
        assert_eq!("AREA".parse::<Interpolation>().ok(), Some(Interpolation::Area));
        assert_eq!("nearest".parse::<Interpolation>().ok(), Some(Interpolation::Nearest));
        assert_eq!("cubic".parse::<Interpolation>().ok(), Some(Interpolation::Bicubic));
        assert!("sinc".parse::<Interpolation>().is_err());
    }
}
