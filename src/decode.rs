//! FFmpeg-backed decode cursor.
//!
//! [`DecodeCursor`] reads and decodes just enough packets to produce the
//! next frame on each [`read`](FrameCursor::read), converting it to packed
//! RGB at source resolution. Nothing is buffered beyond the decoder's own
//! queue.
//!
//! Short forward jumps (the common frame-skip case) are served by decoding
//! and discarding frames, which is exact. Backward or long jumps seek the
//! container to the keyframe before the target and discard decoded frames
//! until the target's presentation timestamp is reached.
//!
//! # Example
//!
//! ```no_run
//! use pixelgrid::{FrameCursor, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let mut cursor = video.cursor()?;
//! while let Some(frame) = cursor.read()? {
//!     println!("frame {} is {}x{}", cursor.position() - 1, frame.width(), frame.height());
//! }
//! # Ok::<(), pixelgrid::PixelGridError>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    cursor::FrameCursor,
    error::PixelGridError,
    utilities::{
        frame_number_to_seek_timestamp, frame_to_rgb_buffer, pts_to_frame_number, pts_to_seconds,
        stream_start_pts,
    },
    video_file::VideoFile,
};

/// Forward jumps up to this many frames are decoded instead of seeking.
const DECODE_AHEAD_LIMIT: u64 = 64;

/// A [`FrameCursor`] decoding the best video stream of a [`VideoFile`].
///
/// The cursor borrows the file mutably; dropping it releases the decoder.
/// Created via [`VideoFile::cursor`].
pub struct DecodeCursor<'a> {
    video: &'a mut VideoFile,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    /// PTS of the stream's first frame; frame numbers count from here.
    start_pts: i64,
    frames_per_second: f64,
    width: u32,
    height: u32,
    frame_count: u64,
    /// Frame number the next decoded frame is expected to carry.
    position: u64,
    /// After a container seek, frames before this number are dropped.
    discard_before: Option<u64>,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
}

impl<'a> DecodeCursor<'a> {
    pub(crate) fn new(video: &'a mut VideoFile) -> Result<Self, PixelGridError> {
        let video_stream_index = video
            .video_stream_index
            .ok_or(PixelGridError::NoVideoStream)?;
        let metadata = video
            .metadata
            .video
            .as_ref()
            .ok_or(PixelGridError::NoVideoStream)?;
        let frames_per_second = metadata.frames_per_second;
        let frame_count = metadata.frame_count;

        let (decoder, time_base, start_pts) = {
            let stream = video
                .input_context
                .stream(video_stream_index)
                .ok_or(PixelGridError::NoVideoStream)?;
            let decoder_context = CodecContext::from_parameters(stream.parameters())?;
            (
                decoder_context.decoder().video()?,
                stream.time_base(),
                stream_start_pts(stream.start_time()),
            )
        };

        if video.demuxed {
            log::debug!("Rewinding {} for a new cursor", video.file_path.display());
            video.input_context.seek(0, ..0)?;
            video.demuxed = false;
        }

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(PixelGridError::InvalidSourceDimensions { width, height });
        }

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Creating DecodeCursor (stream={}, {}x{})",
            video_stream_index,
            width,
            height
        );

        Ok(Self {
            video,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            start_pts,
            frames_per_second,
            width,
            height,
            frame_count,
            position: 0,
            discard_before: None,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
        })
    }

    /// Decode the next frame into `decoded_frame`.
    ///
    /// Returns `false` once the decoder is drained.
    fn advance(&mut self) -> Result<bool, PixelGridError> {
        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let frame_number = match (self.discard_before, self.decoded_frame.pts()) {
                    (Some(_), Some(pts)) => {
                        pts_to_frame_number(pts, self.start_pts, self.time_base, self.frames_per_second)
                    }
                    _ => self.position,
                };

                if let Some(target) = self.discard_before {
                    if frame_number < target {
                        continue;
                    }
                    self.discard_before = None;
                }

                self.position = frame_number + 1;
                return Ok(true);
            }

            if self.eof_sent {
                return Ok(false);
            }

            let mut packet = Packet::empty();
            self.video.demuxed = true;
            match packet.read(&mut self.video.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder.send_packet(&packet).map_err(|error| {
                            PixelGridError::VideoDecodeError(format!(
                                "packet near frame {} rejected: {error}",
                                self.position
                            ))
                        })?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    return Err(PixelGridError::VideoDecodeError(format!(
                        "read failed near frame {}: {error}",
                        self.position
                    )));
                }
            }
        }
    }

    fn convert_current_frame(&mut self) -> Result<RgbImage, PixelGridError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = frame_to_rgb_buffer(&self.rgb_frame, self.width, self.height);
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            PixelGridError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn decode_forward_to(&mut self, target: u64) -> Result<(), PixelGridError> {
        while self.position < target {
            if !self.advance()? {
                self.position = target;
                break;
            }
        }
        Ok(())
    }

    /// Seek the container to the keyframe at or before `target`.
    fn seek_container(&mut self, target: u64) -> Result<(), PixelGridError> {
        let timestamp = frame_number_to_seek_timestamp(
            target,
            self.frames_per_second,
            pts_to_seconds(self.start_pts, self.time_base),
        );
        self.video.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        Ok(())
    }
}

impl FrameCursor for DecodeCursor<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count_hint(&self) -> Option<u64> {
        (self.frame_count > 0).then_some(self.frame_count)
    }

    fn frames_per_second(&self) -> Option<f64> {
        (self.frames_per_second > 0.0).then_some(self.frames_per_second)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, target: u64) -> Result<(), PixelGridError> {
        if target == self.position {
            return Ok(());
        }

        if target > self.position
            && (target - self.position <= DECODE_AHEAD_LIMIT || self.frames_per_second <= 0.0)
        {
            log::debug!("Decoding forward from frame {} to {}", self.position, target);
            return self.decode_forward_to(target);
        }

        if self.frames_per_second <= 0.0 {
            // No frame rate to map PTS to frame numbers: rewind and count.
            log::debug!("Rewinding to frame 0 to reach frame {target}");
            self.seek_container(0)?;
            self.discard_before = None;
            self.position = 0;
            return self.decode_forward_to(target);
        }

        log::debug!("Seeking container from frame {} to {}", self.position, target);
        self.seek_container(target)?;
        self.discard_before = Some(target);
        self.position = target;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<RgbImage>, PixelGridError> {
        if !self.advance()? {
            return Ok(None);
        }
        self.convert_current_frame().map(Some)
    }
}
