//! Frame resampling onto the output grid.
//!
//! [`Interpolation::Area`] uses [`image::imageops::thumbnail`], an area
//! average over the source pixels each output cell covers, with partially
//! covered pixels weighted by the covered fraction. The remaining policies
//! go through [`image::imageops::resize`].

use image::{
    RgbImage,
    imageops::{self, FilterType},
};

use crate::configuration::Interpolation;

/// Resize `frame` to exactly `width` x `height`.
///
/// Frames already at the target size are returned unchanged. All three
/// components of every pixel are kept.
pub fn resize_frame(
    frame: &RgbImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> RgbImage {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }

    let filter = match interpolation {
        Interpolation::Area => return imageops::thumbnail(frame, width, height),
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Bilinear => FilterType::Triangle,
        Interpolation::Bicubic => FilterType::CatmullRom,
        Interpolation::Lanczos => FilterType::Lanczos3,
    };
    imageops::resize(frame, width, height, filter)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn same_size_is_untouched() {
        let mut frame = RgbImage::new(2, 2);
        frame.put_pixel(1, 0, Rgb([9, 8, 7]));
        let resized = resize_frame(&frame, 2, 2, Interpolation::Bicubic);
        assert_eq!(resized, frame);
    }

    #[test]
    fn area_averages_whole_blocks() {
        // 4x2 -> 2x1: each output cell averages a 2x2 block.
        let mut frame = RgbImage::new(4, 2);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let value = if x < 2 { 10 * (x + 2 * y) as u8 } else { 200 };
            *pixel = Rgb([value, 0, 255]);
        }
        let resized = resize_frame(&frame, 2, 1, Interpolation::Area);
        // Left block holds 0, 10, 20, 30.
        assert_eq!(resized.get_pixel(0, 0).0, [15, 0, 255]);
        assert_eq!(resized.get_pixel(1, 0).0, [200, 0, 255]);
    }

    #[test]
    fn area_weights_partial_coverage() {
        // 3x1 -> 2x1: each output cell covers 1.5 source pixels.
        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, Rgb([0, 0, 0]));
        frame.put_pixel(1, 0, Rgb([90, 90, 90]));
        frame.put_pixel(2, 0, Rgb([180, 180, 180]));
        let resized = resize_frame(&frame, 2, 1, Interpolation::Area);
        // (0 * 1 + 90 * 0.5) / 1.5 = 30 and (90 * 0.5 + 180 * 1) / 1.5 = 150.
        assert_eq!(resized.get_pixel(0, 0)[0], 30);
        assert_eq!(resized.get_pixel(1, 0)[0], 150);
    }

    #[test]
    fn solid_frames_stay_solid_under_every_policy() {
        let frame = RgbImage::from_pixel(64, 48, Rgb([255, 0, 17]));
        for interpolation in [
            Interpolation::Nearest,
            Interpolation::Area,
            Interpolation::Bilinear,
            Interpolation::Bicubic,
            Interpolation::Lanczos,
        ] {
            let resized = resize_frame(&frame, 8, 6, interpolation);
            assert_eq!(resized.dimensions(), (8, 6));
            for pixel in resized.pixels() {
                assert_eq!(pixel.0, [255, 0, 17], "{interpolation:?}");
            }
        }
    }
}
