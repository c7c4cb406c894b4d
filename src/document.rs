//! The output document and its JSON encoding.
//!
//! An [`OutputDocument`] is an ordered list of [`FrameGrid`]s; each grid is
//! `height` rows of `width` transformed channel values. The document is built
//! in memory first and serialized in one pass with `serde_json`, using
//! [`GridFormatter`] for the layout: one frame per tab-indented block and one
//! row per line.
//!
//! ```text
//! [
//! 	[
//! 		[255,255,255,255],
//! 		[255,255,255,255]
//! 	]
//! ]
//! ```

use std::{fs, io, path::Path};

use image::RgbImage;
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::{configuration::Channel, error::PixelGridError, transform::ValueTransform};

/// One frame's sampled values, indexed `[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrameGrid {
    rows: Vec<Vec<i64>>,
}

impl FrameGrid {
    /// Rows of the grid, top to bottom.
    pub fn rows(&self) -> &[Vec<i64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Value at `row`, `column`.
    pub fn get(&self, row: usize, column: usize) -> Option<i64> {
        self.rows.get(row).and_then(|values| values.get(column)).copied()
    }
}

/// Sample `channel` of every pixel in `frame` and map it through `transform`.
///
/// The grid has one row per pixel row of `frame` and one value per pixel in
/// that row.
pub fn extract_grid(frame: &RgbImage, channel: Channel, transform: &ValueTransform) -> FrameGrid {
    let component = channel.index();
    let rows = frame
        .rows()
        .map(|row| row.map(|pixel| transform.apply(pixel[component])).collect())
        .collect();
    FrameGrid { rows }
}

/// Ordered per-frame grids of one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputDocument {
    frames: Vec<FrameGrid>,
}

impl OutputDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame.
    pub fn push(&mut self, grid: FrameGrid) {
        self.frames.push(grid);
    }

    /// Frames in output order.
    pub fn frames(&self) -> &[FrameGrid] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when no frame was emitted.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Serialize to the grid layout, followed by a newline.
    ///
    /// An empty document serializes as `[]`.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, PixelGridError> {
        let mut serializer =
            serde_json::Serializer::with_formatter(Vec::new(), GridFormatter::new());
        self.serialize(&mut serializer)?;
        let mut bytes = serializer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Serialize to a `String`. See [`to_json_bytes`](Self::to_json_bytes).
    pub fn to_json_string(&self) -> Result<String, PixelGridError> {
        let bytes = self.to_json_bytes()?;
        // serde_json only emits UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write the whole document to `path` in one step, replacing any
    /// existing file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), PixelGridError> {
        let path = path.as_ref();
        let bytes = self.to_json_bytes()?;
        log::debug!(
            "Writing {} frame(s), {} bytes to {}",
            self.frames.len(),
            bytes.len(),
            path.display()
        );
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// Depth of the innermost (row) arrays, whose values stay on one line.
const ROW_DEPTH: usize = 3;

/// A [`serde_json`] formatter for nested integer grids.
///
/// Arrays shallower than [`ROW_DEPTH`] place each element on its own line,
/// indented with one tab per level; row arrays are written compactly.
#[derive(Debug, Default)]
pub struct GridFormatter {
    depth: usize,
    has_value: bool,
}

impl GridFormatter {
    /// Create a formatter at depth zero.
    pub fn new() -> Self {
        Self::default()
    }
}

fn indent<W: ?Sized + io::Write>(writer: &mut W, depth: usize) -> io::Result<()> {
    for _ in 0..depth {
        writer.write_all(b"\t")?;
    }
    Ok(())
}

impl Formatter for GridFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let closing = self.depth;
        self.depth -= 1;
        if closing < ROW_DEPTH && self.has_value {
            writer.write_all(b"\n")?;
            indent(writer, self.depth)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if self.depth >= ROW_DEPTH {
            if !first {
                writer.write_all(b",")?;
            }
            return Ok(());
        }
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        indent(writer, self.depth)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    fn gradient() -> RgbImage {
        let mut frame = RgbImage::new(3, 2);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let base = (y * 3 + x) as u8;
            *pixel = Rgb([base, base + 100, base + 200]);
        }
        frame
    }

    #[test]
    fn grid_is_row_major() {
        let grid = extract_grid(&gradient(), Channel::Red, &ValueTransform::Identity);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.rows(), &[vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn channel_selects_component() {
        let frame = gradient();
        let green = extract_grid(&frame, Channel::Green, &ValueTransform::Identity);
        let blue = extract_grid(&frame, Channel::Blue, &ValueTransform::Identity);
        assert_eq!(green.get(1, 2), Some(105));
        assert_eq!(blue.get(0, 0), Some(200));
        assert_eq!(blue.get(2, 0), None);
    }

    #[test]
    fn transform_is_applied_per_value() {
        let grid = extract_grid(&gradient(), Channel::Red, &ValueTransform::Invert);
        assert_eq!(grid.rows(), &[vec![255, 254, 253], vec![252, 251, 250]]);
    }

    #[test]
    fn layout_matches_tab_indented_blocks() {
        let mut document = OutputDocument::new();
        let frame = RgbImage::from_pixel(2, 2, Rgb([7, 0, 0]));
        document.push(extract_grid(&frame, Channel::Red, &ValueTransform::Identity));
        document.push(extract_grid(&frame, Channel::Green, &ValueTransform::Identity));

        let text = document.to_json_string().unwrap();
        let expected = "[\n\t[\n\t\t[7,7],\n\t\t[7,7]\n\t],\n\t[\n\t\t[0,0],\n\t\t[0,0]\n\t]\n]\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_document_is_empty_array() {
        let text = OutputDocument::new().to_json_string().unwrap();
        assert_eq!(text, "[]\n");
        let parsed: Vec<Vec<Vec<i64>>> = serde_json::from_str(&text).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn output_parses_back_as_nested_arrays() {
        let mut document = OutputDocument::new();
        document.push(extract_grid(&gradient(), Channel::Red, &ValueTransform::Identity));
        let parsed: Vec<Vec<Vec<i64>>> =
            serde_json::from_slice(&document.to_json_bytes().unwrap()).unwrap();
        assert_eq!(parsed, vec![vec![vec![0, 1, 2], vec![3, 4, 5]]]);
    }

    #[test]
    fn write_replaces_existing_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("result.json");
        fs::write(&path, "stale content that is much longer than the output").unwrap();

        OutputDocument::new().write(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    }
}
