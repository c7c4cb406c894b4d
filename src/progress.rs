//! Progress reporting.
//!
//! Conversions report progress through a [`ProgressCallback`] attached with
//! [`ConversionOptions::with_progress`](crate::ConversionOptions::with_progress).
//! Each report is a [`ProgressInfo`] snapshot.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pixelgrid::{ConversionOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete");
//!         }
//!     }
//! }
//!
//! let options = ConversionOptions::new(8, 6)
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(25);
//! pixelgrid::convert_file("input.mp4", "result.json", &options)?;
//! # Ok::<(), pixelgrid::PixelGridError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A snapshot of conversion progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many frames have been emitted so far.
    pub current: u64,
    /// Frames expected, when the source reports a frame count. This is an
    /// estimate and ignores frame skipping.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the conversion started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Decode position of the most recently emitted frame.
    pub current_frame: Option<u64>,
}

/// Trait for receiving progress updates during a conversion.
///
/// Callbacks observe the run but cannot halt it.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when the run finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one emitted frame and fire the callback if the batch threshold
    /// is reached.
    pub(crate) fn advance(&mut self, frame_number: Option<u64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_number);
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_number: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32 * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                let per_item = elapsed.as_secs_f64() / self.current as f64;
                Duration::from_secs_f64(per_item * remaining as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_number,
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(u64, Option<f32>)>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.seen.lock().unwrap().push((info.current, info.percentage));
        }
    }

    #[test]
    fn reports_every_batch_and_on_finish() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), Some(4), 2);
        for frame in 0..4 {
            tracker.advance(Some(frame));
        }
        tracker.finish();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], (2, Some(50.0)));
        assert_eq!(seen[1], (4, Some(100.0)));
        assert_eq!(seen[2], (4, Some(100.0)));
    }

    #[test]
    fn unknown_total_has_no_percentage() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::new(recorder.clone(), None, 1);
        tracker.advance(None);
        assert_eq!(recorder.seen.lock().unwrap()[0], (1, None));
    }
}
