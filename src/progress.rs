//! Progress reporting and cancellation support.
//!
//! [`ProgressCallback`] observes an extraction as it runs and
//! [`CancellationToken`] stops it cooperatively between samples. Both are
//! attached through [`ExtractOptions`](crate::ExtractOptions).
//!
//! # Example
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use vid2frames::{ExtractOptions, FrameExtractor, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% ({} frames)", info.current);
//!         }
//!     }
//! }
//!
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! FrameExtractor::new(Duration::from_millis(500))
//!     .with_options(options)
//!     .extract("input.mp4", "frames")?;
//! # Ok::<(), vid2frames::FrameExtractError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written so far.
    pub current: u64,
    /// Expected number of frames, estimated from the container duration.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the extraction started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Index of the most recently written frame.
    pub sample_index: Option<u64>,
    /// Position that was requested for that frame.
    pub requested_timestamp: Option<Duration>,
}

/// Receives progress updates during extraction.
///
/// Callbacks observe but cannot halt the loop; use [`CancellationToken`]
/// for that.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when extraction ends.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback that discards everything.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation flag shared between threads.
///
/// The extraction loop checks the token before every sample, so the frame
/// being written when [`cancel`](CancellationToken::cancel) is called is
/// still completed.
///
/// # Example
///
/// ```
/// use vid2frames::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing and fires the callback at the configured cadence.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    since_last_report: u64,
    last_index: Option<u64>,
    last_timestamp: Option<Duration>,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            since_last_report: 0,
            last_index: None,
            last_timestamp: None,
        }
    }

    /// Record one written frame.
    pub(crate) fn advance(&mut self, sample_index: u64, requested: Duration) {
        self.current += 1;
        self.since_last_report += 1;
        self.last_index = Some(sample_index);
        self.last_timestamp = Some(requested);

        if self.since_last_report >= self.batch_size {
            self.report();
            self.since_last_report = 0;
        }
    }

    /// Emit a final report regardless of the batch position.
    pub(crate) fn finish(&mut self) {
        // The estimate may be off by one either way; pin it to the real count.
        self.total = Some(self.current);
        self.report();
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current.min(total) as f32 / total as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                let per_item = elapsed / self.current.min(u32::MAX as u64) as u32;
                per_item * remaining.min(u32::MAX as u64) as u32
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
            sample_index: self.last_index,
            requested_timestamp: self.last_timestamp,
        };

        self.callback.on_progress(&info);
    }
}
