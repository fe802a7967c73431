//! Interval sampling of a video into numbered JPEG files.
//!
//! [`FrameExtractor`] asks its [`FrameSource`] for the frame at
//! `index * interval` for `index = 0, 1, 2, ...` and hands each one to a
//! [`FrameSink`] until the source runs out. The number of frames written
//! and the reason the loop stopped are returned as an
//! [`ExtractionSummary`].

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    time::Duration,
};

use crate::{
    conversion::{estimated_samples, sample_position},
    error::FrameExtractError,
    options::ExtractOptions,
    output::{FrameDirectory, FrameSink},
    progress::ProgressTracker,
    source::{FrameSource, VideoSource},
};

/// Why the sampling loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Termination {
    /// No frame exists at or after the next sample position.
    Exhausted,
    /// The decoder failed. Frames written before the failure are kept.
    DecodeFailed(String),
    /// The source reported itself closed before the next sample.
    SourceClosed,
    /// The cancellation token fired.
    Cancelled,
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Termination::Exhausted => f.write_str("end of stream"),
            Termination::DecodeFailed(reason) => write!(f, "decode failed: {reason}"),
            Termination::SourceClosed => f.write_str("source closed"),
            Termination::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Outcome of an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ExtractionSummary {
    /// Frames written, named `frame0.jpg` through `frame{frame_count - 1}.jpg`.
    pub frame_count: u64,
    /// Sampling interval that was used.
    pub interval: Duration,
    /// Presentation timestamp of the last frame written.
    pub last_frame_timestamp: Option<Duration>,
    /// Why the loop stopped.
    pub termination: Termination,
}

impl ExtractionSummary {
    /// `true` if the loop ran until the end of the video.
    pub fn reached_end(&self) -> bool {
        self.termination == Termination::Exhausted
    }
}

/// Samples a video at a fixed interval.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use vid2frames::FrameExtractor;
///
/// let summary = FrameExtractor::new(Duration::from_millis(1000))
///     .extract("input.mp4", "frames")?;
/// println!("Extracted {} frames", summary.frame_count);
/// # Ok::<(), vid2frames::FrameExtractError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    interval: Duration,
    options: ExtractOptions,
}

impl FrameExtractor {
    /// Sample one frame every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            options: ExtractOptions::default(),
        }
    }

    /// Sample one frame every `milliseconds`.
    pub fn from_millis(milliseconds: u64) -> Self {
        Self::new(Duration::from_millis(milliseconds))
    }

    /// Replace the progress and cancellation settings.
    #[must_use]
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Extract frames from the video at `source_path` into `target_dir`.
    ///
    /// `target_dir` is created if it does not exist. Existing files are left
    /// in place; `frame<N>.jpg` files from an earlier run are overwritten.
    ///
    /// # Errors
    ///
    /// - [`FrameExtractError::InvalidInterval`] for a zero interval, before
    ///   anything touches the file system.
    /// - [`FrameExtractError::OutputDirectory`] if `target_dir` cannot be
    ///   used.
    /// - [`FrameExtractError::FileOpen`] / [`FrameExtractError::NoVideoStream`]
    ///   if the video cannot be opened.
    /// - [`FrameExtractError::ImageError`] / [`FrameExtractError::IoError`] if
    ///   a frame cannot be written.
    ///
    /// A decoder failure mid-stream is not an error; see
    /// [`Termination::DecodeFailed`].
    pub fn extract<S: AsRef<Path>, T: AsRef<Path>>(
        &self,
        source_path: S,
        target_dir: T,
    ) -> Result<ExtractionSummary, FrameExtractError> {
        if self.interval.is_zero() {
            return Err(FrameExtractError::InvalidInterval);
        }

        let mut sink = FrameDirectory::create(target_dir)?;
        let mut source = VideoSource::open(source_path)?;

        let summary = self.run(&mut source, &mut sink)?;

        log::info!(
            "Extracted {} frame(s) from {} into {} ({})",
            summary.frame_count,
            source.path().display(),
            sink.path().display(),
            summary.termination,
        );
        source.release();

        Ok(summary)
    }

    /// Run the sampling loop over any source and sink.
    ///
    /// The caller keeps ownership of both and is responsible for releasing
    /// the source afterwards.
    ///
    /// # Errors
    ///
    /// [`FrameExtractError::InvalidInterval`] for a zero interval, or the
    /// first error returned by `sink`.
    pub fn run<Src, Snk>(
        &self,
        source: &mut Src,
        sink: &mut Snk,
    ) -> Result<ExtractionSummary, FrameExtractError>
    where
        Src: FrameSource + ?Sized,
        Snk: FrameSink + ?Sized,
    {
        if self.interval.is_zero() {
            return Err(FrameExtractError::InvalidInterval);
        }

        let total = source
            .duration()
            .and_then(|duration| estimated_samples(duration, self.interval));
        let mut tracker =
            ProgressTracker::new(self.options.progress.clone(), total, self.options.batch_size);

        let mut count = 0_u64;
        let mut last_frame_timestamp = None;

        let termination = loop {
            if !source.is_open() {
                break Termination::SourceClosed;
            }
            if self.options.is_cancelled() {
                log::debug!("Extraction cancelled after {count} frame(s)");
                break Termination::Cancelled;
            }

            let Some(position) = sample_position(count, self.interval) else {
                break Termination::Exhausted;
            };

            if let Err(error) = source.seek(position) {
                log::warn!("Seek to {:.3}s failed: {error}", position.as_secs_f64());
                break Termination::DecodeFailed(error.to_string());
            }

            match source.decode() {
                Ok(Some(frame)) => {
                    let path = sink.write_frame(count, &frame.image)?;
                    log::debug!(
                        "Wrote sample {count} (requested {:.3}s, got {:.3}s) to {}",
                        position.as_secs_f64(),
                        frame.timestamp.as_secs_f64(),
                        path.display(),
                    );
                    last_frame_timestamp = Some(frame.timestamp);
                    tracker.advance(count, position);
                    count += 1;
                }
                Ok(None) => break Termination::Exhausted,
                Err(error) => {
                    log::warn!(
                        "Decoding at {:.3}s failed, stopping after {count} frame(s): {error}",
                        position.as_secs_f64(),
                    );
                    break Termination::DecodeFailed(error.to_string());
                }
            }
        };

        tracker.finish();

        Ok(ExtractionSummary {
            frame_count: count,
            interval: self.interval,
            last_frame_timestamp,
            termination,
        })
    }
}
