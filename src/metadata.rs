//! Video stream metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoSource`](crate::VideoSource)
//! is opened and cached for the lifetime of the source.

use std::time::Duration;

/// Metadata for the video stream frames are sampled from.
///
/// # Example
///
/// ```no_run
/// use vid2frames::VideoSource;
///
/// let source = VideoSource::open("input.mp4")?;
/// let metadata = source.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// # Ok::<(), vid2frames::FrameExtractError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Container duration. [`Duration::ZERO`] when the container does not
    /// report one.
    pub duration: Duration,
    /// Timestamp of the first frame on the stream's own clock. Sample
    /// positions and [`DecodedFrame::timestamp`](crate::DecodedFrame) are
    /// measured from here.
    pub start_time: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Index of the stream inside the container.
    pub stream_index: usize,
}

impl VideoMetadata {
    /// Estimate how many samples an extraction at `interval` will produce.
    ///
    /// Returns `None` if the duration is unknown or `interval` is zero.
    pub fn estimated_samples(&self, interval: Duration) -> Option<u64> {
        crate::conversion::estimated_samples(self.duration, interval)
    }
}
