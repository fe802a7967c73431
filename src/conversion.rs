//! Timestamp and pixel-buffer helpers shared by the decoder and the
//! extraction loop.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 plane into a tightly-packed buffer.
///
/// FFmpeg pads rows to its own alignment, so the stride is usually wider
/// than `width * 3`. The result can be handed to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
    for row in 0..(height as usize) {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Position of sample `index` for a given interval, or `None` on overflow.
pub fn sample_position(index: u64, interval: Duration) -> Option<Duration> {
    let index = u32::try_from(index).ok()?;
    interval.checked_mul(index)
}

/// Number of samples an extraction over `duration` at `interval` produces.
/// `None` if either is zero.
///
/// A position equal to the duration has no frame at or after it, so the
/// sample count is `ceil(duration / interval)`.
pub fn estimated_samples(duration: Duration, interval: Duration) -> Option<u64> {
    if duration.is_zero() || interval.is_zero() {
        return None;
    }
    let samples = duration.as_micros().div_ceil(interval.as_micros().max(1));
    Some(u64::try_from(samples).unwrap_or(u64::MAX).max(1))
}

/// Convert a [`Duration`] into a container seek timestamp.
///
/// Container-level seeks (stream index -1) take `AV_TIME_BASE` units,
/// i.e. microseconds.
pub(crate) fn duration_to_seek_timestamp(position: Duration) -> i64 {
    i64::try_from(position.as_micros()).unwrap_or(i64::MAX)
}

/// Timestamp FFmpeg uses for "no value" (`AV_NOPTS_VALUE`).
pub(crate) const NO_TIMESTAMP: i64 = i64::MIN;

/// Rescale a stream timestamp into signed microseconds, rounded to the
/// nearest microsecond.
pub(crate) fn pts_to_micros(pts: i64, time_base: Rational) -> i64 {
    let denominator = time_base.denominator();
    if denominator == 0 {
        return 0;
    }
    let micros = pts as f64 * time_base.numerator() as f64 * 1_000_000.0 / denominator as f64;
    if micros.is_finite() { micros.round() as i64 } else { 0 }
}

/// Maps stream timestamps to positions measured from the start of the
/// video, and back to container seek timestamps.
///
/// Streams do not necessarily start at zero: MPEG-TS and many camera
/// recordings carry an offset. Sample positions are relative to the first
/// frame, stream timestamps are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamClock {
    time_base: Rational,
    start_micros: i64,
}

impl StreamClock {
    /// `start_time` is in `time_base` units; [`NO_TIMESTAMP`] means zero.
    pub(crate) fn new(time_base: Rational, start_time: i64) -> Self {
        let start_micros = if start_time == NO_TIMESTAMP {
            0
        } else {
            pts_to_micros(start_time, time_base)
        };
        Self {
            time_base,
            start_micros,
        }
    }

    /// Offset of the first frame on the stream's own clock. Negative
    /// offsets clamp to zero.
    pub(crate) fn start_time(&self) -> Duration {
        Duration::from_micros(u64::try_from(self.start_micros).unwrap_or(0))
    }

    /// Position of a frame with presentation timestamp `pts`.
    /// Frames before the start clamp to zero.
    pub(crate) fn position(&self, pts: i64) -> Duration {
        let relative = pts_to_micros(pts, self.time_base).saturating_sub(self.start_micros);
        Duration::from_micros(u64::try_from(relative).unwrap_or(0))
    }

    /// Container seek timestamp (`AV_TIME_BASE` units, i.e. microseconds)
    /// for a position measured from the start of the video.
    pub(crate) fn seek_timestamp(&self, position: Duration) -> i64 {
        duration_to_seek_timestamp(position).saturating_add(self.start_micros)
    }
}

/// Frames per second from a rational rate, `0.0` when undefined.
pub(crate) fn rate_to_frames_per_second(rate: Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_positions_are_multiples_of_the_interval() {
        let interval = Duration::from_millis(250);
        assert_eq!(sample_position(0, interval), Some(Duration::ZERO));
        assert_eq!(sample_position(4, interval), Some(Duration::from_secs(1)));
    }

    #[test]
    fn sample_position_overflow_is_none() {
        assert_eq!(sample_position(u64::MAX, Duration::from_millis(1)), None);
        assert_eq!(sample_position(2, Duration::MAX), None);
    }

    #[test]
    fn seek_timestamp_is_microseconds() {
        assert_eq!(duration_to_seek_timestamp(Duration::from_millis(1500)), 1_500_000);
    }

    #[test]
    fn pts_rescales_through_time_base() {
        let time_base = Rational::new(1, 1000);
        assert_eq!(pts_to_micros(2500, time_base), 2_500_000);
        assert_eq!(pts_to_micros(-40, time_base), -40_000);
        assert_eq!(pts_to_micros(10, Rational::new(1, 0)), 0);
        // 3 frames of a 1/3 s time base land exactly on the second.
        assert_eq!(pts_to_micros(3, Rational::new(1, 3)), 1_000_000);
    }

    #[test]
    fn clock_without_start_time_is_absolute() {
        let clock = StreamClock::new(Rational::new(1, 1000), NO_TIMESTAMP);
        assert_eq!(clock.start_time(), Duration::ZERO);
        assert_eq!(clock.position(2500), Duration::from_millis(2500));
        assert_eq!(clock.position(-40), Duration::ZERO);
        assert_eq!(clock.seek_timestamp(Duration::from_secs(1)), 1_000_000);
    }

    #[test]
    fn clock_measures_from_the_stream_start() {
        // MPEG-TS style 90 kHz clock starting at 1.4 s.
        let clock = StreamClock::new(Rational::new(1, 90_000), 126_000);
        assert_eq!(clock.start_time(), Duration::from_millis(1400));

        // The first frame is position zero, the one a second later is 1 s.
        assert_eq!(clock.position(126_000), Duration::ZERO);
        assert_eq!(clock.position(216_000), Duration::from_secs(1));

        // Seeking to 1 s lands on the stream's 2.4 s mark.
        assert_eq!(clock.seek_timestamp(Duration::from_secs(1)), 2_400_000);
        assert_eq!(clock.seek_timestamp(Duration::ZERO), 1_400_000);
    }

    #[test]
    fn negative_start_shifts_positions_forward() {
        // Edit lists can start the stream slightly before zero.
        let clock = StreamClock::new(Rational::new(1, 1000), -80);
        assert_eq!(clock.start_time(), Duration::ZERO);
        assert_eq!(clock.position(-80), Duration::ZERO);
        assert_eq!(clock.position(920), Duration::from_secs(1));
        assert_eq!(clock.seek_timestamp(Duration::from_secs(1)), 920_000);
    }

    #[test]
    fn estimate_matches_samples_written() {
        let second = Duration::from_secs(1);
        // 0, 1, 2; nothing exists at the 3 s mark of a 3 s clip.
        assert_eq!(estimated_samples(Duration::from_secs(3), second), Some(3));
        // 0, 1, 2, 3
        assert_eq!(estimated_samples(Duration::from_millis(3500), second), Some(4));
        assert_eq!(estimated_samples(Duration::from_millis(500), second), Some(1));
        assert_eq!(estimated_samples(Duration::ZERO, second), None);
    }

    #[test]
    fn undefined_rate_is_zero_fps() {
        assert_eq!(rate_to_frames_per_second(Rational::new(25, 1)), 25.0);
        assert_eq!(rate_to_frames_per_second(Rational::new(0, 0)), 0.0);
    }
}
