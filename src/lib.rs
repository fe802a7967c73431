//! # vid2frames
//!
//! Sample still frames from a video at a fixed time interval and store them
//! as `frame0.jpg`, `frame1.jpg`, ... in a target directory.
//!
//! Decoding goes through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate and JPEG
//! encoding through [`image`](https://crates.io/crates/image).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use vid2frames::FrameExtractor;
//!
//! // One frame per second.
//! let summary = FrameExtractor::new(Duration::from_secs(1))
//!     .extract("input.mp4", "frames")?;
//! println!("Extracted {} frames ({})", summary.frame_count, summary.termination);
//! # Ok::<(), vid2frames::FrameExtractError>(())
//! ```
//!
//! ## How sampling works
//!
//! Sample `n` is the first frame whose presentation time is at or after
//! `n * interval`. Extraction stops at the first sample position with no
//! such frame, so a 3 second clip sampled every second yields `frame0.jpg`
//! to `frame2.jpg`, and the same clip sampled every 10 seconds yields only
//! `frame0.jpg`.
//!
//! The loop itself is independent of FFmpeg and the file system: it is
//! driven through the [`FrameSource`] and [`FrameSink`] traits, implemented
//! by [`VideoSource`] and [`FrameDirectory`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

mod conversion;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod metadata;
pub mod options;
pub mod output;
pub mod progress;
pub mod source;

pub use error::FrameExtractError;
pub use extractor::{ExtractionSummary, FrameExtractor, Termination};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use options::ExtractOptions;
pub use output::{FrameDirectory, FrameSink, ensure_directory, frame_file_name};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use source::{DecodedFrame, FrameSource, VideoSource};
