//! Error types for the `vid2frames` crate.
//!
//! [`FrameExtractError`] is returned by every fallible operation. Reaching
//! the end of the video is not an error: the extraction loop reports it
//! through [`Termination`](crate::Termination) instead.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vid2frames` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameExtractError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`VideoSource::open`](crate::VideoSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A sampling interval of zero was requested.
    #[error("Sampling interval must be greater than zero")]
    InvalidInterval,

    /// The target directory could not be created or is not a directory.
    #[error("Cannot use output directory {path}: {source}")]
    OutputDirectory {
        /// The directory that was requested.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: IoError,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing a frame.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// The `image` crate failed to encode a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FrameExtractError {
    fn from(error: FfmpegError) -> Self {
        FrameExtractError::FfmpegError(error.to_string())
    }
}
