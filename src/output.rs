//! Writing side of the extraction loop.
//!
//! Frames are stored as `frame<index>.jpg` directly inside the target
//! directory. Re-running an extraction into the same directory overwrites
//! files with the same index and leaves everything else alone.

use std::{
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageFormat};

use crate::error::FrameExtractError;

/// File name of the frame written for `index`.
///
/// ```
/// assert_eq!(vid2frames::frame_file_name(7), "frame7.jpg");
/// ```
pub fn frame_file_name(index: u64) -> String {
    format!("frame{index}.jpg")
}

/// Make sure `path` exists and is a directory.
///
/// Creates the directory (but not its parents) when it is missing. If it
/// already exists it is reused untouched.
///
/// # Errors
///
/// Returns [`FrameExtractError::OutputDirectory`] when `path` exists but is
/// not a directory, or when creating it fails for any reason other than it
/// having appeared concurrently.
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<(), FrameExtractError> {
    let path = path.as_ref();
    let directory_error = |source: IoError| FrameExtractError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    };

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            log::debug!("Reusing output directory {}", path.display());
            return Ok(());
        }
        Ok(_) => {
            return Err(directory_error(IoError::new(
                ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            )));
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => return Err(directory_error(error)),
    }

    match fs::create_dir(path) {
        Ok(()) => {
            log::debug!("Created output directory {}", path.display());
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(error) => Err(directory_error(error)),
    }
}

/// Destination for extracted frames.
pub trait FrameSink {
    /// Store the frame for sample `index`, returning where it went.
    fn write_frame(&mut self, index: u64, image: &DynamicImage)
    -> Result<PathBuf, FrameExtractError>;
}

/// Writes JPEG frames into a directory.
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    root: PathBuf,
}

impl FrameDirectory {
    /// Ensure `path` exists (see [`ensure_directory`]) and write frames
    /// into it.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, FrameExtractError> {
        ensure_directory(&path)?;
        Ok(Self {
            root: path.as_ref().to_path_buf(),
        })
    }

    /// The directory frames are written to.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Where the frame for `index` is (or would be) stored.
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.root.join(frame_file_name(index))
    }
}

impl FrameSink for FrameDirectory {
    fn write_frame(
        &mut self,
        index: u64,
        image: &DynamicImage,
    ) -> Result<PathBuf, FrameExtractError> {
        let path = self.frame_path(index);
        // The JPEG encoder rejects alpha channels.
        match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
                image.save_with_format(&path, ImageFormat::Jpeg)?
            }
            other => DynamicImage::ImageRgb8(other.to_rgb8())
                .save_with_format(&path, ImageFormat::Jpeg)?,
        }
        Ok(path)
    }
}
