//! Normalization of user-supplied digit images.
//!
//! Mirrors the preprocessing the classifier was trained against: grayscale,
//! hard threshold to black/white, inversion so strokes become hot pixels,
//! and a resize down to the 28x28 input grid. The processed copy is written
//! next to the originals so the user can see what the classifier saw.

use std::path::{Path, PathBuf};

use image::GrayImage;
use image::imageops::FilterType;
use thiserror::Error;

use crate::dataset::{IMAGE_LEN, IMAGE_SIDE};

/// Gray levels above this count as background before inversion.
const THRESHOLD: u8 = 127;

/// Errors raised while normalizing one external image.
#[derive(Debug, Error)]
pub enum ExternalDecodeError {
    /// The file could not be opened or decoded as an image.
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The processed-output directory could not be created.
    #[error("Failed to prepare processed directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The processed copy could not be written.
    #[error("Failed to write processed copy {path}: {source}")]
    WriteProcessed {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// One normalized external image.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// [`IMAGE_LEN`] pixel values in `[0, 1]`, row-major 28x28.
    pub features: Vec<f32>,
    /// Where the processed 28x28 copy was written.
    pub processed_path: PathBuf,
}

/// Decode `path`, normalize it to the classifier's input vector, and write
/// the processed copy into `processed_dir` under the same file name.
pub fn normalize_image(
    path: &Path,
    processed_dir: &Path,
) -> Result<NormalizedImage, ExternalDecodeError> {
    let decoded = image::open(path).map_err(|source| ExternalDecodeError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = decoded.to_luma8();

    // Dark strokes on light background become hot pixels, like the dataset.
    let inverted = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0];
        if value > THRESHOLD {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    });
    let resized = image::imageops::resize(
        &inverted,
        IMAGE_SIDE as u32,
        IMAGE_SIDE as u32,
        FilterType::Nearest,
    );

    std::fs::create_dir_all(processed_dir).map_err(|source| ExternalDecodeError::CreateDir {
        path: processed_dir.to_path_buf(),
        source,
    })?;
    let file_name = path.file_name().unwrap_or_else(|| "image.png".as_ref());
    let processed_path = processed_dir.join(file_name);
    resized
        .save(&processed_path)
        .map_err(|source| ExternalDecodeError::WriteProcessed {
            path: processed_path.clone(),
            source,
        })?;

    let features: Vec<f32> = resized.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();
    debug_assert_eq!(features.len(), IMAGE_LEN);

    Ok(NormalizedImage {
        features,
        processed_path,
    })
}
