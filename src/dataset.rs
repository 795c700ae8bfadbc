//! Loader for the MNIST IDX files.
//!
//! Reads the four standard `*-ubyte` files from a data directory and exposes
//! each split as flat `f32` feature rows in `[0, 1]` paired with one-hot
//! label rows, which is the shape the classifier and the inspection
//! workflow both consume.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Feature vector length of one 28x28 image.
pub const IMAGE_LEN: usize = 784;
/// Number of digit classes.
pub const NUM_CLASSES: usize = 10;
/// Image side length in pixels.
pub const IMAGE_SIDE: usize = 28;

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// An IDX file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file does not start with the expected IDX magic number.
    #[error("{path} is not an IDX file (magic {found}, expected {expected})")]
    BadMagic {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    /// The file ends before the header-declared payload.
    #[error("{path} is truncated: expected {expected} payload bytes, found {found}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    /// The images are not 28x28.
    #[error("{path} holds {rows}x{cols} images, expected {side}x{side}", side = IMAGE_SIDE)]
    BadShape {
        path: PathBuf,
        rows: usize,
        cols: usize,
    },
    /// A label byte is outside the digit range.
    #[error("{path} holds label {value}, expected 0-{max}", max = NUM_CLASSES - 1)]
    BadLabel { path: PathBuf, value: u8 },
    /// The image and label files disagree on the sample count.
    #[error("Split mismatch in {dir}: {images} images vs {labels} labels")]
    CountMismatch {
        dir: PathBuf,
        images: usize,
        labels: usize,
    },
}

/// One dataset split: feature rows paired with one-hot label rows.
#[derive(Debug, Clone)]
pub struct LabeledSplit {
    /// Rows of [`IMAGE_LEN`] pixel values scaled to `[0, 1]`.
    pub images: Vec<Vec<f32>>,
    /// Rows of [`NUM_CLASSES`] values with exactly one entry set to 1.
    pub labels: Vec<Vec<f32>>,
}

impl LabeledSplit {
    /// Number of samples in the split.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the split holds no samples.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Train and test splits loaded from one data directory.
#[derive(Debug, Clone)]
pub struct MnistData {
    /// Training split.
    pub train: LabeledSplit,
    /// Held-out test split.
    pub test: LabeledSplit,
}

/// Load both MNIST splits from `dir`.
pub fn load_mnist(dir: &Path) -> Result<MnistData, DatasetError> {
    let train = load_split(dir, TRAIN_IMAGES, TRAIN_LABELS)?;
    let test = load_split(dir, TEST_IMAGES, TEST_LABELS)?;
    Ok(MnistData { train, test })
}

/// Build a one-hot row for a digit label.
pub fn one_hot(label: usize) -> Vec<f32> {
    let mut row = vec![0.0; NUM_CLASSES];
    if label < NUM_CLASSES {
        row[label] = 1.0;
    }
    row
}

fn load_split(dir: &Path, images_name: &str, labels_name: &str) -> Result<LabeledSplit, DatasetError> {
    let images = read_images(&dir.join(images_name))?;
    let labels = read_labels(&dir.join(labels_name))?;
    if images.len() != labels.len() {
        return Err(DatasetError::CountMismatch {
            dir: dir.to_path_buf(),
            images: images.len(),
            labels: labels.len(),
        });
    }
    Ok(LabeledSplit { images, labels })
}

fn read_images(path: &Path) -> Result<Vec<Vec<f32>>, DatasetError> {
    let bytes = read_file(path)?;
    let (header, payload) = split_header(path, &bytes, 16)?;
    let magic = read_u32_be(header, 0);
    if magic != IMAGES_MAGIC {
        return Err(DatasetError::BadMagic {
            path: path.to_path_buf(),
            found: magic,
            expected: IMAGES_MAGIC,
        });
    }
    let count = read_u32_be(header, 4) as usize;
    let rows = read_u32_be(header, 8) as usize;
    let cols = read_u32_be(header, 12) as usize;
    if rows != IMAGE_SIDE || cols != IMAGE_SIDE {
        return Err(DatasetError::BadShape {
            path: path.to_path_buf(),
            rows,
            cols,
        });
    }
    let expected = count * IMAGE_LEN;
    if payload.len() < expected {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected,
            found: payload.len(),
        });
    }

    let mut out = Vec::with_capacity(count);
    for chunk in payload[..expected].chunks_exact(IMAGE_LEN) {
        out.push(chunk.iter().map(|&b| f32::from(b) / 255.0).collect());
    }
    Ok(out)
}

fn read_labels(path: &Path) -> Result<Vec<Vec<f32>>, DatasetError> {
    let bytes = read_file(path)?;
    let (header, payload) = split_header(path, &bytes, 8)?;
    let magic = read_u32_be(header, 0);
    if magic != LABELS_MAGIC {
        return Err(DatasetError::BadMagic {
            path: path.to_path_buf(),
            found: magic,
            expected: LABELS_MAGIC,
        });
    }
    let count = read_u32_be(header, 4) as usize;
    if payload.len() < count {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected: count,
            found: payload.len(),
        });
    }

    let mut out = Vec::with_capacity(count);
    for &value in &payload[..count] {
        if usize::from(value) >= NUM_CLASSES {
            return Err(DatasetError::BadLabel {
                path: path.to_path_buf(),
                value,
            });
        }
        out.push(one_hot(usize::from(value)));
    }
    Ok(out)
}

fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    std::fs::read(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn split_header<'a>(
    path: &Path,
    bytes: &'a [u8],
    header_len: usize,
) -> Result<(&'a [u8], &'a [u8]), DatasetError> {
    if bytes.len() < header_len {
        return Err(DatasetError::Truncated {
            path: path.to_path_buf(),
            expected: header_len,
            found: bytes.len(),
        });
    }
    Ok(bytes.split_at(header_len))
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(
        bytes[offset..offset + 4]
            .try_into()
            .expect("offset range verified"),
    )
}
