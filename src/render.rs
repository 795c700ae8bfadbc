//! Rendering of inspection views.
//!
//! The session only talks to the [`Renderer`] trait; the production
//! implementation writes the sample as an upscaled PNG, hands it to the
//! platform image viewer, and blocks until the user dismisses it.

use std::io::Write;
use std::path::PathBuf;

use image::GrayImage;
use thiserror::Error;
use tracing::warn;

use crate::dataset::{IMAGE_LEN, IMAGE_SIDE};

/// Pixel upscale factor for rendered views.
const UPSCALE: u32 = 12;
/// Upscale factor when the view asks to be presented as large as possible.
const UPSCALE_MAXIMIZED: u32 = 24;

/// One digit image plus captions, ready to display.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitView {
    /// [`IMAGE_LEN`] pixels in `[0, 1]`, row-major 28x28.
    pub pixels: Vec<f32>,
    /// Title line for the view.
    pub title: String,
    /// Caption describing the prediction.
    pub caption: String,
    /// Hint to present the view as large as possible.
    pub maximize: bool,
}

/// Errors raised while displaying a view.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The view does not hold a 28x28 image.
    #[error("View holds {found} pixels, expected {expected}")]
    BadPixelCount { found: usize, expected: usize },
    /// The render directory could not be created.
    #[error("Failed to prepare render directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The rendered PNG could not be written.
    #[error("Failed to write rendered view {path}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
    /// Waiting for the user to dismiss the view failed.
    #[error("Failed to read viewer dismissal: {0}")]
    Dismiss(std::io::Error),
}

/// Blocking display of a [`DigitView`].
pub trait Renderer {
    /// Show the view and return once the user has dismissed it.
    fn show(&mut self, view: &DigitView) -> Result<(), RenderError>;
}

/// Renderer that writes upscaled PNGs and opens the platform image viewer.
pub struct ImageViewer {
    render_dir: PathBuf,
    shown: usize,
}

impl ImageViewer {
    /// Create a viewer that writes rendered views into `render_dir`.
    pub fn new(render_dir: PathBuf) -> Self {
        Self {
            render_dir,
            shown: 0,
        }
    }

    /// Write the view as an upscaled grayscale PNG and return its path.
    fn write_png(&mut self, view: &DigitView) -> Result<PathBuf, RenderError> {
        if view.pixels.len() != IMAGE_LEN {
            return Err(RenderError::BadPixelCount {
                found: view.pixels.len(),
                expected: IMAGE_LEN,
            });
        }
        std::fs::create_dir_all(&self.render_dir).map_err(|source| RenderError::CreateDir {
            path: self.render_dir.clone(),
            source,
        })?;

        let scale = if view.maximize { UPSCALE_MAXIMIZED } else { UPSCALE };
        let side = IMAGE_SIDE as u32;
        let img = GrayImage::from_fn(side * scale, side * scale, |x, y| {
            let col = (x / scale) as usize;
            let row = (y / scale) as usize;
            let value = view.pixels[row * IMAGE_SIDE + col].clamp(0.0, 1.0);
            image::Luma([(value * 255.0) as u8])
        });

        let path = self.render_dir.join(format!("view_{:03}.png", self.shown));
        self.shown += 1;
        img.save(&path).map_err(|source| RenderError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl Renderer for ImageViewer {
    fn show(&mut self, view: &DigitView) -> Result<(), RenderError> {
        let path = self.write_png(view)?;
        if let Err(err) = open::that(&path) {
            warn!("Could not open an image viewer for {}: {err}", path.display());
        }

        println!();
        println!("{}", view.title);
        println!("{}", view.caption);
        println!("Rendered view saved to {}", path.display());
        print!("Press Enter to continue: ");
        std::io::stdout().flush().map_err(RenderError::Dismiss)?;
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(RenderError::Dismiss)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn blank_view(maximize: bool) -> DigitView {
        DigitView {
            pixels: vec![0.5; IMAGE_LEN],
            title: "title".to_string(),
            caption: "caption".to_string(),
            maximize,
        }
    }

    #[test]
    fn writes_an_upscaled_png() {
        let dir = tempdir().unwrap();
        let mut viewer = ImageViewer::new(dir.path().to_path_buf());
        let path = viewer.write_png(&blank_view(false)).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.width(), IMAGE_SIDE as u32 * UPSCALE);

        // The maximize hint doubles the output size.
        let path = viewer.write_png(&blank_view(true)).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.width(), IMAGE_SIDE as u32 * UPSCALE_MAXIMIZED);
    }

    #[test]
    fn numbers_rendered_views() {
        let dir = tempdir().unwrap();
        let mut viewer = ImageViewer::new(dir.path().to_path_buf());
        let first = viewer.write_png(&blank_view(false)).unwrap();
        let second = viewer.write_png(&blank_view(false)).unwrap();
        assert!(first.ends_with("view_000.png"));
        assert!(second.ends_with("view_001.png"));
    }

    #[test]
    fn rejects_wrong_pixel_count() {
        let dir = tempdir().unwrap();
        let mut viewer = ImageViewer::new(dir.path().to_path_buf());
        let view = DigitView {
            pixels: vec![0.0; 10],
            title: String::new(),
            caption: String::new(),
            maximize: false,
        };
        let err = viewer.write_png(&view).unwrap_err();
        assert!(matches!(
            err,
            RenderError::BadPixelCount { found: 10, expected: IMAGE_LEN }
        ));
    }
}
