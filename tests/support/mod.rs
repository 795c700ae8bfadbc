//! Shared fixtures for integration tests.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use digitscope::dataset::{IMAGE_LEN, LabeledSplit, one_hot};
use digitscope::model::{MlpModel, TrainOptions, train_mlp};
use digitscope::render::{DigitView, RenderError, Renderer};
use image::GrayImage;

/// Renderer that records every view instead of displaying it.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    views: Rc<RefCell<Vec<DigitView>>>,
}

impl RecordingRenderer {
    pub fn handle(&self) -> Rc<RefCell<Vec<DigitView>>> {
        self.views.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn show(&mut self, view: &DigitView) -> Result<(), RenderError> {
        self.views.borrow_mut().push(view.clone());
        Ok(())
    }
}

/// A 784-feature row that lights up one block of pixels per class.
pub fn block_row(class: usize) -> Vec<f32> {
    let mut row = vec![0.0; IMAGE_LEN];
    for i in 0..64 {
        row[class * 64 + i] = 1.0;
    }
    row
}

/// Train a small real model that tells the digits 3 and 5 apart by their
/// pixel blocks, plus a matching labeled test split.
pub fn trained_toy_model() -> (MlpModel, LabeledSplit) {
    let mut images = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..10 {
        images.push(block_row(3));
        labels.push(one_hot(3));
        images.push(block_row(5));
        labels.push(one_hot(5));
    }
    let train = LabeledSplit { images, labels };

    let options = TrainOptions {
        hidden_size: 16,
        epochs: 60,
        batch_size: 4,
        learning_rate: 0.5,
        dropout: 0.0,
        seed: 13,
    };
    let model = train_mlp(&train, &options, None).expect("toy training should succeed");

    let test = LabeledSplit {
        images: vec![block_row(3), block_row(5), block_row(3)],
        labels: vec![one_hot(3), one_hot(5), one_hot(3)],
    };
    (model, test)
}

/// Write a white image with a black vertical stroke, the shape the external
/// flow expects to find in the input directory.
pub fn write_stroke_png(path: &Path) {
    let img = GrayImage::from_fn(56, 56, |x, _| {
        if (24..32).contains(&x) {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    });
    img.save(path).unwrap();
}
