use std::io::{BufRead, Write};
use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::config::InspectConfig;
use crate::dataset::LabeledSplit;
use crate::input_image;
use crate::model::{MlpModel, argmax};
use crate::render::{DigitView, RenderError, Renderer};

use super::partition::{Bucket, PartitionError, hot_index, partition_predictions};
use super::{occurrences_of, pick_random};

/// Batch prediction interface the session needs from a trained classifier.
pub trait Classifier {
    /// Per-class probability rows for a batch of feature rows.
    fn predict_batch(&self, rows: &[Vec<f32>]) -> Vec<Vec<f32>>;
}

impl Classifier for MlpModel {
    fn predict_batch(&self, rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
        MlpModel::predict_batch(self, rows)
    }
}

/// Errors that end an inspection session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The user gave an unusable answer to a prompt.
    #[error("Invalid input: {0}")]
    InputValidation(String),
    /// Prompt I/O failed.
    #[error("Failed to read prompt input: {0}")]
    PromptIo(std::io::Error),
    /// The external-input directory could not be listed.
    #[error("Failed to list input directory {path}: {source}")]
    ListInput {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Partitioning the evaluated test split failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// Displaying a view failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// How a completed session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// One test-split sample was rendered.
    RenderedSample,
    /// The external flow ran; carries the number of files rendered.
    RenderedExternal(usize),
    /// The chosen bucket/digit combination had no samples.
    NoOccurrences,
}

/// Interactive inspection of classifier predictions.
///
/// Reads prompt answers from `reader`, writes prompts to `writer`, and
/// displays samples through `renderer`, so tests can script the whole
/// exchange.
pub struct InspectSession<'a, R, W, V, G> {
    config: &'a InspectConfig,
    reader: R,
    writer: W,
    renderer: V,
    rng: G,
}

impl<'a, R, W, V, G> InspectSession<'a, R, W, V, G>
where
    R: BufRead,
    W: Write,
    V: Renderer,
    G: Rng,
{
    /// Create a session over the injected collaborators.
    pub fn new(config: &'a InspectConfig, reader: R, writer: W, renderer: V, rng: G) -> Self {
        Self {
            config,
            reader,
            writer,
            renderer,
            rng,
        }
    }

    /// Run the session to completion.
    pub fn run(
        &mut self,
        classifier: &impl Classifier,
        test: &LabeledSplit,
    ) -> Result<SessionOutcome, SessionError> {
        writeln!(
            self.writer,
            "External data must be placed in the '{}' folder.",
            self.config.input_dir.display()
        )
        .map_err(SessionError::PromptIo)?;
        let choice =
            self.prompt("Would you like to use your own external data or the MNIST data? (E/M): ")?;
        match choice.trim() {
            "E" | "e" => self.run_external(classifier),
            "M" | "m" => self.run_dataset(classifier, test),
            other => Err(SessionError::InputValidation(format!(
                "Unrecognized source choice '{other}' (expected E or M)"
            ))),
        }
    }

    fn run_dataset(
        &mut self,
        classifier: &impl Classifier,
        test: &LabeledSplit,
    ) -> Result<SessionOutcome, SessionError> {
        let bucket_choice = self.prompt(
            "Would you like to see an incorrectly predicted image or a correctly predicted image? (I/C): ",
        )?;
        let bucket = match bucket_choice.trim() {
            "I" | "i" => Bucket::Incorrect,
            "C" | "c" => Bucket::Correct,
            other => {
                return Err(SessionError::InputValidation(format!(
                    "Unrecognized bucket choice '{other}' (expected I or C)"
                )));
            }
        };

        let digit_raw = self.prompt("Enter the digit you would like to see (0-9): ")?;
        let digit: usize = digit_raw.trim().parse().map_err(|_| {
            SessionError::InputValidation(format!(
                "'{}' is not a digit between 0 and 9",
                digit_raw.trim()
            ))
        })?;
        if digit > 9 {
            return Err(SessionError::InputValidation(format!(
                "{digit} is not a digit between 0 and 9"
            )));
        }

        let predictions = classifier.predict_batch(&test.images);
        let partition = partition_predictions(&test.labels, &predictions)?;
        let occurrences = occurrences_of(partition.bucket(bucket), digit);
        let Ok(picked) = pick_random(&mut self.rng, &occurrences) else {
            writeln!(
                self.writer,
                "No {} occurrences of digit {digit} were found.",
                bucket.as_adjective()
            )
            .map_err(SessionError::PromptIo)?;
            return Ok(SessionOutcome::NoOccurrences);
        };

        let position = occurrences.iter().position(|&v| v == picked).unwrap_or(0);
        let predicted = argmax(&predictions[picked]);
        let actual = hot_index(&test.labels[picked]).unwrap_or(0);
        let view = DigitView {
            pixels: test.images[picked].clone(),
            title: format!(
                "Image Number {position} of {} Total Occurrences",
                occurrences.len()
            ),
            caption: format!("Predicted label: {predicted}\nActual label: {actual}"),
            maximize: true,
        };
        self.renderer.show(&view)?;
        Ok(SessionOutcome::RenderedSample)
    }

    fn run_external(&mut self, classifier: &impl Classifier) -> Result<SessionOutcome, SessionError> {
        let entries = std::fs::read_dir(&self.config.input_dir).map_err(|source| {
            SessionError::ListInput {
                path: self.config.input_dir.clone(),
                source,
            }
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut rendered = 0usize;
        for path in files {
            let normalized = match input_image::normalize_image(&path, &self.config.processed_dir) {
                Ok(normalized) => normalized,
                Err(err) => {
                    warn!("Skipping {}: {err}", path.display());
                    continue;
                }
            };
            let prediction = classifier.predict_batch(std::slice::from_ref(&normalized.features));
            let predicted = prediction.first().map(|row| argmax(row)).unwrap_or(0);
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let view = DigitView {
                pixels: normalized.features,
                title: format!("Image '{name}' After Processing"),
                caption: format!("Predicted label: {predicted}"),
                maximize: true,
            };
            self.renderer.show(&view)?;
            rendered += 1;
        }
        Ok(SessionOutcome::RenderedExternal(rendered))
    }

    fn prompt(&mut self, text: &str) -> Result<String, SessionError> {
        write!(self.writer, "{text}").map_err(SessionError::PromptIo)?;
        self.writer.flush().map_err(SessionError::PromptIo)?;
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(SessionError::PromptIo)?;
        Ok(line)
    }
}
