#![deny(missing_docs)]
#![deny(warnings)]

//! Terminal entry point: train or restore the digit classifier, then run
//! the interactive prediction-inspection session.

use std::io::{self, BufReader};
use std::path::Path;

use digitscope::config::{ConfigError, InspectConfig};
use digitscope::dataset::{self, DatasetError};
use digitscope::inspect::{InspectSession, SessionError, SessionOutcome};
use digitscope::logging;
use digitscope::model::{self, EpochProgress, ModelSource, StoreError};
use digitscope::model::metrics::evaluate_probabilities;
use digitscope::render::ImageViewer;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    match run() {
        Ok(()) => {}
        Err(RunError::ModelUnavailable(err)) => {
            println!("Error: model must be trained before use, exiting...");
            println!("({err})");
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

/// Everything that can end the run, split so `main` can map the handled
/// model-unavailable case to a clean exit.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("{0}")]
    ModelUnavailable(StoreError),
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ModelUnavailable { .. } => RunError::ModelUnavailable(err),
            other => RunError::Store(other),
        }
    }
}

fn run() -> Result<(), RunError> {
    let config = InspectConfig::load_or_default(Path::new("."))?;

    tracing::info!("Loading MNIST data from {}", config.data_dir.display());
    let data = dataset::load_mnist(&config.data_dir)?;
    tracing::info!(
        "Loaded {} training and {} test samples",
        data.train.len(),
        data.test.len()
    );

    let mut report = |progress: EpochProgress| {
        println!(
            "epoch {}/{}: mean loss {:.4}",
            progress.epoch, progress.total, progress.mean_loss
        );
    };
    let (classifier, source) = model::load_or_train(
        &config.model_path,
        &data.train,
        &config.training,
        Some(&mut report),
    )?;

    if source == ModelSource::Loaded {
        let predictions = classifier.predict_batch(&data.test.images);
        let (acc, loss) = evaluate_probabilities(&data.test.labels, &predictions);
        println!("Restored model, accuracy: {:5.2}%", 100.0 * acc);
        println!("Restored model, loss: {loss:.2}");
    }

    let reader = BufReader::new(io::stdin());
    let renderer = ImageViewer::new(config.render_dir.clone());
    let mut session = InspectSession::new(&config, reader, io::stdout(), renderer, rand::rng());
    let outcome = session.run(&classifier, &data.test)?;
    if let SessionOutcome::RenderedExternal(count) = outcome {
        tracing::info!("Rendered {count} external image(s)");
    }
    Ok(())
}
