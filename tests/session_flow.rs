//! End-to-end inspection-session scenarios against a real trained model.

mod support;

use std::io::Cursor;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use digitscope::config::InspectConfig;
use digitscope::inspect::{InspectSession, SessionError, SessionOutcome};

use support::{RecordingRenderer, trained_toy_model, write_stroke_png};

#[test]
fn dataset_flow_renders_a_correct_occurrence() {
    let (model, test) = trained_toy_model();
    let config = InspectConfig::default();
    let renderer = RecordingRenderer::default();
    let views = renderer.handle();
    let mut output = Vec::new();

    let outcome = InspectSession::new(
        &config,
        Cursor::new(&b"M\nC\n3\n"[..]),
        &mut output,
        renderer,
        StdRng::seed_from_u64(5),
    )
    .run(&model, &test);

    assert_eq!(outcome.unwrap(), SessionOutcome::RenderedSample);
    let views = views.borrow();
    assert_eq!(views.len(), 1);
    // Samples 0 and 2 are the threes; either may be picked.
    assert!(views[0].title.contains("of 2 Total Occurrences"));
    assert_eq!(views[0].caption, "Predicted label: 3\nActual label: 3");
}

#[test]
fn fully_correct_class_leaves_the_incorrect_bucket_empty() {
    let (model, test) = trained_toy_model();
    let config = InspectConfig::default();
    let renderer = RecordingRenderer::default();
    let views = renderer.handle();
    let mut output = Vec::new();

    let outcome = InspectSession::new(
        &config,
        Cursor::new(&b"M\nI\n9\n"[..]),
        &mut output,
        renderer,
        StdRng::seed_from_u64(5),
    )
    .run(&model, &test);

    assert_eq!(outcome.unwrap(), SessionOutcome::NoOccurrences);
    assert!(views.borrow().is_empty());
    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("No incorrectly predicted occurrences of digit 9"));
}

#[test]
fn external_flow_classifies_files_and_skips_undecodable_ones() {
    let (model, _) = trained_toy_model();
    let dir = tempdir().unwrap();
    let input_dir = dir.path().join("input");
    std::fs::create_dir_all(&input_dir).unwrap();
    write_stroke_png(&input_dir.join("stroke.png"));
    std::fs::write(input_dir.join("broken.txt"), b"not an image").unwrap();

    let config = InspectConfig {
        input_dir,
        processed_dir: dir.path().join("processed_input"),
        render_dir: dir.path().join("rendered"),
        ..InspectConfig::default()
    };
    let renderer = RecordingRenderer::default();
    let views = renderer.handle();
    let mut output = Vec::new();

    let empty_test = digitscope::dataset::LabeledSplit {
        images: Vec::new(),
        labels: Vec::new(),
    };
    let outcome = InspectSession::new(
        &config,
        Cursor::new(&b"E\n"[..]),
        &mut output,
        renderer,
        StdRng::seed_from_u64(5),
    )
    .run(&model, &empty_test);

    // The broken file is skipped; the stroke image is processed and shown.
    assert_eq!(outcome.unwrap(), SessionOutcome::RenderedExternal(1));
    let views = views.borrow();
    assert_eq!(views.len(), 1);
    assert!(views[0].title.contains("'stroke.png'"));
    assert!(views[0].caption.starts_with("Predicted label: "));
    assert!(config.processed_dir.join("stroke.png").is_file());
}

#[test]
fn unrecognized_source_choice_fails_validation_before_any_render() {
    let (model, test) = trained_toy_model();
    let config = InspectConfig::default();
    let renderer = RecordingRenderer::default();
    let views = renderer.handle();
    let mut output = Vec::new();

    let outcome = InspectSession::new(
        &config,
        Cursor::new(&b"X\n"[..]),
        &mut output,
        renderer,
        StdRng::seed_from_u64(5),
    )
    .run(&model, &test);

    assert!(matches!(outcome, Err(SessionError::InputValidation(_))));
    assert!(views.borrow().is_empty());
}

#[test]
fn saved_and_restored_model_agree_on_the_test_split() {
    let (model, test) = trained_toy_model();
    let dir = tempdir().unwrap();
    let path = dir.path().join("mnist_model.json");
    digitscope::model::save_model(&path, &model).unwrap();
    let restored = digitscope::model::load_model(&path).unwrap();

    assert_eq!(
        restored.predict_batch(&test.images),
        model.predict_batch(&test.images)
    );
}
