mod common;

use std::path::Path;
use std::sync::Arc;

use common::{CountingRestorer, FailingRestorer};
use revive_core::cancel::CancelToken;
use revive_core::error::{FailureKind, InferenceError};
use revive_core::inference::{check_weights, BackgroundRestorer, FaceRestorer};
use revive_core::io::image_io::load_image;
use revive_core::job::{OutputFormat, RestoreParams};
use revive_core::models::RestoreModel;
use revive_core::stage::{RestoreRequest, RestoreRunner};

fn request(dir: &Path, input_name: &str, format: OutputFormat) -> RestoreRequest {
    let weights = common::seed_weights(dir, RestoreModel::V1_4);
    RestoreRequest {
        input: dir.join(input_name),
        output: dir.join(format!("enhanced_1.{}", format.extension())),
        upscale: 2,
        format,
        weights,
        params: RestoreParams::for_model(RestoreModel::V1_4),
    }
}

fn runner(restorer: impl FaceRestorer + 'static) -> RestoreRunner {
    RestoreRunner::new(Arc::new(restorer))
}

#[test]
fn test_restore_reports_checkpoints_and_scales_image() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgb_jpg(&dir.path().join("in.jpg"), 6, 4);
    let req = request(dir.path(), "in.jpg", OutputFormat::Png);

    let mut seen = Vec::new();
    let out = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |p| seen.push(p))
        .unwrap();

    assert_eq!(seen, vec![25, 75, 100]);
    assert_eq!(out, req.output);
    let restored = load_image(&out).unwrap();
    assert_eq!((restored.width(), restored.height()), (12, 8));
}

#[test]
fn test_rgba_input_can_be_written_as_jpg() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgba_png(&dir.path().join("in.png"), 4, 4);
    let req = request(dir.path(), "in.png", OutputFormat::Jpg);

    let out = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |_| {})
        .unwrap();
    let restored = load_image(&out).unwrap();
    assert!(!restored.color().has_alpha());
}

#[test]
fn test_webp_output() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgba_png(&dir.path().join("in.png"), 4, 4);
    let req = request(dir.path(), "in.png", OutputFormat::Webp);

    let out = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |_| {})
        .unwrap();
    assert_eq!(image::ImageFormat::from_path(&out).unwrap(), image::ImageFormat::WebP);
    assert!(load_image(&out).is_ok());
}

#[test]
fn test_corrupt_input_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.jpg"), b"not an image").unwrap();
    let req = request(dir.path(), "in.jpg", OutputFormat::Jpg);

    let restorer = Arc::new(CountingRestorer::default());
    let mut seen = Vec::new();
    let err = RestoreRunner::new(restorer.clone())
        .run(&req, &CancelToken::new(), &mut |p| seen.push(p))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::DecodeFailure);
    assert!(seen.is_empty());
    assert_eq!(restorer.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn test_inference_error_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgb_jpg(&dir.path().join("in.jpg"), 4, 4);
    let req = request(dir.path(), "in.jpg", OutputFormat::Jpg);

    let mut seen = Vec::new();
    let err = runner(FailingRestorer)
        .run(&req, &CancelToken::new(), &mut |p| seen.push(p))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InferenceFailure);
    assert!(err.to_string().contains("model exploded"));
    assert_eq!(seen, vec![25]);
    assert!(!req.output.exists());
}

#[test]
fn test_missing_weights_is_inference_failure() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgb_jpg(&dir.path().join("in.jpg"), 4, 4);
    let mut req = request(dir.path(), "in.jpg", OutputFormat::Jpg);
    req.weights = dir.path().join("missing.pth");

    let err = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |_| {})
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InferenceFailure);
}

#[test]
fn test_weights_without_checkpoint_header_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgb_jpg(&dir.path().join("in.jpg"), 4, 4);
    let mut req = request(dir.path(), "in.jpg", OutputFormat::Jpg);
    req.weights = dir.path().join("html.pth");
    std::fs::write(&req.weights, b"<html>rate limited</html>").unwrap();

    let err = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |_| {})
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InferenceFailure);
    assert!(err.to_string().contains("Not a PyTorch checkpoint"), "got: {err}");
    assert!(!req.output.exists());
}

#[test]
fn test_check_weights_accepts_zip_and_pickle_headers() {
    let dir = tempfile::tempdir().unwrap();
    let zip = dir.path().join("zip.pth");
    std::fs::write(&zip, b"PK\x03\x04rest").unwrap();
    let pickle = dir.path().join("pickle.pth");
    std::fs::write(&pickle, [0x80, 0x02, b'c']).unwrap();
    let empty = dir.path().join("empty.pth");
    std::fs::write(&empty, b"").unwrap();

    assert!(check_weights(&zip).is_ok());
    assert!(check_weights(&pickle).is_ok());
    assert!(matches!(check_weights(&empty), Err(InferenceError::EmptyWeights(_))));
    assert!(matches!(
        check_weights(&dir.path().join("absent.pth")),
        Err(InferenceError::MissingWeights(_))
    ));
}

#[test]
fn test_unwritable_output_is_encode_failure() {
    let dir = tempfile::tempdir().unwrap();
    common::write_rgb_jpg(&dir.path().join("in.jpg"), 4, 4);
    let mut req = request(dir.path(), "in.jpg", OutputFormat::Jpg);
    req.output = dir.path().join("no-such-dir").join("enhanced_1.jpg");

    let mut seen = Vec::new();
    let err = runner(BackgroundRestorer)
        .run(&req, &CancelToken::new(), &mut |p| seen.push(p))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::EncodeFailure);
    assert_eq!(seen, vec![25, 75]);
}

#[test]
fn test_paste_back_is_always_enabled() {
    let options = revive_core::inference::RestoreOptions::new(
        "w.pth".into(),
        2,
        &RestoreParams::for_model(RestoreModel::RestoreFormer),
    );
    assert!(options.paste_back);
    assert_eq!(options.arch.tag(), "RestoreFormer");
}
