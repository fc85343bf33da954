// Shared by the integration test binaries; not every helper is used by each.
#![allow(dead_code)]

pub mod stub_predictor;

use image::{ImageFormat, Rgb, RgbImage};
use lesion_classifier::{AppState, ServerConfig};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use stub_predictor::StubPredictor;

/// Encodes a small solid-colour image in the given format.
pub fn encoded_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 24, Rgb([180, 120, 90]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .expect("Failed to encode test image");
    buf.into_inner()
}

pub fn test_config(image_dir: &Path) -> ServerConfig {
    ServerConfig {
        model_path: "unused.onnx".into(),
        image_dir: image_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn create_test_state(image_dir: &Path, predictor: StubPredictor) -> AppState {
    AppState::with_predictor(&test_config(image_dir), Arc::new(predictor))
        .expect("Failed to create AppState in test")
}

/// Builds a `multipart/form-data` body with a single file part.
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----lesion-classifier-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
