//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions.

use std::path::Path;

use barcut::{AnalysisOptions, BarcutError, DetectorConfig, FrameSource, VideoSource};

#[test]
fn open_nonexistent_file() {
    let result = VideoSource::open("this_file_does_not_exist.mp4");
    assert!(result.is_err());

    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    // Create a temporary file with garbage content.
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = VideoSource::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn analyze_rejects_config_before_opening() {
    // The path does not exist, so reaching the open would give FileOpen.
    let config = DetectorConfig::default().with_min_bar_size(0);
    let result = barcut::analyze_video("this_file_does_not_exist.mp4", &config, &AnalysisOptions::new());
    assert!(matches!(result, Err(BarcutError::InvalidConfig(_))));
}

#[test]
fn frame_source_error_message() {
    let error = BarcutError::FrameSource {
        last_processed: Some(41),
        frames_analyzed: 42,
        reason: "decode failed".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("42 analyzed frames"), "{message}");
    assert!(message.contains("41"), "{message}");
    assert!(message.contains("decode failed"), "{message}");

    let error = BarcutError::FrameSource {
        last_processed: None,
        frames_analyzed: 0,
        reason: "decode failed".to_string(),
    };
    assert!(error.to_string().contains("none"), "{error}");
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: BarcutError = io.into();
    assert!(matches!(error, BarcutError::IoError(_)));
}

#[test]
fn rewinding_video_source_is_rejected() {
    let path = "tests/fixtures/compilation.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open test video");
    source.get_frame(5).expect("Failed to decode frame 5");
    let result = source.get_frame(2);
    assert!(matches!(
        result,
        Err(BarcutError::OutOfOrderFrame { frame_number: 2, .. })
    ));
}
