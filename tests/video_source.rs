//! VideoSource and file analysis tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use barcut::{AnalysisOptions, DetectorConfig, FrameSource, VideoSource, analyze_video};

fn compilation_path() -> &'static str {
    "tests/fixtures/compilation.mp4"
}

// ── metadata ──────────────────────────────────────────────────────

#[test]
fn metadata_is_cached_on_open() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata();
    assert_eq!((metadata.width, metadata.height), (320, 240));
    assert!((metadata.frames_per_second - 25.0).abs() < 0.01);
    assert!(metadata.frame_count > 0);
    assert_eq!(source.frame_rate(), metadata.frames_per_second);
    assert_eq!(source.path(), Path::new(path));
}

// ── decoding ──────────────────────────────────────────────────────

#[test]
fn frames_are_grayscale_at_source_size() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    let frame = source
        .get_frame(10)
        .expect("Failed to decode")
        .expect("Frame 10 should exist");
    assert_eq!(frame.index(), 10);
    assert_eq!((frame.width(), frame.height()), (320, 240));
    assert!((frame.timestamp() - 0.4).abs() < 1e-6);
}

#[test]
fn stream_end_returns_none() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    assert!(source.get_frame(1_000_000).expect("Failed to decode").is_none());
    assert_eq!(source.frames_decoded(), 150);
}

#[test]
fn count_frames_decodes_to_the_end() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = VideoSource::open(path).expect("Failed to open fixture");
    source.get_frame(10).expect("Failed to decode");
    assert_eq!(source.count_frames().expect("Failed to count"), 150);
    // Counting is idempotent once the stream is drained.
    assert_eq!(source.count_frames().expect("Failed to count"), 150);
    assert!(source.get_frame(150).expect("Failed to decode").is_none());
}

// ── analysis ──────────────────────────────────────────────────────

#[test]
fn detects_framing_changes_in_fixture() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let cuts = analyze_video(path, &DetectorConfig::default(), &AnalysisOptions::new())
        .expect("Failed to analyze fixture");

    let frame_numbers: Vec<u64> = cuts.iter().map(|cut| cut.frame_number).collect();
    assert!(frame_numbers.contains(&50), "cuts: {frame_numbers:?}");
    assert!(frame_numbers.contains(&100), "cuts: {frame_numbers:?}");

    let first = cuts
        .iter()
        .find(|cut| cut.frame_number == 50)
        .expect("cut at 50");
    assert!(first.transition.before.top >= 25);
    assert!(first.transition.after.left >= 35);
}

#[test]
fn sampled_analysis_lands_on_sampled_frames() {
    let path = compilation_path();
    if !Path::new(path).exists() {
        return;
    }

    let config = DetectorConfig::default().with_sample_rate(4);
    let cuts = analyze_video(path, &config, &AnalysisOptions::new())
        .expect("Failed to analyze fixture");

    assert!(!cuts.is_empty());
    assert!(cuts.iter().all(|cut| cut.frame_number % 4 == 0));
}
