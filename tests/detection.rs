//! End-to-end cut inference over in-memory frame sequences.

use std::sync::{Arc, Mutex};

use barcut::{
    AnalysisOptions, BarcutError, CutDetector, DetectorConfig, Frame, FrameSource, MemorySource,
    OperationType, ProgressCallback, ProgressInfo,
};
use image::{GrayImage, Luma};

const WIDTH: u32 = 96;
const HEIGHT: u32 = 64;
const FPS: f64 = 25.0;

/// A frame with `top` black rows above a bright picture.
fn top_bar(top: u32) -> GrayImage {
    GrayImage::from_fn(WIDTH, HEIGHT, |_, y| if y < top { Luma([0]) } else { Luma([190]) })
}

/// A frame with black columns of width `side` on both sides.
fn side_bars(side: u32) -> GrayImage {
    GrayImage::from_fn(WIDTH, HEIGHT, |x, _| {
        if x < side || x >= WIDTH - side { Luma([0]) } else { Luma([190]) }
    })
}

/// Frames 0–4 letterboxed with a 20px top bar, frames 5–9 without bars.
fn ten_frame_sequence() -> Vec<GrayImage> {
    (0..10).map(|index| top_bar(if index < 5 { 20 } else { 0 })).collect()
}

fn detector(config: DetectorConfig) -> CutDetector {
    CutDetector::new(config).expect("valid configuration")
}

// ── reference scenarios ───────────────────────────────────────────

#[test]
fn single_transition_yields_one_cut() {
    let cuts = detector(DetectorConfig::default())
        .detect_frames(ten_frame_sequence(), FPS, &AnalysisOptions::new())
        .expect("detection failed");

    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].frame_number, 5);
    assert!((cuts[0].timestamp - 0.2).abs() < 1e-9);
    assert_eq!(cuts[0].transition.before.top, 20);
    assert_eq!(cuts[0].transition.after.top, 0);
}

#[test]
fn noisy_frame_within_tolerance_is_ignored() {
    let mut frames = ten_frame_sequence();
    frames[2] = top_bar(17);

    let cuts = detector(DetectorConfig::default())
        .detect_frames(frames, FPS, &AnalysisOptions::new())
        .expect("detection failed");

    let frame_numbers: Vec<u64> = cuts.iter().map(|cut| cut.frame_number).collect();
    assert_eq!(frame_numbers, vec![5]);
}

#[test]
fn sampling_reports_first_sampled_frame_after_transition() {
    let config = DetectorConfig::default().with_sample_rate(2);
    let cuts = detector(config)
        .detect_frames(ten_frame_sequence(), FPS, &AnalysisOptions::new())
        .expect("detection failed");

    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].frame_number, 6);
    assert!((cuts[0].timestamp - 0.24).abs() < 1e-9);
}

// ── ordering properties ───────────────────────────────────────────

#[test]
fn cuts_are_strictly_increasing_and_never_at_zero() {
    // Letterbox, pillarbox, full frame, letterbox again, with jitter.
    let mut frames = Vec::new();
    for index in 0..120u32 {
        let frame = match index / 30 {
            0 => top_bar(24 + index % 3),
            1 => side_bars(18 + index % 2),
            2 => top_bar(0),
            _ => top_bar(12),
        };
        frames.push(frame);
    }

    let cuts = detector(DetectorConfig::default())
        .detect_frames(frames, FPS, &AnalysisOptions::new())
        .expect("detection failed");

    let frame_numbers: Vec<u64> = cuts.iter().map(|cut| cut.frame_number).collect();
    assert_eq!(frame_numbers, vec![30, 60, 90]);
    for pair in cuts.windows(2) {
        assert!(pair[0].frame_number < pair[1].frame_number);
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
    assert!(cuts.iter().all(|cut| cut.frame_number != 0));
}

#[test]
fn constant_geometry_yields_no_cuts() {
    let frames = vec![side_bars(20); 40];
    let cuts = detector(DetectorConfig::default())
        .detect_frames(frames, FPS, &AnalysisOptions::new())
        .expect("detection failed");
    assert!(cuts.is_empty());
}

#[test]
fn empty_source_yields_no_cuts() {
    let cuts = detector(DetectorConfig::default())
        .detect_frames(Vec::new(), FPS, &AnalysisOptions::new())
        .expect("detection failed");
    assert!(cuts.is_empty());
}

#[test]
fn windows_longer_than_one_batch_keep_order() {
    // Enough frames to span several measurement windows.
    let frames: Vec<GrayImage> = (0..200)
        .map(|index| top_bar(if (index / 50) % 2 == 0 { 20 } else { 0 }))
        .collect();
    let cuts = detector(DetectorConfig::default())
        .detect_frames(frames, FPS, &AnalysisOptions::new())
        .expect("detection failed");
    let frame_numbers: Vec<u64> = cuts.iter().map(|cut| cut.frame_number).collect();
    assert_eq!(frame_numbers, vec![50, 100, 150]);
}

#[test]
fn unknown_frame_rate_is_rejected() {
    // Alternating geometry would otherwise yield cuts at 1, 2 and 3, all
    // stamped 0.0.
    let frames = vec![top_bar(20), top_bar(0), top_bar(20), top_bar(0)];
    for frame_rate in [0.0, -25.0, f64::NAN, f64::INFINITY] {
        let result = detector(DetectorConfig::default()).detect_frames(
            frames.clone(),
            frame_rate,
            &AnalysisOptions::new(),
        );
        assert!(
            matches!(result, Err(BarcutError::InvalidFrameRate(_))),
            "frame rate {frame_rate} should be rejected"
        );
    }
}

#[test]
fn alternating_geometry_has_strictly_increasing_timestamps() {
    let frames = vec![top_bar(20), top_bar(0), top_bar(20), top_bar(0)];
    let cuts = detector(DetectorConfig::default())
        .detect_frames(frames, FPS, &AnalysisOptions::new())
        .expect("detection failed");

    let frame_numbers: Vec<u64> = cuts.iter().map(|cut| cut.frame_number).collect();
    assert_eq!(frame_numbers, vec![1, 2, 3]);
    assert!(cuts.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
}

// ── progress and failures ─────────────────────────────────────────

#[derive(Default)]
struct RecordingProgress {
    seen: Mutex<Vec<(OperationType, u64)>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((info.operation, info.current));
        }
    }
}

#[test]
fn progress_is_reported_for_analysis() {
    let progress = Arc::new(RecordingProgress::default());
    let options = AnalysisOptions::new().with_progress(progress.clone());

    detector(DetectorConfig::default())
        .detect_frames(ten_frame_sequence(), FPS, &options)
        .expect("detection failed");

    let seen = progress.seen.lock().expect("lock poisoned");
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|(operation, _)| *operation == OperationType::Analysis));
    assert!(seen.windows(2).all(|pair| pair[0].1 <= pair[1].1));
}

/// Serves a memory source until `fail_at`, then errors.
struct FlakySource {
    inner: MemorySource,
    fail_at: u64,
}

impl FrameSource for FlakySource {
    fn frame_count(&self) -> u64 {
        self.inner.frame_count()
    }

    fn frame_rate(&self) -> f64 {
        self.inner.frame_rate()
    }

    fn get_frame(&mut self, index: u64) -> Result<Option<Frame>, BarcutError> {
        if index >= self.fail_at {
            return Err(BarcutError::FfmpegError("corrupt packet".to_string()));
        }
        self.inner.get_frame(index)
    }
}

#[test]
fn source_failure_carries_partial_progress() {
    let mut source = FlakySource {
        inner: MemorySource::new(ten_frame_sequence(), FPS),
        fail_at: 7,
    };

    let error = detector(DetectorConfig::default())
        .detect(&mut source, &AnalysisOptions::new())
        .expect_err("source failure should abort detection");

    match error {
        BarcutError::FrameSource {
            last_processed,
            frames_analyzed,
            reason,
        } => {
            assert_eq!(last_processed, Some(6));
            assert_eq!(frames_analyzed, 7);
            assert!(reason.contains("corrupt packet"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_configuration_is_rejected_before_analysis() {
    assert!(matches!(
        CutDetector::new(DetectorConfig::default().with_sample_rate(0)),
        Err(BarcutError::InvalidConfig(_))
    ));
}
