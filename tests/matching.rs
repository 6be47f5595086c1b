//! Matcher properties on templates produced by the real pipeline:
//! determinism, symmetry, self-distance and rotation recovery.

mod common;

use common::synthetic_eye::{synthetic_eye, EyeParams};
use iris_recognizer::pipeline::FramePipeline;
use iris_recognizer::{hamming_distance, match_score, Template};

fn encode_eye(params: &EyeParams) -> Template {
    let pipeline = FramePipeline::default();
    let scored = pipeline
        .score_frame(synthetic_eye(params))
        .expect("score synthetic eye");
    pipeline.encode_frame(&scored).expect("encode synthetic eye")
}

#[test]
fn template_is_deterministic_and_self_identical() {
    let a = encode_eye(&EyeParams::default());
    let b = encode_eye(&EyeParams::default());
    assert_eq!(a.code(), b.code());
    assert_eq!(a.mask(), b.mask());
    assert!(a.valid_fraction() >= 0.60);
    assert_eq!(hamming_distance(&a, &a), 0.0);
}

#[test]
fn distance_is_symmetric_on_real_templates() {
    let a = encode_eye(&EyeParams::default());
    let b = encode_eye(&EyeParams {
        texture_seed: 31,
        ..EyeParams::default()
    });
    assert_eq!(hamming_distance(&a, &b), hamming_distance(&b, &a));
}

#[test]
fn rotation_by_one_grid_column_is_recovered() {
    // 11 degrees is within a column of the 32-column angular grid
    // (360 / 32 = 11.25 degrees per column).
    let upright = encode_eye(&EyeParams::default());
    let tilted = encode_eye(&EyeParams {
        rotation_deg: 11.0,
        ..EyeParams::default()
    });
    let score = match_score(&upright, &tilted);
    assert!(
        score.distance <= 0.30,
        "tilted distance {} above tolerance",
        score.distance
    );
    assert!(
        score.shift.abs() <= 1,
        "unexpected best shift {}",
        score.shift
    );
}

#[test]
fn strangers_stay_far_apart() {
    let a = encode_eye(&EyeParams::default());
    let b = encode_eye(&EyeParams {
        texture_seed: 99,
        ..EyeParams::default()
    });
    let d = hamming_distance(&a, &b);
    assert!(d > 0.35, "impostor distance {d} inside the suggest zone");
}
