//! Edge case tests for decoding, region geometry, warping and smoothing


use opencv::core::{self, Point2f};
use posture_pipeline::{
    anchors::AnchorTable,
    body_detection::{DetectionCandidate, DetectionDecoder},
    config::Config,
    filters::OneEuroParams,
    landmarks::LandmarkIndex,
    region::{normalize_radians, square_region, to_pixels, RegionNormalizer, RotationPolicy, SquareRegion},
    smoother::LandmarkSmoother,
    tracker::BodyTracker,
    warp::RegionWarper,
};
use std::f32::consts::{FRAC_PI_2, PI};
use test_helpers::{create_gradient_image, empty_detector_output, set_anchor, uniform_landmarks};

fn candidate_with_guides(a: Point2f, b: Point2f) -> DetectionCandidate {
    DetectionCandidate {
        score: 1.0,
        box_center_x: 0.5,
        box_center_y: 0.5,
        box_width: 0.2,
        box_height: 0.4,
        guide_keypoint_a: a,
        guide_keypoint_b: b,
        anchor_index: 0,
    }
}

#[test]
fn test_nan_scores_never_win() {
    let (mut scores, boxes) = empty_detector_output(f32::NAN);
    assert!(DetectionDecoder::new(0.5)
        .decode(&scores, &boxes, AnchorTable::blazepose())
        .unwrap()
        .is_none());

    scores[17] = 0.6;
    let best = DetectionDecoder::new(0.5)
        .decode(&scores, &boxes, AnchorTable::blazepose())
        .unwrap()
        .unwrap();
    assert_eq!(best.anchor_index, 17);
}

#[test]
fn test_raw_logit_threshold() {
    // Scores are compared raw, so negative thresholds work on logits
    let (mut scores, boxes) = empty_detector_output(-10.0);
    scores[2253] = -1.0;
    let best = DetectionDecoder::new(-2.0)
        .decode(&scores, &boxes, AnchorTable::blazepose())
        .unwrap()
        .unwrap();
    assert_eq!(best.anchor_index, 2253);
}

#[test]
fn test_last_anchor_decodes() {
    let (mut scores, mut boxes) = empty_detector_output(0.0);
    set_anchor(&mut scores, &mut boxes, 2253, 0.7, [0.0, 0.0, 224.0, 224.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    let anchors = AnchorTable::blazepose();
    let best = DetectionDecoder::new(0.5).decode(&scores, &boxes, anchors).unwrap().unwrap();
    assert_eq!(best.box_width, anchors[2253].width);
    assert_eq!(best.box_height, anchors[2253].height);
}

#[test]
fn test_zero_length_guide_vector_falls_back() {
    let p = Point2f::new(0.4, 0.4);
    let square = square_region(&candidate_with_guides(p, p), RotationPolicy::GuideKeypoints);
    assert_eq!(square.rotation, 0.0);
    assert_eq!(square.size, 0.4);
}

#[test]
fn test_upside_down_body_rotation() {
    // Scale point below the hips: half a turn
    let square = square_region(
        &candidate_with_guides(Point2f::new(0.5, 0.3), Point2f::new(0.5, 0.7)),
        RotationPolicy::GuideKeypoints,
    );
    assert!((square.rotation.abs() - PI).abs() < 1e-5, "rotation {}", square.rotation);
}

#[test]
fn test_normalize_radians_range() {
    for k in -20..=20 {
        #[allow(clippy::cast_precision_loss)]
        let angle = k as f32 * 0.77;
        let wrapped = normalize_radians(angle);
        assert!(wrapped > -PI - 1e-5 && wrapped <= PI + 1e-5, "{angle} -> {wrapped}");
    }
}

#[test]
fn test_region_outside_frame_is_black() {
    let frame = create_gradient_image(64, 64).unwrap();
    let square = SquareRegion {
        center_x: -2.0,
        center_y: -2.0,
        size: 0.2,
        rotation: 0.0,
    };
    let region = to_pixels(&square, 64, 64, 1.0, None).unwrap();
    let crop = RegionWarper::new(32, 32).unwrap().warp(&frame, &region).unwrap();
    let total = core::sum_elems(&crop.image).unwrap();
    assert_eq!(total[0] + total[1] + total[2], 0.0);
}

#[test]
fn test_tall_frame_region_stays_square() {
    let normalizer = RegionNormalizer::new(1.0, RotationPolicy::DetectorBox).unwrap();
    let candidate = candidate_with_guides(Point2f::new(0.5, 0.6), Point2f::new(0.5, 0.4));
    let region = normalizer.normalize(&candidate, 300, 900).unwrap();
    assert!((region.size - 360.0).abs() < 1e-3);

    let side_a = (region.corners[0].x - region.corners[1].x).hypot(region.corners[0].y - region.corners[1].y);
    let side_b = (region.corners[1].x - region.corners[2].x).hypot(region.corners[1].y - region.corners[2].y);
    assert!((side_a - side_b).abs() < 1e-2);
    assert!((region.rotation - FRAC_PI_2).abs() < 1e-6);
}

#[test]
fn test_non_finite_timestamp_restarts_smoother() {
    let mut smoother = LandmarkSmoother::new(OneEuroParams::new(1.0, 0.0, 1.0).unwrap());
    smoother.apply(&uniform_landmarks(0.0, 0.0, 0.0), 0.0, 1.0);

    let input = uniform_landmarks(3.0, 3.0, 3.0);
    assert_eq!(smoother.apply(&input, f64::NAN, 1.0), input);
    assert!(!smoother.is_primed());

    // Next valid timestamp warms up again
    let next = uniform_landmarks(9.0, 9.0, 9.0);
    assert_eq!(smoother.apply(&next, 1.0, 1.0), next);
}

#[test]
fn test_large_timestamps_keep_precision() {
    let mut smoother = LandmarkSmoother::new(OneEuroParams::new(1.0, 0.0, 1.0).unwrap());
    let start = 1.7e9;
    smoother.apply(&uniform_landmarks(0.0, 0.0, 0.0), start, 1.0);
    let out = smoother.apply(&uniform_landmarks(1.0, 1.0, 1.0), start + 1.0 / 30.0, 1.0);
    let x = out.get(LandmarkIndex::Nose).x;
    assert!(x > 0.1 && x < 0.25, "x = {x}");
}

#[test]
fn test_tracker_reacquisition_cycle() {
    let mut tracker = BodyTracker::new(&Config::default()).unwrap();
    let (empty_scores, empty_boxes) = empty_detector_output(0.0);
    let (mut scores, mut boxes) = empty_detector_output(0.0);
    set_anchor(&mut scores, &mut boxes, 500, 0.95, [0.0, 0.0, 100.0, 200.0, 0.0, 10.0, 0.0, -30.0, 0.0, 0.0, 0.0, 0.0]);

    for _ in 0..3 {
        assert!(tracker.locate(&scores, &boxes, 640, 480).unwrap().is_some());
        assert!(tracker.is_tracking());
        tracker.smooth(&uniform_landmarks(1.0, 2.0, 3.0), 0.0);

        assert!(tracker.locate(&empty_scores, &empty_boxes, 640, 480).unwrap().is_none());
        assert!(!tracker.is_tracking());
    }

    // Explicit reset on a live track
    tracker.locate(&scores, &boxes, 640, 480).unwrap();
    tracker.reset();
    assert!(!tracker.is_tracking());
}
