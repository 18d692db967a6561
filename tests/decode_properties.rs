//! Randomized checks of the decode and suppression invariants.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolopost::lowlevel::{
    class_probabilities, decode_class_scores, decode_objectness, OutputView,
};
use yolopost::{
    iou, suppress_duplicates, AnchorSet, DecodeConfig, DiscardRule, GridDecoder, GridLayout,
    NmsConfig,
};

fn small_layout() -> GridLayout {
    let anchors = AnchorSet::from_flat(&[1.0, 1.5, 2.5, 2.0, 0.5, 0.75]).unwrap();
    GridLayout::new(5, 4, 6, anchors, 32.0).unwrap()
}

fn random_output(layout: &GridLayout, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..layout.expected_len())
        .map(|_| rng.random_range(-6.0f32..6.0))
        .collect()
}

#[test]
fn decoded_detections_respect_discard_threshold() {
    let layout = small_layout();
    for (seed, threshold) in [(1u64, 0.1f32), (2, 0.5), (3, 0.9)] {
        let output = random_output(&layout, seed);
        let decoder = GridDecoder::new(layout.clone()).with_config(DecodeConfig {
            discard_threshold: threshold,
            ..DecodeConfig::default()
        });
        let detections = decoder.decode(&output).unwrap();
        assert!(!detections.is_empty() || threshold > 0.5);
        for det in &detections {
            assert!(det.objectness() >= threshold);
        }
    }
}

#[test]
fn class_scores_have_fixed_length_and_unit_range() {
    let layout = small_layout();
    let output = random_output(&layout, 11);
    let detections = GridDecoder::new(layout.clone()).decode(&output).unwrap();
    assert!(!detections.is_empty());

    for det in &detections {
        assert_eq!(det.class_scores().len(), layout.classes());
        for &score in det.class_scores() {
            assert!((0.0..=1.0).contains(&score));
        }
        let sum: f32 = det.class_scores().iter().sum();
        // class probabilities sum to 1 before objectness weighting
        assert!((sum / det.objectness() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn softmax_sums_to_one_for_every_slot() {
    let layout = small_layout();
    let output = random_output(&layout, 21);
    let view = OutputView::new(&output, &layout).unwrap();
    for slot in view.slots() {
        let probs = class_probabilities(slot.class_logits());
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}

#[test]
fn early_exit_matches_full_evaluation() {
    let layout = small_layout();
    let output = random_output(&layout, 31);
    let threshold = 0.4;
    let decoded = GridDecoder::new(layout.clone())
        .with_config(DecodeConfig {
            discard_threshold: threshold,
            ..DecodeConfig::default()
        })
        .decode(&output)
        .unwrap();

    // Reference: score every slot in full, filter afterwards.
    let view = OutputView::new(&output, &layout).unwrap();
    let reference: Vec<_> = view
        .slots()
        .map(|slot| {
            let objectness = decode_objectness(slot.objectness_logit());
            let scores = decode_class_scores(objectness, slot.class_logits()).unwrap();
            (objectness, scores)
        })
        .filter(|(objectness, _)| *objectness >= threshold)
        .collect();

    assert_eq!(decoded.len(), reference.len());
    for (det, (objectness, scores)) in decoded.iter().zip(&reference) {
        assert_eq!(det.objectness(), *objectness);
        assert_eq!(det.class_scores(), scores.scores.as_slice());
        assert_eq!(det.best_class_index(), scores.best_class_index);
    }
}

#[test]
fn zero_threshold_keeps_every_slot() {
    let layout = small_layout();
    let output = random_output(&layout, 32);
    for rule in [DiscardRule::Objectness, DiscardRule::BestClassScore] {
        let detections = GridDecoder::new(layout.clone())
            .with_config(DecodeConfig {
                discard_threshold: 0.0,
                discard_rule: rule,
                ..DecodeConfig::default()
            })
            .decode(&output)
            .unwrap();
        assert_eq!(detections.len(), layout.slot_count());
    }
}

#[test]
fn decode_order_is_row_major_then_box() {
    let layout = small_layout();
    let output = random_output(&layout, 41);
    let detections = GridDecoder::new(layout).decode(&output).unwrap();
    let keys: Vec<_> = detections
        .iter()
        .map(|d| (d.slot().cell_y, d.slot().cell_x, d.slot().box_index))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn survivors_never_overlap_above_threshold() {
    let layout = small_layout();
    let nms = NmsConfig {
        iou_threshold: 0.3,
        ..NmsConfig::default()
    };
    for seed in 50..55u64 {
        let output = random_output(&layout, seed);
        let mut detections = GridDecoder::new(layout.clone()).decode(&output).unwrap();
        suppress_duplicates(&mut detections, layout.classes(), &nms).unwrap();

        for class_index in 0..layout.classes() {
            let survivors: Vec<_> = detections
                .iter()
                .filter(|d| d.class_score(class_index).unwrap() > 0.0)
                .collect();
            for (i, a) in survivors.iter().enumerate() {
                for b in &survivors[i + 1..] {
                    assert!(iou(&a.rect, &b.rect) < nms.iou_threshold);
                }
            }
        }
    }
}

#[test]
fn suppression_only_zeroes_scores() {
    let layout = small_layout();
    let output = random_output(&layout, 77);
    let before = GridDecoder::new(layout.clone()).decode(&output).unwrap();
    let mut after = before.clone();
    suppress_duplicates(&mut after, layout.classes(), &NmsConfig::default()).unwrap();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.rect, a.rect);
        assert_eq!(b.best_class_index(), a.best_class_index());
        for (sb, sa) in b.class_scores().iter().zip(a.class_scores()) {
            assert!(*sa == *sb || *sa == 0.0);
        }
    }
}
