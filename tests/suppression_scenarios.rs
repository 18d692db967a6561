use yolopost::{iou, suppress_duplicates, Detection, NmsConfig, Rect};

const CLASSES: usize = 20;

fn detection(class_index: usize, score: f32, rect: Rect) -> Detection {
    let mut scores = vec![0.0f32; CLASSES];
    scores[class_index] = score;
    Detection::new(rect, scores).unwrap()
}

fn unit_detection(class_index: usize, score: f32) -> Detection {
    detection(class_index, score, Rect::new(0.0, 0.0, 1.0, 1.0))
}

fn suppress(detections: &mut [Detection]) {
    suppress_duplicates(detections, CLASSES, &NmsConfig::default()).unwrap();
}

#[test]
fn zeroes_second_box_when_in_score_order() {
    let mut boxes = vec![unit_detection(1, 0.9), unit_detection(1, 0.7)];
    suppress(&mut boxes);

    assert_eq!(boxes[0].class_score(1), Some(0.9));
    assert_eq!(boxes[1].class_score(1), Some(0.0));
}

#[test]
fn zeroes_first_box_when_out_of_score_order() {
    let mut boxes = vec![unit_detection(1, 0.7), unit_detection(1, 0.9)];
    suppress(&mut boxes);

    assert_eq!(boxes[0].class_score(1), Some(0.0));
    assert_eq!(boxes[1].class_score(1), Some(0.9));
}

#[test]
fn keeps_overlapping_boxes_of_different_classes() {
    let mut boxes = vec![unit_detection(1, 0.7), unit_detection(5, 0.9)];
    suppress(&mut boxes);

    assert_eq!(boxes[0].class_score(1), Some(0.7));
    assert_eq!(boxes[1].class_score(5), Some(0.9));
}

#[test]
fn zeroes_weaker_of_two_close_rects() {
    let mut boxes = vec![
        detection(1, 0.7, Rect::new(0.1, 0.1, 0.9, 0.9)),
        detection(1, 0.9, Rect::new(0.11, 0.12, 0.88, 0.87)),
    ];
    suppress(&mut boxes);

    assert_eq!(boxes[0].class_score(1), Some(0.0));
    assert_eq!(boxes[1].class_score(1), Some(0.9));
}

#[test]
fn keeps_boxes_overlapping_below_threshold() {
    // IoU = 10 / 190 ~= 0.053
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(9.0, 0.0, 10.0, 10.0);
    assert!(iou(&a, &b) < NmsConfig::default().iou_threshold);

    let mut boxes = vec![detection(3, 0.8, a), detection(3, 0.6, b)];
    suppress(&mut boxes);

    assert_eq!(boxes[0].class_score(3), Some(0.8));
    assert_eq!(boxes[1].class_score(3), Some(0.6));
}

#[test]
fn empty_input_is_a_no_op() {
    let mut boxes: Vec<Detection> = Vec::new();
    let zeroed = suppress_duplicates(&mut boxes, CLASSES, &NmsConfig::default()).unwrap();
    assert_eq!(zeroed, 0);
    assert!(boxes.is_empty());
}

#[test]
fn single_detection_is_always_kept() {
    let mut boxes = vec![unit_detection(7, 0.42)];
    let zeroed = suppress_duplicates(&mut boxes, CLASSES, &NmsConfig::default()).unwrap();
    assert_eq!(zeroed, 0);
    assert_eq!(boxes[0].best_score(), 0.42);
}

#[test]
fn box_suppressed_for_one_class_survives_for_another() {
    let rect = Rect::new(0.0, 0.0, 5.0, 5.0);
    let mut strong = vec![0.0f32; CLASSES];
    strong[0] = 0.9;
    let mut mixed = vec![0.0f32; CLASSES];
    mixed[0] = 0.5;
    mixed[2] = 0.4;
    let mut boxes = vec![
        Detection::new(rect, strong).unwrap(),
        Detection::new(rect, mixed).unwrap(),
    ];
    suppress(&mut boxes);

    assert_eq!(boxes[1].class_score(0), Some(0.0));
    assert_eq!(boxes[1].class_score(2), Some(0.4));
    assert_eq!(boxes[1].best_class_index(), 0);
    assert!(!boxes[1].is_confident(0.3));
    assert!(!boxes[1].is_fully_suppressed());
}

#[test]
fn threshold_is_configurable() {
    // IoU = 50 / 150 ~= 0.33
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 0.0, 10.0, 10.0);

    let mut loose = vec![detection(0, 0.9, a), detection(0, 0.8, b)];
    suppress_duplicates(
        &mut loose,
        CLASSES,
        &NmsConfig {
            iou_threshold: 0.5,
            ..NmsConfig::default()
        },
    )
    .unwrap();
    assert_eq!(loose[1].class_score(0), Some(0.8));

    let mut tight = vec![detection(0, 0.9, a), detection(0, 0.8, b)];
    suppress_duplicates(
        &mut tight,
        CLASSES,
        &NmsConfig {
            iou_threshold: 0.3,
            ..NmsConfig::default()
        },
    )
    .unwrap();
    assert_eq!(tight[1].class_score(0), Some(0.0));
}

#[test]
fn degenerate_rects_do_not_break_suppression() {
    let mut boxes = vec![
        detection(4, 0.9, Rect::new(0.0, 0.0, f32::INFINITY, f32::INFINITY)),
        detection(4, 0.8, Rect::new(0.0, 0.0, f32::NAN, 2.0)),
        detection(4, 0.7, Rect::new(1.0, 1.0, 0.0, 0.0)),
    ];
    suppress(&mut boxes);
    for det in &boxes {
        assert!(det.class_score(4).unwrap().is_finite());
    }
}
