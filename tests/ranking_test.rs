mod common;

use common::encoded_image;
use common::stub_predictor::StubPredictor;
use image::ImageFormat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use lesion_classifier::{
    ClassLabels, Classifier, ImageDecoder, Prediction, RankOptions, RankedResult, rank_scores,
};
use std::sync::Arc;

const SCENARIO_A: [f32; 11] = [
    0.81, 0.05, 0.03, 0.02, 0.01, 0.01, 0.01, 0.01, 0.01, 0.02, 0.01,
];

fn classifier(predictor: StubPredictor, labels: ClassLabels) -> Classifier {
    Classifier::new(
        ImageDecoder::default(),
        Arc::new(predictor),
        labels,
        RankOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_confident_scores_return_four_ranked_labels() {
    let result =
        rank_scores(&SCENARIO_A, &ClassLabels::default(), &RankOptions::default()).unwrap();

    assert_eq!(
        result,
        RankedResult::Ranked {
            predictions: vec![
                Prediction::new("actinic keratosis", 81.0),
                Prediction::new("basal cell carcinoma", 5.0),
                Prediction::new("dermatofibroma", 3.0),
                Prediction::new("melanoma", 2.0),
            ]
        }
    );
}

#[test]
fn test_melanoma_ranked_first_when_dominant() {
    let mut scores = SCENARIO_A;
    scores.swap(0, 3);
    let result = classifier(StubPredictor::new(scores.to_vec()), ClassLabels::default())
        .classify(&encoded_image(ImageFormat::Png));

    let predictions = result.predictions();
    assert_eq!(predictions.len(), 4);
    assert_eq!(predictions[0], Prediction::new("melanoma", 81.0));
}

#[test]
fn test_low_confidence_collapses_to_unknown() {
    for index in [0, 5, 10] {
        let mut scores = vec![0.05; 11];
        scores[index] = 0.25;
        let result =
            rank_scores(&scores, &ClassLabels::default(), &RankOptions::default()).unwrap();
        assert_eq!(result.predictions(), vec![Prediction::new("unknown", 25.0)]);
    }
}

#[test]
fn test_undecodable_image_is_error() {
    let stub = Arc::new(StubPredictor::confident(3, 0.9));
    let classifier = Classifier::new(
        ImageDecoder::default(),
        stub.clone(),
        ClassLabels::default(),
        RankOptions::default(),
    )
    .unwrap();

    let result = classifier.classify(b"GIF89a but not really");
    assert_eq!(result.predictions(), vec![Prediction::new("error", 0.0)]);
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_inference_failure_is_error() {
    let result = classifier(StubPredictor::failing(), ClassLabels::default())
        .classify(&encoded_image(ImageFormat::Png));
    assert!(result.is_error());
    assert_eq!(result.predictions(), vec![Prediction::new("error", 0.0)]);
}

#[test]
fn test_wrong_score_count_is_error() {
    let result = classifier(StubPredictor::new(vec![0.9, 0.1]), ClassLabels::default())
        .classify(&encoded_image(ImageFormat::Png));
    assert!(result.is_error());
}

#[test]
fn test_two_classes_are_not_padded() {
    let labels = ClassLabels::new(["benign", "malignant"]);
    let result = classifier(StubPredictor::new(vec![0.35, 0.65]), labels)
        .classify(&encoded_image(ImageFormat::Jpeg));

    assert_eq!(
        result.predictions(),
        vec![
            Prediction::new("malignant", 65.0),
            Prediction::new("benign", 35.0)
        ]
    );
}

#[test]
fn test_threshold_boundary() {
    let labels = ClassLabels::default();
    let options = RankOptions::default();

    let mut at_threshold = vec![0.0; 11];
    at_threshold[4] = 0.4;
    let result = rank_scores(&at_threshold, &labels, &options).unwrap();
    assert_eq!(result.top(), Prediction::new("nevus", 40.0));
    assert!(matches!(result, RankedResult::Ranked { .. }));

    let mut below = vec![0.0; 11];
    below[4] = 0.3999;
    let result = rank_scores(&below, &labels, &options).unwrap();
    assert_eq!(result, RankedResult::Unknown { confidence: 39.99 });
}

#[test]
fn test_result_properties_hold_for_varied_scores() {
    let labels = ClassLabels::default();
    let options = RankOptions::default();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let scores: Vec<f32> = (0..11)
            .map(|_| rng.random_range(0..=1000u32) as f32 / 1000.0)
            .collect();

        let result = rank_scores(&scores, &labels, &options).unwrap();
        let predictions = result.predictions();
        assert!(!predictions.is_empty() && predictions.len() <= options.top_k);
        assert!(
            predictions
                .iter()
                .all(|p| (0.0..=100.0).contains(&p.confidence))
        );
        if let RankedResult::Ranked { predictions } = &result {
            assert!(predictions[0].confidence >= options.threshold);
            assert!(
                predictions
                    .windows(2)
                    .all(|w| w[0].confidence >= w[1].confidence)
            );
        }

        assert_eq!(rank_scores(&scores, &labels, &options).unwrap(), result);
    }
}

#[test]
fn test_repeated_classification_is_deterministic() {
    let mut scores = vec![0.3; 11];
    scores[7] = 0.6;
    scores[9] = 0.6;
    let classifier = classifier(StubPredictor::new(scores), ClassLabels::default());
    let image = encoded_image(ImageFormat::Png);

    let first = classifier.classify(&image);
    for _ in 0..10 {
        assert_eq!(classifier.classify(&image), first);
    }
    let labels: Vec<_> = first.predictions().into_iter().map(|p| p.label).collect();
    assert_eq!(
        labels,
        vec![
            "squamous cell carcinoma",
            "vascular lesion",
            "actinic keratosis",
            "basal cell carcinoma"
        ]
    );
}
