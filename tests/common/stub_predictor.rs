use lesion_classifier::predictor::InferenceError;
use lesion_classifier::{ImageTensor, Predictor};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic model returning the same scores for every image.
pub struct StubPredictor {
    scores: Vec<f32>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubPredictor {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            scores: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Scores for the eleven built-in labels with one dominant class.
    pub fn confident(index: usize, score: f32) -> Self {
        let mut scores = vec![0.01; 11];
        scores[index] = score;
        Self::new(scores)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Predictor for StubPredictor {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InferenceError::Backend("stub failure".to_string()));
        }
        assert!(input.data.iter().all(|v| (0.0..=1.0).contains(v)));
        Ok(self.scores.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
