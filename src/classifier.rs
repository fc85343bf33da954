//! Ranking of model scores into the labels shown to the user.
//!
//! [`rank_scores`] is the whole decision: sort, keep the top K, and collapse
//! anything below the confidence threshold into a single `unknown` entry.
//! [`Classifier`] wraps it with decoding and inference and turns every failure
//! into [`RankedResult::Error`], so callers never see an `Err`.

use crate::labels::ClassLabels;
use crate::predictor::{InferenceError, Predictor};
use crate::preprocess::{DecodeError, ImageDecoder, ImageTensor};
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_THRESHOLD: f64 = 40.0;

pub const UNKNOWN_LABEL: &str = "unknown";
pub const ERROR_LABEL: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Candidates kept before thresholding.
    pub top_k: usize,
    /// Minimum top-1 confidence, as a percentage.
    pub threshold: f64,
}

impl RankOptions {
    /// `top_k` must be at least 1 and `threshold` a percentage in [0, 100].
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.top_k == 0 {
            return Err(InferenceError::InvalidOptions {
                field: "top_k",
                value: self.top_k.to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(InferenceError::InvalidOptions {
                field: "threshold",
                value: self.threshold.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Percentage in [0, 100], two decimal places.
    pub confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RankedResult {
    /// Candidates in descending confidence order.
    Ranked { predictions: Vec<Prediction> },
    /// Top confidence fell below the threshold; the value is kept for logs.
    Unknown { confidence: f64 },
    /// Decoding or inference failed.
    Error {
        #[serde(skip)]
        message: String,
    },
}

impl RankedResult {
    pub fn error(message: impl Into<String>) -> Self {
        RankedResult::Error {
            message: message.into(),
        }
    }

    /// Flattens the result into `(label, confidence)` pairs, never empty.
    pub fn predictions(&self) -> Vec<Prediction> {
        match self {
            RankedResult::Ranked { predictions } => predictions.clone(),
            RankedResult::Unknown { confidence } => {
                vec![Prediction::new(UNKNOWN_LABEL, *confidence)]
            }
            RankedResult::Error { .. } => vec![Prediction::new(ERROR_LABEL, 0.0)],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RankedResult::Error { .. })
    }

    pub fn top(&self) -> Prediction {
        // predictions() is never empty
        self.predictions()
            .into_iter()
            .next()
            .unwrap_or_else(|| Prediction::new(ERROR_LABEL, 0.0))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Converts a raw score into a percentage rounded to two decimals.
fn to_percentage(score: f32) -> f64 {
    // adding 0.0 turns -0.0 into 0.0
    let score = f64::from(score).clamp(0.0, 1.0) + 0.0;
    (score * 100.0 * 100.0).round() / 100.0
}

/// Ranks one score per label and applies the confidence threshold.
///
/// Ties keep label order, so equal scores always rank the lower index first.
pub fn rank_scores(
    scores: &[f32],
    labels: &ClassLabels,
    options: &RankOptions,
) -> Result<RankedResult, InferenceError> {
    options.validate()?;
    if scores.len() != labels.len() {
        return Err(InferenceError::OutputLength {
            expected: labels.len(),
            actual: scores.len(),
        });
    }
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(InferenceError::NonFinite { index });
    }
    if scores.is_empty() {
        return Err(InferenceError::NoOutput);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let predictions: Vec<Prediction> = order
        .into_iter()
        .take(options.top_k)
        .filter_map(|i| {
            labels
                .get(i)
                .map(|label| Prediction::new(label, to_percentage(scores[i])))
        })
        .collect();

    let top = predictions.first().map(|p| p.confidence).unwrap_or(0.0);
    if top < options.threshold {
        return Ok(RankedResult::Unknown { confidence: top });
    }
    Ok(RankedResult::Ranked { predictions })
}

/// Decoder, model and label set bundled for serving.
#[derive(Clone)]
pub struct Classifier {
    decoder: ImageDecoder,
    predictor: Arc<dyn Predictor>,
    labels: ClassLabels,
    options: RankOptions,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("decoder", &self.decoder)
            .field("predictor", &self.predictor.name())
            .field("labels", &self.labels.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Classifier {
    /// Fails on invalid ranking options or if the model reports a class
    /// count that differs from the labels.
    pub fn new(
        decoder: ImageDecoder,
        predictor: Arc<dyn Predictor>,
        labels: ClassLabels,
        options: RankOptions,
    ) -> Result<Self, InferenceError> {
        options.validate()?;
        if let Some(n) = predictor.output_len() {
            if n != labels.len() {
                return Err(InferenceError::OutputLength {
                    expected: labels.len(),
                    actual: n,
                });
            }
        }
        Ok(Self {
            decoder,
            predictor,
            labels,
            options,
        })
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn options(&self) -> &RankOptions {
        &self.options
    }

    pub fn decoder(&self) -> &ImageDecoder {
        &self.decoder
    }

    pub fn model_name(&self) -> &str {
        self.predictor.name()
    }

    /// Decodes, runs and ranks one uploaded image.
    pub fn classify(&self, bytes: &[u8]) -> RankedResult {
        self.try_classify(bytes).unwrap_or_else(|e| {
            log::warn!("Prediction failed: {}", e);
            RankedResult::error(e.to_string())
        })
    }

    /// Runs and ranks an already decoded image.
    pub fn rank(&self, tensor: &ImageTensor) -> RankedResult {
        self.try_rank(tensor).unwrap_or_else(|e| {
            log::warn!("Prediction failed: {}", e);
            RankedResult::error(e.to_string())
        })
    }

    fn try_classify(&self, bytes: &[u8]) -> Result<RankedResult, ClassifyError> {
        let tensor = self.decoder.decode(bytes)?;
        Ok(self.try_rank(&tensor)?)
    }

    fn try_rank(&self, tensor: &ImageTensor) -> Result<RankedResult, InferenceError> {
        let scores = self.predictor.predict(tensor)?;
        rank_scores(&scores, &self.labels, &self.options)
    }
}
