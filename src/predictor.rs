use crate::preprocess::{CHANNELS, ImageTensor};
use std::path::Path;
use tract_onnx::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Input shape {actual:?} does not match model input {expected:?}")]
    InputShape {
        expected: [usize; 4],
        actual: [usize; 4],
    },

    #[error("Model returned {actual} scores but {expected} labels are configured")]
    OutputLength { expected: usize, actual: usize },

    #[error("Model returned a non-finite score at index {index}")]
    NonFinite { index: usize },

    #[error("Model produced no outputs")]
    NoOutput,

    #[error("Invalid ranking option {field}: {value}")]
    InvalidOptions { field: &'static str, value: String },

    #[error("Backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file '{0}' does not exist")]
    NotFound(String),

    #[error("Failed to load model '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

/// A trained image classifier.
///
/// Implementations must tolerate concurrent calls; the server shares one
/// instance across all request handlers.
pub trait Predictor: Send + Sync {
    /// Returns one score per class for a single normalized image.
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;

    /// Number of classes, when the backend can tell before running.
    fn output_len(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}

type Plan = TypedRunnableModel<TypedModel>;

/// ONNX model executed with tract.
pub struct OnnxPredictor {
    name: String,
    input_shape: [usize; 4],
    output_len: Option<usize>,
    plan: Plan,
}

impl OnnxPredictor {
    /// Loads and optimizes an ONNX model taking `f32[1, height, width, 3]`.
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        if !path.is_file() {
            return Err(ModelLoadError::NotFound(display));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| ModelLoadError::Invalid {
                path: display.clone(),
                reason: e.to_string(),
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| display.clone());

        let predictor = Self::from_model(model, name, width, height).map_err(|e| {
            ModelLoadError::Invalid {
                path: display.clone(),
                reason: e.to_string(),
            }
        })?;
        log::info!(
            "Loaded model {} (input {:?}, classes {:?})",
            display,
            predictor.input_shape,
            predictor.output_len
        );
        Ok(predictor)
    }

    /// Pins the input shape, optimizes and plans a parsed graph.
    fn from_model(
        model: InferenceModel,
        name: String,
        width: u32,
        height: u32,
    ) -> TractResult<Self> {
        let input_shape = [1, height as usize, width as usize, CHANNELS];
        let model = model
            .with_input_fact(0, f32::fact(input_shape).into())?
            .into_optimized()?;

        let output_len = model
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.to_vec()))
            .and_then(|dims| dims.last().copied());
        let plan = model.into_runnable()?;

        Ok(Self {
            name,
            input_shape,
            output_len,
            plan,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        if input.shape() != self.input_shape {
            return Err(InferenceError::InputShape {
                expected: self.input_shape,
                actual: input.shape(),
            });
        }

        let array = tract_ndarray::Array4::from_shape_vec(
            (1, input.height, input.width, CHANNELS),
            input.data.clone(),
        )
        .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let tensor: Tensor = array.into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let output = outputs.first().ok_or(InferenceError::NoOutput)?;
        let scores = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Backend(format!("Output is not f32: {e}")))?;

        Ok(scores.iter().copied().collect())
    }

    fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}
