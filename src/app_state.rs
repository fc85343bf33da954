use crate::classifier::{Classifier, RankedResult};
use crate::config::ServerConfig;
use crate::labels::ClassLabels;
use crate::pages::Pages;
use crate::predictor::{OnnxPredictor, Predictor};
use crate::preprocess::ImageDecoder;
use crate::upload::UploadStore;
use anyhow::Context;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Everything a request handler needs, built once before the server starts.
#[derive(Debug)]
pub struct AppState {
    pub classifier: Classifier,
    pub pages: Pages,
    pub uploads: UploadStore,
    pub max_upload_size: usize,
    inference_slots: Arc<Semaphore>,
}

impl AppState {
    /// Loads the labels and the ONNX model named by `config`.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let predictor = OnnxPredictor::load(
            &config.model_path,
            config.input_width,
            config.input_height,
        )?;
        Self::with_predictor(config, Arc::new(predictor))
    }

    /// Builds the state around an already constructed model.
    pub fn with_predictor(
        config: &ServerConfig,
        predictor: Arc<dyn Predictor>,
    ) -> anyhow::Result<Self> {
        let labels = match &config.labels_path {
            Some(path) => ClassLabels::from_file(path)?,
            None => ClassLabels::default(),
        };
        let classifier = Classifier::new(
            ImageDecoder::new(config.input_width, config.input_height),
            predictor,
            labels,
            config.rank_options(),
        )
        .context("Model does not match the configured labels")?;
        let pages = Pages::new().context("Failed to load page templates")?;

        Ok(Self {
            classifier,
            pages,
            uploads: UploadStore::new(&config.image_dir),
            max_upload_size: config.max_upload_size,
            inference_slots: Arc::new(Semaphore::new(config.max_concurrent_inferences)),
        })
    }

    /// Runs one prediction on the blocking pool, waiting for a free
    /// inference slot first.
    ///
    /// The slot is held by the blocking job, so it stays taken until the
    /// inference finishes even if the caller stops waiting.
    pub async fn classify(&self, bytes: Bytes) -> RankedResult {
        let permit = match self.inference_slots.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => return RankedResult::error(e.to_string()),
        };
        let classifier = self.classifier.clone();
        let job = move || {
            let result = classifier.classify(&bytes);
            drop(permit);
            result
        };
        match actix_web::web::block(job).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("Inference task failed: {}", e);
                RankedResult::error(e.to_string())
            }
        }
    }
}
