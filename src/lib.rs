pub mod app_state;
pub mod classifier;
pub mod config;
pub mod labels;
pub mod logging;
pub mod pages;
pub mod predictor;
pub mod preprocess;
pub mod server;
pub mod upload;

pub use app_state::AppState;
pub use classifier::{Classifier, Prediction, RankOptions, RankedResult, rank_scores};
pub use config::ServerConfig;
pub use labels::ClassLabels;
pub use predictor::{OnnxPredictor, Predictor};
pub use preprocess::{ImageDecoder, ImageTensor};
