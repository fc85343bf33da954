use crate::classifier::{DEFAULT_THRESHOLD, DEFAULT_TOP_K, RankOptions};
use crate::preprocess::DEFAULT_INPUT_SIZE;
use std::path::PathBuf;

pub const DEFAULT_IMAGE_DIR: &str = "static/images";
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Falls back to the built-in label set when unset.
    pub labels_path: Option<PathBuf>,
    pub image_dir: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub top_k: usize,
    pub threshold: f64,
    pub max_concurrent_inferences: usize,
    pub max_upload_size: usize,
    pub log_level: log::LevelFilter,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            model_path: PathBuf::new(),
            labels_path: None,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            input_width: DEFAULT_INPUT_SIZE,
            input_height: DEFAULT_INPUT_SIZE,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
            max_concurrent_inferences: 1,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            log_level: log::LevelFilter::Info,
        }
    }
}

impl ServerConfig {
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            top_k: self.top_k,
            threshold: self.threshold,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }

        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "model_path".to_string(),
            });
        }

        if self.input_width == 0 || self.input_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "input_size".to_string(),
                value: format!("{}x{}", self.input_width, self.input_height),
                reason: "Must be non-zero".to_string(),
            });
        }

        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_k".to_string(),
                value: self.top_k.to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "threshold".to_string(),
                value: self.threshold.to_string(),
                reason: "Must be a percentage between 0 and 100".to_string(),
            });
        }

        if self.max_concurrent_inferences == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_inferences".to_string(),
                value: "0".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_upload_size".to_string(),
                value: "0".to_string(),
                reason: "Must be non-zero".to_string(),
            });
        }

        if self.image_dir.is_file() {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "image_dir '{}' exists and is not a directory",
                    self.image_dir.display()
                ),
            });
        }

        Ok(())
    }
}
