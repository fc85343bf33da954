use image::RgbImage;
use image::imageops::{self, FilterType};

/// Side length the skin lesion model was trained on.
pub const DEFAULT_INPUT_SIZE: u32 = 240;

pub const CHANNELS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid image dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
}

/// A single normalized RGB image in NHWC order with an implicit batch of 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Scales 8-bit RGB pixels into [0.0, 1.0].
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            width: width as usize,
            height: height as usize,
            data,
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, CHANNELS]
    }
}

/// Turns uploaded bytes into the fixed-size tensor the model expects.
#[derive(Debug, Clone, Copy)]
pub struct ImageDecoder {
    width: u32,
    height: u32,
}

impl ImageDecoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ImageTensor, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let img = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Dimensions { width, height });
        }
        let resized = if (width, height) == (self.width, self.height) {
            img
        } else {
            // nearest matches the interpolation the training pipeline used
            imageops::resize(&img, self.width, self.height, FilterType::Nearest)
        };
        Ok(ImageTensor::from_rgb(&resized))
    }
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
    }
}
