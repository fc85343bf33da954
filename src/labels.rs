use std::path::Path;
use std::sync::Arc;

/// Labels the bundled skin lesion model was trained on, in output order.
pub const DEFAULT_LABELS: [&str; 11] = [
    "actinic keratosis",
    "basal cell carcinoma",
    "dermatofibroma",
    "melanoma",
    "nevus",
    "pigmented benign keratosis",
    "seborrheic keratosis",
    "squamous cell carcinoma",
    "unknown",
    "vascular lesion",
    "warts molluscum",
];

#[derive(Debug, thiserror::Error)]
pub enum LabelsError {
    #[error("Failed to read labels file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Labels file '{path}' contains no labels")]
    Empty { path: String },
}

/// Ordered class names, index-aligned with the model output vector.
///
/// Cloning is cheap; all clones share the same immutable list.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    labels: Arc<[String]>,
}

impl ClassLabels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::<String>::into).collect(),
        }
    }

    /// Reads one label per line. Blank lines are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LabelsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LabelsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let labels = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty()),
        );
        if labels.is_empty() {
            return Err(LabelsError::Empty {
                path: path.display().to_string(),
            });
        }
        Ok(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS)
    }
}
