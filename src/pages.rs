use crate::classifier::Prediction;
use minijinja::{Environment, context};

pub const UNSUPPORTED_UPLOAD: &str = "Please upload images in jpg, jpeg, or png format.";
pub const PREDICTION_FAILED: &str = "An error occurred during prediction. Please try again.";

const MISSING_LABEL: &str = "N/A";

/// HTML pages rendered from the templates embedded at build time.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("index.html", include_str!("../templates/index.html"))?;
        env.add_template("success.html", include_str!("../templates/success.html"))?;
        Ok(Self { env })
    }

    pub fn index(&self, error: Option<&str>) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { error => error.unwrap_or_default() })
    }

    /// Renders `rows` table rows, padding missing ones with `N/A` / `0.0`.
    pub fn success(
        &self,
        img: &str,
        predictions: &[Prediction],
        rows: usize,
    ) -> Result<String, minijinja::Error> {
        let rows = rows.max(predictions.len());
        let padded: Vec<Prediction> = predictions
            .iter()
            .cloned()
            .chain(std::iter::repeat_with(|| Prediction::new(MISSING_LABEL, 0.0)))
            .take(rows)
            .collect();
        self.env
            .get_template("success.html")?
            .render(context! { img => img, predictions => padded })
    }
}

impl std::fmt::Debug for Pages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages").finish_non_exhaustive()
    }
}
