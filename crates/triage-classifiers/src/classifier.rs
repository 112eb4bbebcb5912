//! Category classifier trait and the linear model behind it

use crate::vectorizer::{TfidfArtifact, TfidfVectorizer, Vectorizer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use triage_core::{CategoryLabel, Error, Result};

/// First-stage classifier that assigns an incident category to text
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    /// Assign a category to non-blank text
    async fn categorize(&self, text: &str) -> Result<CategoryLabel>;

    /// Get the classifier name
    fn name(&self) -> &str;

    /// Labels this classifier can produce
    fn labels(&self) -> &[String];
}

/// Serialized form of a fitted linear classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifierArtifact {
    /// Class labels in model order
    pub classes: Vec<String>,

    /// One weight row per class, or a single row for a binary model
    pub coef: Vec<Vec<f32>>,

    /// One bias per coefficient row
    pub intercept: Vec<f32>,

    /// Vectorizer fitted together with the classifier, if it differs from
    /// the shared one
    #[serde(default)]
    pub vectorizer: Option<TfidfArtifact>,
}

/// Linear one-vs-rest text classifier
pub struct LinearCategoryClassifier {
    name: String,
    classes: Vec<String>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
    vectorizer: Arc<dyn Vectorizer>,
}

impl LinearCategoryClassifier {
    /// Build a classifier from its artifact.
    ///
    /// `shared` is used unless the artifact embeds its own vectorizer.
    pub fn from_artifact(
        name: &str,
        artifact: LinearClassifierArtifact,
        shared: Arc<dyn Vectorizer>,
    ) -> Result<Self> {
        let vectorizer: Arc<dyn Vectorizer> = match artifact.vectorizer {
            Some(embedded) => Arc::new(TfidfVectorizer::from_artifact(name, embedded)?),
            None => shared,
        };

        let classifier = Self {
            name: name.to_string(),
            classes: artifact.classes,
            coef: artifact.coef,
            intercept: artifact.intercept,
            vectorizer,
        };
        classifier.validate()?;

        Ok(classifier)
    }

    /// Decode a JSON artifact
    pub fn from_json_slice(name: &str, bytes: &[u8], shared: Arc<dyn Vectorizer>) -> Result<Self> {
        let artifact: LinearClassifierArtifact =
            serde_json::from_slice(bytes).map_err(|e| Error::artifact_corrupt(name, e))?;
        Self::from_artifact(name, artifact, shared)
    }

    /// Load a JSON artifact from disk
    pub fn from_file(path: impl AsRef<Path>, shared: Arc<dyn Vectorizer>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&path.display().to_string(), &bytes, shared)
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn validate(&self) -> Result<()> {
        let corrupt = |reason: String| Error::artifact_corrupt(&self.name, reason);

        if self.classes.is_empty() {
            return Err(corrupt("no classes".to_string()));
        }
        if self.classes.iter().any(|c| c.trim().is_empty()) {
            return Err(corrupt("blank class label".to_string()));
        }
        if !self.is_binary() && self.coef.len() != self.classes.len() {
            return Err(corrupt(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                self.classes.len()
            )));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(corrupt("intercept length mismatch".to_string()));
        }

        let dimension = self.vectorizer.dimension();
        if let Some(row) = self.coef.iter().find(|row| row.len() != dimension) {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: row.len(),
            });
        }

        Ok(())
    }

    /// Decision value per coefficient row
    fn decision_function(&self, text: &str) -> Vec<f32> {
        let features = self.vectorizer.transform(text);
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| features.dot(row) + bias)
            .collect()
    }

    fn predict(&self, text: &str) -> &str {
        let scores = self.decision_function(text);

        if self.is_binary() {
            return if scores[0] > 0.0 {
                &self.classes[1]
            } else {
                &self.classes[0]
            };
        }

        // Ties resolve to the lowest class index
        let mut best = 0;
        for (idx, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = idx;
            }
        }
        &self.classes[best]
    }
}

#[async_trait]
impl CategoryClassifier for LinearCategoryClassifier {
    async fn categorize(&self, text: &str) -> Result<CategoryLabel> {
        Ok(self.predict(text).to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.classes
    }
}
