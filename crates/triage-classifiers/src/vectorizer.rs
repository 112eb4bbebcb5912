//! Text vectorization for incident descriptions
//!
//! The vectorizer is fitted offline; at inference time it only maps text onto
//! its frozen vocabulary. The same instance is shared by the category
//! classifier (unless the classifier ships its own) and every risk model.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use triage_core::{Error, FeatureVector, Result};

/// Maps raw text to a fixed-dimension feature vector
pub trait Vectorizer: Send + Sync {
    /// Vectorize the given text
    fn transform(&self, text: &str) -> FeatureVector;

    /// Output dimension; fixed for the lifetime of the vectorizer
    fn dimension(&self) -> usize;
}

/// Normalization applied to each output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

/// Serialized form of a fitted TF-IDF vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfArtifact {
    /// Term to column index
    pub vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per column
    pub idf: Vec<f32>,

    #[serde(default = "default_true")]
    pub lowercase: bool,

    /// Inclusive n-gram bounds
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    /// Replace raw counts with `1 + ln(tf)`
    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub norm: Norm,

    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,

    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

/// TF-IDF vectorizer over a frozen vocabulary
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    lowercase: bool,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
    token_pattern: Regex,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    /// Build a vectorizer from its artifact, validating shapes
    pub fn from_artifact(name: &str, artifact: TfidfArtifact) -> Result<Self> {
        if artifact.idf.is_empty() {
            return Err(Error::artifact_corrupt(name, "idf vector is empty"));
        }

        if let Some((term, idx)) = artifact
            .vocabulary
            .iter()
            .find(|(_, idx)| **idx >= artifact.idf.len())
        {
            return Err(Error::artifact_corrupt(
                name,
                format!(
                    "term '{}' maps to column {} but idf has {} entries",
                    term,
                    idx,
                    artifact.idf.len()
                ),
            ));
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::artifact_corrupt(
                name,
                format!("invalid ngram_range ({}, {})", min_n, max_n),
            ));
        }

        let token_pattern = Regex::new(&artifact.token_pattern)
            .map_err(|e| Error::artifact_corrupt(name, format!("token_pattern: {}", e)))?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            token_pattern,
            stop_words: artifact.stop_words.into_iter().collect(),
        })
    }

    /// Decode a JSON artifact
    pub fn from_json_slice(name: &str, bytes: &[u8]) -> Result<Self> {
        let artifact: TfidfArtifact =
            serde_json::from_slice(bytes).map_err(|e| Error::artifact_corrupt(name, e))?;
        Self::from_artifact(name, artifact)
    }

    /// Load a JSON artifact from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&path.display().to_string(), &bytes)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        self.token_pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    fn term_counts(&self, tokens: &[String]) -> HashMap<usize, f32> {
        let mut counts = HashMap::new();
        let (min_n, max_n) = self.ngram_range;

        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&idx) = self.vocabulary.get(&term) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        counts
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> FeatureVector {
        let tokens = self.tokenize(text);
        let counts = self.term_counts(&tokens);

        let weighted = counts.into_iter().map(|(idx, tf)| {
            let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
            (idx, tf * self.idf[idx])
        });

        let mut features = FeatureVector::from_pairs(self.idf.len(), weighted);

        if self.norm == Norm::L2 {
            let norm = features.squared_norm().sqrt();
            if norm > 0.0 {
                features.scale(1.0 / norm);
            }
        }

        features
    }

    fn dimension(&self) -> usize {
        self.idf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_artifact() -> TfidfArtifact {
        TfidfArtifact {
            vocabulary: [("loud", 0), ("noise", 1), ("fire", 2), ("loud noise", 3)]
                .into_iter()
                .map(|(t, i)| (t.to_string(), i))
                .collect(),
            idf: vec![1.0, 1.0, 2.0, 1.5],
            lowercase: true,
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Norm::None,
            token_pattern: default_token_pattern(),
            stop_words: vec![],
        }
    }

    #[test]
    fn test_transform_counts_known_terms() {
        let vectorizer = TfidfVectorizer::from_artifact("tfidf", base_artifact()).unwrap();
        let features = vectorizer.transform("LOUD noise, loud music and a fire");

        assert_eq!(features.dimension(), 4);
        assert_eq!(features.get(0), 2.0);
        assert_eq!(features.get(1), 1.0);
        assert_eq!(features.get(2), 2.0);
        assert_eq!(features.get(3), 0.0);
    }

    #[test]
    fn test_bigrams_and_l2_norm() {
        let mut artifact = base_artifact();
        artifact.ngram_range = (1, 2);
        artifact.norm = Norm::L2;
        let vectorizer = TfidfVectorizer::from_artifact("tfidf", artifact).unwrap();

        let features = vectorizer.transform("loud noise");
        assert!(features.get(3) > 0.0);
        assert!((features.squared_norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sublinear_tf_and_stop_words() {
        let mut artifact = base_artifact();
        artifact.sublinear_tf = true;
        artifact.stop_words = vec!["noise".to_string()];
        let vectorizer = TfidfVectorizer::from_artifact("tfidf", artifact).unwrap();

        let features = vectorizer.transform("loud loud noise");
        assert!((features.get(0) - (1.0 + 2f32.ln())).abs() < 1e-6);
        assert_eq!(features.get(1), 0.0);
    }

    #[test]
    fn test_single_char_tokens_are_ignored() {
        let vectorizer = TfidfVectorizer::from_artifact("tfidf", base_artifact()).unwrap();
        assert!(vectorizer.transform("a b c").is_zero());
        assert!(vectorizer.transform("").is_zero());
    }

    #[test]
    fn test_rejects_out_of_range_vocabulary() {
        let mut artifact = base_artifact();
        artifact.vocabulary.insert("smoke".to_string(), 9);
        let err = TfidfVectorizer::from_artifact("tfidf", artifact).unwrap_err();
        assert!(matches!(err, Error::ArtifactCorrupt { .. }));
    }

    #[test]
    fn test_json_defaults() {
        let json = br#"{"vocabulary": {"theft": 0, "bike": 1}, "idf": [1.2, 1.7]}"#;
        let vectorizer = TfidfVectorizer::from_json_slice("tfidf", json).unwrap();
        assert_eq!(vectorizer.dimension(), 2);

        let features = vectorizer.transform("Bike theft near the station");
        assert!((features.squared_norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let err = TfidfVectorizer::from_json_slice("tfidf", b"not json").unwrap_err();
        assert!(matches!(err, Error::ArtifactCorrupt { .. }));
    }
}
