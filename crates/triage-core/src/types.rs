//! Core types for triage

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel label for "could not be determined"
pub const UNKNOWN: &str = "Unknown";

/// Sentinel label returned while the core models are unavailable
pub const MODEL_NOT_LOADED: &str = "Model not loaded";

/// Incident category produced by the category classifier
pub type CategoryLabel = String;

/// Risk level, either cluster-derived or one of the sentinels
pub type RiskLabel = String;

/// Raw output of a cluster model, meaningful only to the model that produced it
pub type ClusterId = usize;

/// Normalized category used to address risk artifacts.
///
/// Lowercase, with every space replaced by an underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey(String);

impl CategoryKey {
    /// Derive the key for a category label
    pub fn from_label(label: &str) -> Self {
        Self(label.replace(' ', "_").to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CategoryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sparse, fixed-dimension feature vector.
///
/// Entries are kept sorted by column index with no duplicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f32)>,
}

impl FeatureVector {
    /// An all-zero vector
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build a vector from `(index, value)` pairs.
    ///
    /// Duplicate indices are summed, zeros dropped, and indices outside the
    /// dimension ignored.
    pub fn from_pairs(dimension: usize, pairs: impl IntoIterator<Item = (usize, f32)>) -> Self {
        let mut pairs: Vec<(usize, f32)> = pairs
            .into_iter()
            .filter(|(idx, _)| *idx < dimension)
            .collect();
        pairs.sort_by_key(|(idx, _)| *idx);

        let mut entries: Vec<(usize, f32)> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            match entries.last_mut() {
                Some((last, acc)) if *last == idx => *acc += value,
                _ => entries.push((idx, value)),
            }
        }
        entries.retain(|(_, value)| *value != 0.0);

        Self { dimension, entries }
    }

    /// Build a sparse vector from a dense slice
    pub fn from_dense(values: &[f32]) -> Self {
        Self::from_pairs(values.len(), values.iter().copied().enumerate())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.entries.iter().copied()
    }

    /// Value at a column, zero when not stored
    pub fn get(&self, index: usize) -> f32 {
        self.entries
            .binary_search_by_key(&index, |(idx, _)| *idx)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product against a dense row of the same dimension
    pub fn dot(&self, dense: &[f32]) -> f32 {
        self.entries
            .iter()
            .filter_map(|(idx, value)| dense.get(*idx).map(|w| w * value))
            .sum()
    }

    pub fn squared_norm(&self) -> f32 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }

    /// Scale every entry in place
    pub fn scale(&mut self, factor: f32) {
        for (_, value) in &mut self.entries {
            *value *= factor;
        }
    }

    pub fn to_dense(&self) -> Vec<f32> {
        let mut dense = vec![0.0; self.dimension];
        for (idx, value) in &self.entries {
            dense[*idx] = *value;
        }
        dense
    }
}

/// Category and risk pair returned for every classification request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: CategoryLabel,
    pub risk: RiskLabel,
}

impl PredictionResult {
    pub fn new(category: impl Into<String>, risk: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            risk: risk.into(),
        }
    }

    /// `Unknown` / `Unknown`
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    /// `Model not loaded` / `Model not loaded`
    pub fn model_not_loaded() -> Self {
        Self::new(MODEL_NOT_LOADED, MODEL_NOT_LOADED)
    }

    /// A known category whose risk could not be determined
    pub fn unknown_risk(category: impl Into<String>) -> Self {
        Self::new(category, UNKNOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_key_normalization() {
        assert_eq!(
            CategoryKey::from_label("Noise Complaint").as_str(),
            "noise_complaint"
        );
        assert_eq!(CategoryKey::from_label("fire").as_str(), "fire");
        assert_eq!(
            CategoryKey::from_label("Road  Hazard").as_str(),
            "road__hazard"
        );
    }

    #[test]
    fn test_feature_vector_merges_and_sorts() {
        let v = FeatureVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (9, 4.0)]);
        assert_eq!(v.dimension(), 5);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 1.5)]);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
    }

    #[test]
    fn test_feature_vector_math() {
        let v = FeatureVector::from_dense(&[0.0, 3.0, 0.0, 4.0]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.squared_norm(), 25.0);
        assert_eq!(v.dot(&[1.0, 1.0, 1.0, 2.0]), 11.0);
        assert_eq!(v.to_dense(), vec![0.0, 3.0, 0.0, 4.0]);
    }

    #[test]
    fn test_prediction_result_serializes_to_wire_shape() {
        let result = PredictionResult::new("Noise Complaint", "High");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"category": "Noise Complaint", "risk": "High"})
        );
        assert_eq!(
            PredictionResult::model_not_loaded(),
            PredictionResult::new("Model not loaded", "Model not loaded")
        );
    }
}
