//! Cluster id to risk label mapping

use std::collections::{BTreeMap, HashMap};
use triage_core::{ClusterId, Error, Result, RiskLabel, UNKNOWN};

/// Fixed mapping from cluster id to a human-readable risk level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskLabelMap {
    labels: HashMap<ClusterId, RiskLabel>,
}

impl RiskLabelMap {
    pub fn new(labels: HashMap<ClusterId, RiskLabel>) -> Self {
        Self { labels }
    }

    /// Decode a JSON object keyed by decimal cluster ids
    pub fn from_json_slice(name: &str, bytes: &[u8]) -> Result<Self> {
        let raw: BTreeMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| Error::artifact_corrupt(name, e))?;

        let mut labels = HashMap::with_capacity(raw.len());
        for (key, label) in raw {
            let id = key.trim().parse::<ClusterId>().map_err(|_| {
                Error::artifact_corrupt(name, format!("'{}' is not a cluster id", key))
            })?;
            labels.insert(id, label);
        }

        Ok(Self { labels })
    }

    /// Risk label for a cluster, `Unknown` when the map does not cover it
    pub fn label_for(&self, id: ClusterId) -> RiskLabel {
        self.get(id).unwrap_or(UNKNOWN).to_string()
    }

    /// Risk label for a cluster, if mapped
    pub fn get(&self, id: ClusterId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(ClusterId, RiskLabel)> for RiskLabelMap {
    fn from_iter<T: IntoIterator<Item = (ClusterId, RiskLabel)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        let map = RiskLabelMap::from_json_slice(
            "risk_map",
            br#"{"0": "Low", "1": "Moderate", "2": "High"}"#,
        )
        .unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.label_for(0), "Low");
        assert_eq!(map.label_for(2), "High");
    }

    #[test]
    fn test_unmapped_cluster_is_unknown() {
        let map: RiskLabelMap = [(0, "Low".to_string())].into_iter().collect();
        assert_eq!(map.label_for(7), "Unknown");
        assert!(map.get(7).is_none());
    }

    #[test]
    fn test_non_numeric_key_is_corrupt() {
        let err = RiskLabelMap::from_json_slice("risk_map", br#"{"low": "Low"}"#).unwrap_err();
        assert!(matches!(err, Error::ArtifactCorrupt { .. }));
    }
}
