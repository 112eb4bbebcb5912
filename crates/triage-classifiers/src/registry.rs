//! Risk model registry
//!
//! Resolves a category to its (cluster model, risk label map) pair. Both
//! artifacts are addressed by the normalized category key:
//!
//! - `{key}_kmeans` - fitted cluster centers
//! - `{key}_risk_map` - cluster id to risk label
//!
//! Resolved pairs are cached for the life of the registry. Each key has its
//! own once-cell, so concurrent first lookups of one category load the
//! artifacts once while lookups of other categories proceed independently.
//! Missing or broken artifacts are never cached; the next lookup checks the
//! store again.

use crate::artifact_store::ArtifactStore;
use crate::cluster::{ClusterModel, KMeansModel};
use crate::risk_map::RiskLabelMap;
use crate::telemetry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};
use triage_core::{CategoryKey, ClusterId, Error, FeatureVector, Result, RiskLabel};

/// Naming convention for per-category artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNaming {
    pub kmeans_suffix: String,
    pub risk_map_suffix: String,
}

impl ArtifactNaming {
    pub fn kmeans_name(&self, key: &CategoryKey) -> String {
        format!("{}{}", key, self.kmeans_suffix)
    }

    pub fn risk_map_name(&self, key: &CategoryKey) -> String {
        format!("{}{}", key, self.risk_map_suffix)
    }
}

impl Default for ArtifactNaming {
    fn default() -> Self {
        Self {
            kmeans_suffix: "_kmeans".to_string(),
            risk_map_suffix: "_risk_map".to_string(),
        }
    }
}

/// Cluster model and risk map for one category. Immutable once built.
pub struct RiskModel {
    key: CategoryKey,
    cluster_model: Arc<dyn ClusterModel>,
    risk_map: RiskLabelMap,
}

impl RiskModel {
    pub fn new(
        key: CategoryKey,
        cluster_model: Arc<dyn ClusterModel>,
        risk_map: RiskLabelMap,
    ) -> Self {
        Self {
            key,
            cluster_model,
            risk_map,
        }
    }

    pub fn key(&self) -> &CategoryKey {
        &self.key
    }

    pub fn cluster_model(&self) -> &Arc<dyn ClusterModel> {
        &self.cluster_model
    }

    pub fn risk_map(&self) -> &RiskLabelMap {
        &self.risk_map
    }

    /// Cluster the features
    pub fn cluster(&self, features: &FeatureVector) -> Result<ClusterId> {
        self.cluster_model.cluster(features)
    }

    /// Risk label for a cluster id, `Unknown` when unmapped
    pub fn label_for(&self, id: ClusterId) -> RiskLabel {
        self.risk_map.label_for(id)
    }
}

impl fmt::Debug for RiskModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskModel")
            .field("key", &self.key)
            .field("n_clusters", &self.cluster_model.n_clusters())
            .field("dimension", &self.cluster_model.dimension())
            .field("risk_map", &self.risk_map)
            .finish()
    }
}

/// Outcome of a registry lookup
#[derive(Debug)]
pub enum Resolution {
    /// Both artifacts exist and loaded
    Hit(Arc<RiskModel>),
    /// At least one artifact does not exist
    Missing,
    /// Artifacts exist but could not be loaded
    Failed(Error),
}

impl Resolution {
    pub fn into_model(self) -> Option<Arc<RiskModel>> {
        match self {
            Self::Hit(model) => Some(model),
            Self::Missing | Self::Failed(_) => None,
        }
    }
}

/// Snapshot of registry counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Artifact pairs read from the store
    pub loads: u64,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups for categories without artifacts
    pub misses: u64,
    /// Lookups whose artifacts failed to load
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    loads: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

type EntryCell = Arc<OnceCell<Arc<RiskModel>>>;

/// Lazily populated, concurrent cache of per-category risk models
pub struct RiskModelRegistry {
    store: Arc<dyn ArtifactStore>,
    naming: ArtifactNaming,
    expected_dimension: Option<usize>,
    entries: Mutex<HashMap<CategoryKey, EntryCell>>,
    counters: Counters,
}

impl RiskModelRegistry {
    /// Create a registry over an artifact store
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            naming: ArtifactNaming::default(),
            expected_dimension: None,
            entries: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Override the artifact naming convention
    pub fn with_naming(mut self, naming: ArtifactNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Reject cluster models fitted against a different feature dimension
    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    pub fn naming(&self) -> &ArtifactNaming {
        &self.naming
    }

    pub fn expected_dimension(&self) -> Option<usize> {
        self.expected_dimension
    }

    /// Resolve a category to its risk model, if one is available
    pub async fn resolve(&self, category: &str) -> Option<Arc<RiskModel>> {
        self.lookup(category).await.into_model()
    }

    /// Resolve a category, distinguishing missing from broken artifacts
    pub async fn lookup(&self, category: &str) -> Resolution {
        let key = CategoryKey::from_label(category);
        let cell = self.cell_for(&key);

        if let Some(model) = cell.get() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Resolution::Hit(Arc::clone(model));
        }

        let mut loaded_here = false;
        let result = cell
            .get_or_try_init(|| {
                loaded_here = true;
                self.load(&key)
            })
            .await
            .map(Arc::clone);

        match result {
            Ok(model) => {
                // Waited on another caller's load
                if !loaded_here {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                }
                Resolution::Hit(model)
            }
            Err(Error::ArtifactMissing(name)) => {
                self.discard_empty(&key, &cell);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!("No risk model for '{}': {} not found", key, name);
                Resolution::Missing
            }
            Err(e) => {
                self.discard_empty(&key, &cell);
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::RISK_MODEL_LOADS_TOTAL, "result" => "failed")
                    .increment(1);
                if matches!(e, Error::DimensionMismatch { .. }) {
                    error!("Risk model for '{}' does not fit the vectorizer: {}", key, e);
                } else {
                    warn!("Failed to load risk model for '{}': {}", key, e);
                }
                Resolution::Failed(e)
            }
        }
    }

    fn cell_for(&self, key: &CategoryKey) -> EntryCell {
        let mut entries = self.entries.lock();
        Arc::clone(entries.entry(key.clone()).or_default())
    }

    /// Drop a cell that is still unresolved so failed lookups leave no entry
    fn discard_empty(&self, key: &CategoryKey, cell: &EntryCell) {
        let mut entries = self.entries.lock();
        if let Some(current) = entries.get(key) {
            if Arc::ptr_eq(current, cell) && !current.initialized() {
                entries.remove(key);
            }
        }
    }

    async fn load(&self, key: &CategoryKey) -> Result<Arc<RiskModel>> {
        let kmeans_name = self.naming.kmeans_name(key);
        let risk_map_name = self.naming.risk_map_name(key);

        for name in [&kmeans_name, &risk_map_name] {
            if !self.store.exists(name).await? {
                return Err(Error::artifact_missing(name.as_str()));
            }
        }

        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        let kmeans_bytes = self.store.read(&kmeans_name).await?;
        let risk_map_bytes = self.store.read(&risk_map_name).await?;

        let cluster_model = KMeansModel::from_json_slice(&kmeans_name, &kmeans_bytes)?;
        if let Some(expected) = self.expected_dimension {
            if cluster_model.dimension() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: cluster_model.dimension(),
                });
            }
        }

        let risk_map = RiskLabelMap::from_json_slice(&risk_map_name, &risk_map_bytes)?;
        let uncovered = (0..cluster_model.n_clusters())
            .filter(|id| risk_map.get(*id).is_none())
            .count();
        if uncovered > 0 {
            warn!(
                "Risk map for '{}' leaves {} of {} clusters unmapped",
                key,
                uncovered,
                cluster_model.n_clusters()
            );
        }

        info!(
            "Loaded risk model for '{}' from {} ({} clusters)",
            key,
            self.store.location(),
            cluster_model.n_clusters()
        );
        metrics::counter!(telemetry::RISK_MODEL_LOADS_TOTAL, "result" => "loaded").increment(1);

        Ok(Arc::new(RiskModel::new(
            key.clone(),
            Arc::new(cluster_model),
            risk_map,
        )))
    }

    /// Eagerly resolve categories at startup.
    ///
    /// Missing artifacts are fine; broken ones fail the preload. Returns the
    /// number of categories that resolved.
    pub async fn preload(&self, categories: &[String]) -> Result<usize> {
        let mut loaded = 0;
        for category in categories {
            match self.lookup(category).await {
                Resolution::Hit(_) => loaded += 1,
                Resolution::Missing => info!("No risk model to preload for '{}'", category),
                Resolution::Failed(e) => return Err(e),
            }
        }
        Ok(loaded)
    }

    /// Drop the cached entry for a category. Returns whether one was cached.
    pub fn invalidate(&self, category: &str) -> bool {
        let key = CategoryKey::from_label(category);
        self.entries
            .lock()
            .remove(&key)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }

    /// Drop every cached entry. Returns how many resolved entries were dropped.
    pub fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let dropped = entries.values().filter(|cell| cell.initialized()).count();
        entries.clear();
        info!("Invalidated {} cached risk models", dropped);
        dropped
    }

    /// Keys with a cached risk model, sorted
    pub fn cached_keys(&self) -> Vec<CategoryKey> {
        let mut keys: Vec<CategoryKey> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}
