//! Model Store: resolves a [`ModelId`] to something that can score a feature vector.
//!
//! [`DirModelStore`] reads one JSON artifact per model from a directory and keeps each
//! deserialized model behind its own `OnceCell`, so concurrent first callers for the same id
//! wait on a single load and never see a half-built model.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::columns::{FEATURE_COLUMNS, ModelKind};
use crate::error::{ForecastError, Result};
use crate::invoke::ModelId;
use crate::stats::FeatureVector;

pub trait Model: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

impl<F> Model for F
where
    F: Fn(&FeatureVector) -> Result<f64> + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self(features)
    }
}

pub trait ModelStore: Send + Sync {
    fn load(&self, id: ModelId) -> Result<Arc<dyn Model>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_id: String,
    pub kind: ModelKind,
    pub feature_names: Vec<String>,
    pub coeffs: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default)]
    pub feature_means: Vec<f64>,
    #[serde(default)]
    pub feature_stds: Vec<f64>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<String>,
}

fn default_threshold() -> f64 {
    0.5
}

impl ModelArtifact {
    /// Unit-free artifact over the standard columns, handy for tests and demos.
    pub fn linear(id: ModelId, intercept: f64, coeffs: Vec<f64>) -> Self {
        Self {
            model_id: id.to_string(),
            kind: id.metric.kind(),
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            coeffs,
            intercept,
            feature_means: Vec::new(),
            feature_stds: Vec::new(),
            threshold: default_threshold(),
            trained_at: None,
            source: None,
        }
    }
}

/// Linear scorer: regression output is the score itself, classification applies a logistic
/// link and thresholds it into a 0/1 label.
#[derive(Debug, Clone)]
pub struct LinearModel {
    id: ModelId,
    artifact: ModelArtifact,
}

impl LinearModel {
    pub fn from_artifact(id: ModelId, artifact: ModelArtifact) -> Result<Self> {
        if artifact.model_id != id.to_string() {
            return Err(ForecastError::load(
                id,
                format!("artifact is labelled {:?}", artifact.model_id),
            ));
        }
        if artifact.kind != id.metric.kind() {
            return Err(ForecastError::load(
                id,
                format!("artifact kind {:?} does not fit metric {:?}", artifact.kind, id.metric),
            ));
        }
        let n = artifact.feature_names.len();
        if artifact.coeffs.len() != n {
            return Err(ForecastError::load(
                id,
                format!("{} coefficients for {} features", artifact.coeffs.len(), n),
            ));
        }
        for (name, values) in [("means", &artifact.feature_means), ("stds", &artifact.feature_stds)] {
            if !values.is_empty() && values.len() != n {
                return Err(ForecastError::load(
                    id,
                    format!("{} feature {name} for {n} features", values.len()),
                ));
            }
        }
        Ok(Self { id, artifact })
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    fn standardized(&self, raw: f64, idx: usize) -> f64 {
        if self.artifact.feature_means.is_empty() && self.artifact.feature_stds.is_empty() {
            return raw;
        }
        let mean = self.artifact.feature_means.get(idx).copied().unwrap_or(0.0);
        let std = self
            .artifact
            .feature_stds
            .get(idx)
            .copied()
            .unwrap_or(1.0)
            .max(1e-6);
        (raw - mean) / std
    }
}

impl Model for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        if let Some(problem) = features.mismatch_against(&self.artifact.feature_names) {
            return Err(ForecastError::prediction(self.id(), problem));
        }
        let score = self.artifact.intercept
            + features
                .values()
                .iter()
                .zip(&self.artifact.coeffs)
                .enumerate()
                .map(|(idx, (x, c))| c * self.standardized(*x, idx))
                .sum::<f64>();
        let out = match self.artifact.kind {
            ModelKind::Regression => score,
            ModelKind::Classification => {
                if sigmoid(score) >= self.artifact.threshold {
                    1.0
                } else {
                    0.0
                }
            }
        };
        Ok(out)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Reads `model{id}.json` artifacts from one directory, each at most once.
pub struct DirModelStore {
    dir: PathBuf,
    slots: Mutex<HashMap<ModelId, Arc<OnceCell<Arc<LinearModel>>>>>,
    loads: AtomicUsize,
}

impl DirModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            slots: Mutex::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, id: ModelId) -> PathBuf {
        self.dir.join(id.artifact_file_name())
    }

    /// Number of artifacts deserialized so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Load every model up front. Returns the outcome per id in [`ModelId::all`] order.
    ///
    /// Loads run on the current rayon pool; call from `ThreadPool::install` to bound them.
    pub fn preload(&self) -> Vec<(ModelId, Result<()>)> {
        ModelId::all()
            .into_par_iter()
            .map(|id| (id, self.load(id).map(|_| ())))
            .collect()
    }

    fn slot(&self, id: ModelId) -> Arc<OnceCell<Arc<LinearModel>>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(id).or_default().clone()
    }

    fn read_artifact(&self, id: ModelId) -> Result<Arc<LinearModel>> {
        let path = self.artifact_path(id);
        if !path.exists() {
            return Err(ForecastError::ModelNotFound {
                id,
                location: path.display().to_string(),
            });
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| ForecastError::load(id, format!("read {}: {e}", path.display())))?;
        let artifact = serde_json::from_str::<ModelArtifact>(&raw)
            .map_err(|e| ForecastError::load(id, format!("parse {}: {e}", path.display())))?;
        let model = LinearModel::from_artifact(id, artifact)?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        debug!(
            "loaded {} from {} (trained {})",
            model.id(),
            path.display(),
            model
                .artifact()
                .trained_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(Arc::new(model))
    }
}

impl ModelStore for DirModelStore {
    fn load(&self, id: ModelId) -> Result<Arc<dyn Model>> {
        let slot = self.slot(id);
        let model = slot
            .get_or_try_init(|| self.read_artifact(id))
            .inspect_err(|e| warn!("{e}"))?;
        let model: Arc<dyn Model> = model.clone();
        Ok(model)
    }
}

/// Models held in memory, for embedding pre-built scorers.
#[derive(Default, Clone)]
pub struct StaticModelStore {
    models: HashMap<ModelId, Arc<dyn Model>>,
}

impl StaticModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ModelId, model: Arc<dyn Model>) {
        self.models.insert(id, model);
    }

    pub fn with_model(mut self, id: ModelId, model: Arc<dyn Model>) -> Self {
        self.insert(id, model);
        self
    }

    /// Fill every id with `build(id)`.
    pub fn filled(build: impl Fn(ModelId) -> Arc<dyn Model>) -> Self {
        let mut store = Self::new();
        for id in ModelId::all() {
            store.insert(id, build(id));
        }
        store
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelStore for StaticModelStore {
    fn load(&self, id: ModelId) -> Result<Arc<dyn Model>> {
        self.models
            .get(&id)
            .cloned()
            .ok_or_else(|| ForecastError::ModelNotFound {
                id,
                location: "in-memory store".to_string(),
            })
    }
}
