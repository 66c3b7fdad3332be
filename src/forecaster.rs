use std::collections::HashMap;

use log::info;
use rayon::ThreadPool;

use crate::aggregate::{PredictionAggregator, PredictionReport, build_pool};
use crate::config::ForecastConfig;
use crate::derive::derive;
use crate::error::Result;
use crate::invoke::ModelId;
use crate::model_store::{DirModelStore, ModelStore};
use crate::stats::RawStatInput;
use crate::validate::{validate, validate_record};

/// Validation, derivation and the model fan-out behind one call.
pub struct Forecaster<S> {
    store: S,
    config: ForecastConfig,
    pool: Option<ThreadPool>,
}

impl<S: ModelStore> Forecaster<S> {
    pub fn new(store: S, config: ForecastConfig) -> Self {
        let pool = build_pool(config.parallelism);
        Self {
            store,
            config,
            pool,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Validate a text submission and forecast it.
    pub fn predict(&self, fields: &HashMap<String, String>) -> Result<PredictionReport> {
        let raw = validate(fields, self.config.policy())?;
        self.forecast(&raw)
    }

    /// Same as [`Forecaster::predict`] for an already typed line.
    pub fn predict_record(&self, raw: RawStatInput) -> Result<PredictionReport> {
        let raw = validate_record(raw, self.config.policy())?;
        self.forecast(&raw)
    }

    fn forecast(&self, raw: &RawStatInput) -> Result<PredictionReport> {
        let record = derive(raw);
        PredictionAggregator::new(&self.store, self.pool.as_ref()).aggregate(&record)
    }
}

impl Forecaster<DirModelStore> {
    /// Store rooted at `config.models_dir`; with `config.preload` every artifact is loaded now,
    /// on the forecaster's own pool, and the first failure is returned.
    pub fn open(config: ForecastConfig) -> Result<Self> {
        let forecaster = Self::new(DirModelStore::new(config.models_dir.clone()), config);
        if forecaster.config.preload {
            let store = &forecaster.store;
            let outcomes = match forecaster.pool.as_ref() {
                Some(pool) => pool.install(|| store.preload()),
                None => ModelId::all()
                    .into_iter()
                    .map(|id| (id, store.load(id).map(|_| ())))
                    .collect(),
            };
            for (_, outcome) in outcomes {
                outcome?;
            }
            info!(
                "preloaded {} models from {}",
                store.loads(),
                store.dir().display()
            );
        }
        Ok(forecaster)
    }
}
