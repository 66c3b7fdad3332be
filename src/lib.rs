//! Per-game basketball lines in, derived box scores and per-decade forecasts out.
//!
//! A submission is validated ([`validate`]), extended with shooting percentages and totals
//! ([`derive`]), then scored by twenty externally trained models, one per
//! `(metric, decade)` pair ([`aggregate`]).

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod derive;
pub mod error;
pub mod forecaster;
pub mod invoke;
pub mod model_store;
pub mod stats;
pub mod validate;

use std::collections::HashMap;

pub use aggregate::{DecadeForecast, PredictionReport};
pub use config::ForecastConfig;
pub use error::{ErrorKind, ForecastError, Result};
pub use forecaster::Forecaster;
pub use invoke::ModelId;
pub use model_store::{DirModelStore, ModelStore, StaticModelStore};
pub use stats::{DerivedStatRecord, RawStatInput};

/// One-shot forecast without a long-lived [`Forecaster`].
///
/// A pool sized by `config.parallelism` is built for this call only; use a [`Forecaster`] to
/// keep it across requests.
pub fn predict(
    fields: &HashMap<String, String>,
    store: &dyn ModelStore,
    config: &ForecastConfig,
) -> Result<PredictionReport> {
    let raw = validate::validate(fields, config.policy())?;
    let record = derive::derive(&raw);
    let pool = aggregate::build_pool(config.parallelism);
    aggregate::PredictionAggregator::new(store, pool.as_ref()).aggregate(&record)
}
