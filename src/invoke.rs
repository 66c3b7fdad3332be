use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Serialize, Serializer};

use crate::columns::{Decade, Metric, ModelKind};
use crate::error::{ForecastError, Result};
use crate::model_store::ModelStore;
use crate::stats::FeatureVector;

/// Name of one trained model: `{metric prefix}{decade}`, e.g. `PPG80s` or `MVP5_10s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    pub metric: Metric,
    pub decade: Decade,
}

impl ModelId {
    pub fn new(metric: Metric, decade: Decade) -> Self {
        Self { metric, decade }
    }

    /// Every model the forecaster needs, decade-major.
    pub fn all() -> Vec<ModelId> {
        Decade::ALL
            .into_iter()
            .flat_map(|decade| Metric::ALL.into_iter().map(move |metric| ModelId::new(metric, decade)))
            .collect()
    }

    pub fn artifact_file_name(self) -> String {
        format!("model{self}.json")
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.metric.prefix(), self.decade.label())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        for metric in Metric::ALL {
            let Some(rest) = s.strip_prefix(metric.prefix()) else {
                continue;
            };
            if let Some(decade) = Decade::from_label(rest) {
                return Ok(ModelId::new(metric, decade));
            }
        }
        Err(format!("not a model id: {s:?}"))
    }
}

impl Serialize for ModelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One model output, typed by the metric it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Points(f64),
    Label(i64),
}

impl Prediction {
    pub fn as_f64(self) -> f64 {
        match self {
            Prediction::Points(v) => v,
            Prediction::Label(v) => v as f64,
        }
    }
}

/// Calls named models held by a [`ModelStore`].
pub struct ModelInvoker<'a> {
    store: &'a dyn ModelStore,
}

impl<'a> ModelInvoker<'a> {
    pub fn new(store: &'a dyn ModelStore) -> Self {
        Self { store }
    }

    pub fn invoke(&self, id: ModelId, features: &FeatureVector) -> Result<Prediction> {
        let model = self.store.load(id)?;
        let raw = model.predict(features)?;
        if !raw.is_finite() {
            return Err(ForecastError::prediction(id, format!("model returned {raw}")));
        }
        let out = match id.metric.kind() {
            ModelKind::Regression => Prediction::Points(raw),
            ModelKind::Classification => Prediction::Label(raw.round() as i64),
        };
        debug!("{id} -> {out:?}");
        Ok(out)
    }
}
