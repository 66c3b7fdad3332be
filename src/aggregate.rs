//! Decade x metric fan-out over the model store and report assembly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{info, warn};
use rayon::ThreadPool;
use rayon::prelude::*;
use serde::ser::Serializer;
use serde::Serialize;

use crate::columns::{Decade, Metric};
use crate::derive::round_to;
use crate::error::{ForecastError, Result};
use crate::invoke::{ModelId, ModelInvoker, Prediction};
use crate::model_store::ModelStore;
use crate::stats::{DerivedStatRecord, FeatureVector, RawStatInput, ShootingSummary};

/// The four model outputs for one decade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecadeForecast {
    #[serde(rename = "PuntosPorPartido")]
    pub points_per_game: f64,
    #[serde(rename = "AllStar")]
    pub all_star: i64,
    #[serde(rename = "MVPTop5")]
    pub mvp_top5: i64,
    #[serde(rename = "AllNBA")]
    pub all_nba: i64,
}

impl DecadeForecast {
    /// Output for `metric`, with class labels widened to `f64`.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Ppg => self.points_per_game,
            Metric::AllStar => self.all_star as f64,
            Metric::MvpTop5 => self.mvp_top5 as f64,
            Metric::AllNba => self.all_nba as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    /// One entry per decade, chronological.
    #[serde(rename = "results", serialize_with = "serialize_decades")]
    pub decades: Vec<(Decade, DecadeForecast)>,
    #[serde(rename = "manualPoints")]
    pub manual_points: f64,
    #[serde(rename = "percentages")]
    pub shooting: ShootingSummary,
    pub stats: DerivedStatRecord,
}

impl PredictionReport {
    pub fn get(&self, decade: Decade) -> Option<&DecadeForecast> {
        self.decades
            .iter()
            .find(|(d, _)| *d == decade)
            .map(|(_, f)| f)
    }

    /// Model points minus the arithmetic points for `decade`.
    pub fn points_gap(&self, decade: Decade) -> Option<f64> {
        self.get(decade)
            .map(|f| f.points_per_game - self.manual_points)
    }

    pub fn largest_points_gap(&self) -> Option<(Decade, f64)> {
        self.decades
            .iter()
            .map(|(d, f)| (*d, f.points_per_game - self.manual_points))
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
    }
}

fn serialize_decades<S: Serializer>(
    decades: &[(Decade, DecadeForecast)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(decades.iter().map(|(d, f)| (d.label(), f)))
}

/// Points from made shots alone: `FT + 2*2P + 3*3P`, at two decimals.
pub fn manual_points(raw: &RawStatInput) -> f64 {
    round_to(raw.ft_made + raw.two_made * 2.0 + raw.three_made * 3.0, 2)
}

/// Runs all twenty models for one derived record. Any failure aborts the whole report.
pub struct PredictionAggregator<'a> {
    invoker: ModelInvoker<'a>,
    pool: Option<&'a ThreadPool>,
}

impl<'a> PredictionAggregator<'a> {
    /// With `pool == None` models run on the calling thread in decade order.
    pub fn new(store: &'a dyn ModelStore, pool: Option<&'a ThreadPool>) -> Self {
        Self {
            invoker: ModelInvoker::new(store),
            pool,
        }
    }

    pub fn aggregate(&self, record: &DerivedStatRecord) -> Result<PredictionReport> {
        let features = record.features();
        let ids = ModelId::all();

        let outputs = match self.pool {
            Some(pool) => pool.install(|| fan_out(&self.invoker, &ids, &features)),
            None => ids
                .iter()
                .map(|&id| Ok((id, self.invoker.invoke(id, &features)?)))
                .collect::<Result<Vec<_>>>(),
        }
        .inspect_err(|e| warn!("forecast aborted: {e}"))?;
        let outputs: HashMap<ModelId, Prediction> = outputs.into_iter().collect();

        let mut decades = Vec::with_capacity(Decade::ALL.len());
        for decade in Decade::ALL {
            let pick = |metric: Metric| -> Result<Prediction> {
                let id = ModelId::new(metric, decade);
                outputs
                    .get(&id)
                    .copied()
                    .ok_or_else(|| ForecastError::prediction(id, "no output collected"))
            };
            decades.push((
                decade,
                DecadeForecast {
                    points_per_game: pick(Metric::Ppg)?.as_f64(),
                    all_star: label(pick(Metric::AllStar)?),
                    mvp_top5: label(pick(Metric::MvpTop5)?),
                    all_nba: label(pick(Metric::AllNba)?),
                },
            ));
        }

        let report = PredictionReport {
            decades,
            manual_points: manual_points(&record.raw),
            shooting: record.shooting(),
            stats: *record,
        };
        info!(
            "forecast ready: {} decades, manual points {:.2}",
            report.decades.len(),
            report.manual_points
        );
        Ok(report)
    }
}

fn label(prediction: Prediction) -> i64 {
    match prediction {
        Prediction::Label(v) => v,
        Prediction::Points(v) => v.round() as i64,
    }
}

/// Parallel invocation. The first error to complete wins; once it is recorded, jobs that have
/// not started yet are skipped.
fn fan_out(
    invoker: &ModelInvoker<'_>,
    ids: &[ModelId],
    features: &FeatureVector,
) -> Result<Vec<(ModelId, Prediction)>> {
    let failed = AtomicBool::new(false);
    let first_error: Mutex<Option<ForecastError>> = Mutex::new(None);

    let outputs: Vec<Option<(ModelId, Prediction)>> = ids
        .par_iter()
        .map(|&id| {
            if failed.load(Ordering::Acquire) {
                return None;
            }
            match invoker.invoke(id, features) {
                Ok(p) => Some((id, p)),
                Err(e) => {
                    let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    failed.store(true, Ordering::Release);
                    None
                }
            }
        })
        .collect();

    if let Some(err) = first_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        return Err(err);
    }
    Ok(outputs.into_iter().flatten().collect())
}

pub(crate) fn build_pool(threads: usize) -> Option<ThreadPool> {
    if threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("forecast-{idx}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("falling back to sequential model calls: {e}");
            None
        }
    }
}
