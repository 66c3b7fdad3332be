use std::env;
use std::path::PathBuf;

use crate::validate::ValidationPolicy;

const DEFAULT_MODELS_DIR: &str = "modelosPrediccion";
const DEFAULT_PARALLELISM: usize = 4;
const MAX_PARALLELISM: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastConfig {
    pub models_dir: PathBuf,
    pub allow_zero_counts: bool,
    /// Worker threads for the model fan-out; 1 runs the models in loop order on the caller.
    pub parallelism: usize,
    pub preload: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            allow_zero_counts: false,
            parallelism: DEFAULT_PARALLELISM,
            preload: false,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let models_dir = env::var("FORECAST_MODELS_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.models_dir);
        let parallelism = env::var("FORECAST_PARALLELISM")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.parallelism);
        Self {
            models_dir,
            allow_zero_counts: env_flag("FORECAST_ALLOW_ZERO_COUNTS", defaults.allow_zero_counts),
            parallelism: clamp_parallelism(parallelism),
            preload: env_flag("FORECAST_PRELOAD", defaults.preload),
        }
    }

    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            allow_zero_counts: self.allow_zero_counts,
        }
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = clamp_parallelism(threads);
        self
    }
}

pub fn clamp_parallelism(threads: usize) -> usize {
    threads.clamp(1, MAX_PARALLELISM)
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
