use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use nba_forecast::columns::{Decade, Metric, ModelKind};
use nba_forecast::validate::submission_from_json;
use nba_forecast::{ForecastConfig, ForecastError, Forecaster, PredictionReport};

#[derive(Parser)]
#[command(name = "nba_forecast")]
#[command(about = "Forecast points and honours across five NBA decades from a per-game line")]
struct Cli {
    /// Stat as KEY=VALUE (Age, Pos, G, MP, 2P, 2PA, ...). Repeatable; overrides --input.
    #[arg(short, long = "stat", value_name = "KEY=VALUE")]
    stats: Vec<String>,

    /// JSON object with the submission, e.g. {"Age": 25, "Pos": 3, "2P": 5, ...}
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory holding model{ID}.json artifacts
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Accept zero-valued counting stats
    #[arg(long)]
    allow_zero_counts: bool,

    /// Worker threads for model calls (1 = sequential)
    #[arg(long)]
    parallelism: Option<usize>,

    /// Load every model before forecasting
    #[arg(long)]
    preload: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(forecast_err) = err.downcast_ref::<ForecastError>() {
                eprintln!("{}: {forecast_err}", forecast_err.kind());
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ForecastConfig::from_env();
    if let Some(dir) = cli.models_dir {
        config.models_dir = dir;
    }
    if let Some(threads) = cli.parallelism {
        config = config.with_parallelism(threads);
    }
    config.allow_zero_counts |= cli.allow_zero_counts;
    config.preload |= cli.preload;

    let mut fields = match &cli.input {
        Some(path) => read_submission(path)?,
        None => HashMap::new(),
    };
    for pair in &cli.stats {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got {pair:?}"))?;
        fields.insert(key.trim().to_string(), value.trim().to_string());
    }

    let forecaster = Forecaster::open(config)?;
    let report = forecaster.predict(&fields)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn read_submission(path: &Path) -> Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read submission {}", path.display()))?;
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("parse submission {}", path.display()))?;
    Ok(submission_from_json(object))
}

fn print_report(report: &PredictionReport) {
    let s = &report.stats;
    println!(
        "Line: {} {}y, {} G, {:.1} MP | FG {}/{} | TRB {}",
        s.raw.pos, s.raw.age, s.raw.games, s.raw.minutes, s.fg, s.fga, s.trb
    );
    let p = &report.shooting;
    println!(
        "FG% {:.1}  2P% {:.1}  3P% {:.1}  FT% {:.1}  eFG% {:.1}",
        p.fg, p.two, p.three, p.ft, p.efg
    );
    println!("Points from made shots: {:.2}", report.manual_points);
    println!();
    print!("{:<6}", "Decade");
    for metric in Metric::ALL {
        print!(" {:>16}", metric.report_label());
    }
    println!();
    for decade in Decade::ALL {
        let Some(f) = report.get(decade) else {
            continue;
        };
        print!("{:<6}", decade.label());
        for metric in Metric::ALL {
            let value = f.value(metric);
            match metric.kind() {
                ModelKind::Regression => print!(" {value:>16.1}"),
                ModelKind::Classification => print!(" {:>16}", yes_no(value)),
            }
        }
        println!();
    }
    if let Some((decade, gap)) = report.largest_points_gap() {
        println!();
        println!("Largest model vs. arithmetic gap: {gap:+.1} pts ({decade})");
    }
}

fn yes_no(label: f64) -> &'static str {
    if label > 0.0 { "yes" } else { "no" }
}
