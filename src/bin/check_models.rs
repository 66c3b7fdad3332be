use std::path::PathBuf;

use anyhow::{Result, bail};

use nba_forecast::{DirModelStore, ErrorKind, ForecastConfig};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| ForecastConfig::from_env().models_dir);
    let store = DirModelStore::new(dir);

    let outcomes = store.preload();
    let mut failures = 0usize;
    for (id, outcome) in &outcomes {
        match outcome {
            Ok(()) => println!(
                "ok      {:<9} {}",
                id.to_string(),
                store.artifact_path(*id).display()
            ),
            Err(err) => {
                failures += 1;
                println!("{:<7} {:<9} {err}", short_kind(err.kind()), id.to_string());
            }
        }
    }

    println!();
    println!(
        "{}/{} models loaded from {}",
        outcomes.len() - failures,
        outcomes.len(),
        store.dir().display()
    );
    if failures > 0 {
        bail!("{failures} model(s) failed to load");
    }
    Ok(())
}

fn short_kind(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ModelNotFound => "missing",
        ErrorKind::ModelLoad => "broken",
        _ => "error",
    }
}
