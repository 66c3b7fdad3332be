use std::collections::HashMap;
use std::path::PathBuf;

use nba_forecast::columns::Decade;
use nba_forecast::model_store::Model;
use nba_forecast::{DirModelStore, ErrorKind, ForecastConfig, Forecaster, ModelId, ModelStore};

fn fixture_dir(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn scenario_a(overrides: &[(&str, &str)]) -> HashMap<String, String> {
    let mut fields: HashMap<String, String> = [
        ("Age", "25"),
        ("Pos", "3"),
        ("G", "70"),
        ("MP", "30"),
        ("2P", "5"),
        ("2PA", "10"),
        ("3P", "2"),
        ("3PA", "5"),
        ("FT", "3"),
        ("FTA", "4"),
        ("ORB", "1"),
        ("DRB", "5"),
        ("AST", "4"),
        ("STL", "1"),
        ("BLK", "0.5"),
        ("TOV", "2"),
        ("PF", "2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        fields.insert(k.to_string(), v.to_string());
    }
    fields
}

fn config(models: &str) -> ForecastConfig {
    ForecastConfig {
        models_dir: fixture_dir(models),
        ..ForecastConfig::default()
    }
}

#[test]
fn happy_path_produces_full_report() {
    let forecaster = Forecaster::open(config("models")).expect("fixture models should open");
    let report = forecaster.predict(&scenario_a(&[])).expect("scenario A should forecast");

    let s = &report.stats;
    assert_eq!(s.fg, 7.0);
    assert_eq!(s.fga, 15.0);
    assert_eq!(s.fg_pct, 46.7);
    assert_eq!(s.two_pct, 50.0);
    assert_eq!(s.three_pct, 40.0);
    assert_eq!(s.ft_pct, 75.0);
    assert_eq!(s.trb, 6.0);
    assert_eq!(s.efg_pct, 40.0);
    assert_eq!(report.manual_points, 19.0);

    let order: Vec<Decade> = report.decades.iter().map(|(d, _)| *d).collect();
    assert_eq!(order, Decade::ALL);

    let eighties = report.get(Decade::Eighties).unwrap();
    assert!((eighties.points_per_game - 19.4).abs() < 1e-9);
    assert_eq!(
        (eighties.all_star, eighties.mvp_top5, eighties.all_nba),
        (0, 0, 0)
    );
    let tens = report.get(Decade::Tens).unwrap();
    assert!((tens.points_per_game - 18.8).abs() < 1e-9);
    assert_eq!((tens.all_star, tens.mvp_top5, tens.all_nba), (1, 0, 1));
    assert_eq!(report.get(Decade::Nineties).unwrap().all_star, 1);

    let (decade, gap) = report.largest_points_gap().unwrap();
    assert_eq!(decade, Decade::Eighties);
    assert!((gap - 0.4).abs() < 1e-9);

    assert_eq!(report.shooting.fg, 46.7);
    assert_eq!(report.shooting.efg, 40.0);
}

#[test]
fn made_above_attempted_fails_before_any_model_load() {
    let forecaster = Forecaster::open(config("models")).unwrap();
    let err = forecaster
        .predict(&scenario_a(&[("2P", "10"), ("2PA", "5")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RelationalValidation);
    assert_eq!(forecaster.store().loads(), 0);
}

#[test]
fn minutes_out_of_range_names_mp() {
    let forecaster = Forecaster::open(config("models")).unwrap();
    let err = forecaster.predict(&scenario_a(&[("MP", "5")])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RangeValidation);
    assert_eq!(err.field(), Some("MP"));
    assert!(err.to_string().contains("MP"));
}

#[test]
fn zero_shot_line_depends_on_policy() {
    let zeros = scenario_a(&[
        ("2P", "0"),
        ("2PA", "0"),
        ("3P", "0"),
        ("3PA", "0"),
        ("FT", "0"),
        ("FTA", "0"),
    ]);

    let strict = Forecaster::open(config("models")).unwrap();
    let err = strict.predict(&zeros).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.field(), Some("2P"));

    let lenient = Forecaster::open(ForecastConfig {
        allow_zero_counts: true,
        ..config("models")
    })
    .unwrap();
    let report = lenient.predict(&zeros).unwrap();
    let p = report.shooting;
    assert_eq!([p.fg, p.two, p.three, p.ft, p.efg], [0.0; 5]);
    assert_eq!(report.stats.trb, 6.0);
    assert_eq!(report.manual_points, 0.0);
}

#[test]
fn broken_artifact_aborts_whole_forecast() {
    let forecaster = Forecaster::new(
        DirModelStore::new(fixture_dir("broken_models")),
        config("broken_models").with_parallelism(1),
    );
    let err = forecaster.predict(&scenario_a(&[])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelLoad);
    assert_eq!(err.model_id().map(|id| id.to_string()), Some("ASG80s".to_string()));
}

#[test]
fn parallel_forecast_fails_on_broken_store() {
    let forecaster = Forecaster::new(
        DirModelStore::new(fixture_dir("broken_models")),
        config("broken_models").with_parallelism(8),
    );
    let err = forecaster.predict(&scenario_a(&[])).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::ModelLoad | ErrorKind::ModelNotFound | ErrorKind::Prediction
    ));
}

#[test]
fn store_distinguishes_missing_broken_and_misshaped() {
    let store = DirModelStore::new(fixture_dir("broken_models"));
    let ok: ModelId = "PPG80s".parse().unwrap();
    let broken: ModelId = "ASG80s".parse().unwrap();
    let missing: ModelId = "MVP5_80s".parse().unwrap();
    let short: ModelId = "PPG90s".parse().unwrap();

    assert!(store.load(ok).is_ok());
    assert_eq!(store.load(broken).err().map(|e| e.kind()), Some(ErrorKind::ModelLoad));
    assert_eq!(store.load(missing).err().map(|e| e.kind()), Some(ErrorKind::ModelNotFound));

    let forecaster = Forecaster::open(config("models")).unwrap();
    let features = forecaster
        .predict(&scenario_a(&[]))
        .unwrap()
        .stats
        .features();
    let model = store.load(short).expect("24-column artifact still deserializes");
    let err = model.predict(&features).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Prediction);
}

#[test]
fn preload_rejects_incomplete_model_dir() {
    let err = Forecaster::open(ForecastConfig {
        preload: true,
        ..config("broken_models")
    })
    .err()
    .expect("broken dir must not preload");
    assert!(matches!(
        err.kind(),
        ErrorKind::ModelLoad | ErrorKind::ModelNotFound
    ));

    let forecaster = Forecaster::open(ForecastConfig {
        preload: true,
        ..config("models")
    })
    .unwrap();
    assert_eq!(forecaster.store().loads(), 20);
}

#[test]
fn models_are_deserialized_once_across_requests() {
    let forecaster = Forecaster::open(config("models").with_parallelism(6)).unwrap();
    for _ in 0..3 {
        forecaster.predict(&scenario_a(&[])).unwrap();
    }
    assert_eq!(forecaster.store().loads(), 20);
}

#[test]
fn report_serializes_in_decade_order() {
    let forecaster = Forecaster::open(config("models")).unwrap();
    let report = forecaster.predict(&scenario_a(&[])).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let keys: Vec<&String> = json["results"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 5);
    assert_eq!(json["results"]["10s"]["AllNBA"], 1);
    assert_eq!(json["manualPoints"], 19.0);
    assert_eq!(json["percentages"]["FGP"], 46.7);
    assert_eq!(json["stats"]["TRB"], 6.0);
}

#[test]
fn one_shot_predict_matches_forecaster() {
    let store = DirModelStore::new(fixture_dir("models"));
    let cfg = config("models");
    let report = nba_forecast::predict(&scenario_a(&[]), &store, &cfg).unwrap();
    let again = Forecaster::open(cfg).unwrap().predict(&scenario_a(&[])).unwrap();
    assert_eq!(report, again);
}

#[test]
fn typed_lines_go_through_the_same_checks() {
    let forecaster = Forecaster::open(config("models")).unwrap();
    let line: nba_forecast::RawStatInput = serde_json::from_str(
        r#"{"Age": 25, "Pos": 3, "G": 70, "MP": 30, "2P": 5, "2PA": 10, "3P": 2, "3PA": 5,
            "FT": 3, "FTA": 4, "ORB": 1, "DRB": 5, "AST": 4, "STL": 1, "BLK": 0.5,
            "TOV": 2, "PF": 2}"#,
    )
    .unwrap();
    let typed = forecaster.predict_record(line).unwrap();
    let text = forecaster.predict(&scenario_a(&[])).unwrap();
    assert_eq!(typed, text);

    let mut bad = line;
    bad.ft_made = 6.0;
    let err = forecaster.predict_record(bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RelationalValidation);
    assert_eq!(err.field(), Some("FT"));
}

#[test]
fn blank_or_absent_identity_fields_are_missing() {
    let forecaster = Forecaster::open(config("models")).unwrap();
    for field in ["Age", "Pos", "G"] {
        let err = forecaster.predict(&scenario_a(&[(field, " ")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.field(), Some(field));

        let mut fields = scenario_a(&[]);
        fields.remove(field);
        let err = forecaster.predict(&fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.field(), Some(field));
    }
    assert_eq!(forecaster.store().loads(), 0);
}

#[test]
fn json_submission_with_float_encoded_integers() {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(
        r#"{"Age": 25.0, "Pos": 3, "G": 70.0, "MP": 30.0, "2P": 5, "2PA": 10, "3P": 2,
            "3PA": 5, "FT": 3, "FTA": 4, "ORB": 1, "DRB": 5, "AST": 4, "STL": 1,
            "BLK": 0.5, "TOV": "2", "PF": 2}"#,
    )
    .unwrap();
    let fields = nba_forecast::validate::submission_from_json(object);

    let forecaster = Forecaster::open(config("models")).unwrap();
    let from_json = forecaster.predict(&fields).unwrap();
    assert_eq!(from_json, forecaster.predict(&scenario_a(&[])).unwrap());

    let mut fields = fields;
    fields.insert("Age".to_string(), "25.5".to_string());
    let err = forecaster.predict(&fields).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(err.field(), Some("Age"));
}

#[test]
fn one_shot_predict_honours_parallelism() {
    let store = DirModelStore::new(fixture_dir("models"));
    let sequential =
        nba_forecast::predict(&scenario_a(&[]), &store, &config("models").with_parallelism(1))
            .unwrap();
    let parallel =
        nba_forecast::predict(&scenario_a(&[]), &store, &config("models").with_parallelism(8))
            .unwrap();
    assert_eq!(sequential, parallel);

    let broken = DirModelStore::new(fixture_dir("broken_models"));
    let err = nba_forecast::predict(
        &scenario_a(&[]),
        &broken,
        &config("broken_models").with_parallelism(1),
    )
    .unwrap_err();
    assert_eq!(err.model_id().map(|id| id.to_string()), Some("ASG80s".to_string()));
}

#[test]
fn preload_works_with_and_without_a_pool() {
    for threads in [1, 8] {
        let forecaster = Forecaster::open(ForecastConfig {
            preload: true,
            ..config("models").with_parallelism(threads)
        })
        .unwrap();
        assert_eq!(forecaster.store().loads(), 20, "parallelism {threads}");
    }
}
