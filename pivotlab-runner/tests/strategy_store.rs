//! Strategy store round trips against a temporary directory.

use chrono::NaiveDate;
use pivotlab_core::signals::{ClassifierConfig, ClassifierModel, DivergenceModel, SignalModel};
use pivotlab_core::strategy::Strategy;
use pivotlab_runner::{synthetic_bars, train_strategy, StrategyStore};
use std::collections::BTreeMap;

fn sample_strategy(name: &str) -> Strategy {
    let mut strategy = Strategy::new(name);
    strategy
        .feature_config
        .insert("rsi_14".into(), BTreeMap::new());
    strategy
        .feature_config
        .insert("ema_10".into(), BTreeMap::new());
    strategy.add_model(DivergenceModel::new("rsi_div"));

    let mut config = ClassifierConfig::new("clf", vec!["rsi_14".into(), "ema_10".into(), "close".into()]);
    config.forest.n_trees = 8;
    config.forest.max_depth = 4;
    strategy.add_model(ClassifierModel::new(config));
    strategy
}

#[test]
fn save_list_load_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = StrategyStore::new(dir.path()).unwrap();

    store.save(&sample_strategy("beta")).unwrap();
    store.save(&sample_strategy("alpha")).unwrap();
    // Non-bundle files are ignored.
    std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

    assert_eq!(store.list_available().unwrap(), vec!["alpha", "beta"]);
    assert!(store.contains("alpha"));

    let loaded = store.load("alpha").unwrap().unwrap();
    assert_eq!(loaded, sample_strategy("alpha"));

    assert!(store.remove("alpha").unwrap());
    assert!(!store.remove("alpha").unwrap());
    assert_eq!(store.list_available().unwrap(), vec!["beta"]);
    assert!(store.load("alpha").unwrap().is_none());
}

#[test]
fn trained_model_survives_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = StrategyStore::new(dir.path()).unwrap();
    let data = synthetic_bars("store", NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), 250)
        .unwrap();

    let mut strategy = sample_strategy("trained");
    let outcomes = train_strategy(&mut strategy, &data.bars);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, "clf");
    assert!(outcomes[0].1.is_trained());

    store.save(&strategy).unwrap();
    let loaded = store.load("trained").unwrap().unwrap();
    assert_eq!(loaded, strategy);

    match loaded.model("clf") {
        Some(SignalModel::Classifier(model)) => assert!(model.is_trained()),
        other => panic!("unexpected model {other:?}"),
    }
}

#[test]
fn unknown_model_entries_are_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = StrategyStore::new(dir.path()).unwrap();
    let json = r#"{
        "name": "legacy",
        "feature_config": { "sma_20": {} },
        "models": [
            { "type": "neural_net", "name": "nn" },
            { "type": "divergence", "name": "div", "indicator": "rsi_7" },
            { "name": "untagged" }
        ]
    }"#;
    std::fs::write(dir.path().join("legacy.json"), json).unwrap();

    let strategy = store.load("legacy").unwrap().unwrap();
    assert_eq!(strategy.models.len(), 1);
    assert_eq!(strategy.models[0].name(), "div");
    assert!(strategy.feature_config.contains_key("sma_20"));
}

#[test]
fn corrupt_bundle_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = StrategyStore::new(dir.path()).unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let err = store.load("broken").unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}
