//! Spatial risk models, the training cache and history analytics
#![allow(unsafe_code)]

use chrono::{NaiveDate, NaiveDateTime};
use fire_risk_core::analytics::{most_common_cause, temporal_histogram, top_neighborhoods};
use fire_risk_core::risk::{extract_epicenters, train_grid_model, SeverityTier};
use fire_risk_core::{
    create_risk_model, ClassifierParams, ClusterParams, EngineConfig, EngineError,
    IncidentRecord, RiskModelCache, RiskStrategy,
};
use std::sync::Arc;
use std::thread;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn incident(lat: f64, lon: f64, day: u32, neighborhood: &str) -> IncidentRecord {
    IncidentRecord {
        timestamp: at(day, 13 + day % 6),
        lat,
        lon,
        neighborhood: neighborhood.into(),
        incident_type: "Pastizal".into(),
        cause: if day % 2 == 0 { "Quema" } else { "Colilla" }.into(),
        severity: "Menor".into(),
    }
}

/// Three tight groups of 4, 3 and 2 incidents far apart from each other
fn grouped_history() -> Vec<IncidentRecord> {
    let groups = [
        (31.70, -106.40, 4, "Centro"),
        (31.90, -106.60, 3, "Anapra"),
        (31.60, -106.20, 2, "Zaragoza"),
    ];
    let mut history = Vec::new();
    for (lat, lon, count, name) in groups {
        for i in 0..count {
            let jitter = f64::from(i) * 0.001;
            history.push(incident(lat + jitter, lon - jitter, 1 + i, name));
        }
    }
    history
}

/// Incidents spread over a ~0.2° box with a dense north-east corner
fn scattered_history(n: u32) -> Vec<IncidentRecord> {
    (0..n)
        .map(|i| {
            let a = f64::from(i * 37 % 101) / 101.0;
            let b = f64::from(i * 53 % 97) / 97.0;
            let (lat, lon) = if i % 3 == 0 {
                (31.70 + 0.2 * a, -106.50 + 0.2 * b)
            } else {
                (31.85 + 0.05 * a, -106.35 + 0.05 * b)
            };
            incident(lat, lon, 1 + i % 28, "Centro")
        })
        .collect()
}

#[test]
fn three_groups_yield_three_sorted_epicenters() {
    let history = grouped_history();
    let epicenters = extract_epicenters(&history, &ClusterParams::with_k(3)).unwrap();

    assert_eq!(epicenters.len(), 3);
    let counts: Vec<_> = epicenters.iter().map(|e| e.member_count).collect();
    assert_eq!(counts, vec![4, 3, 2]);
    assert_eq!(counts.iter().sum::<usize>(), history.len());

    // Average load 3, critical above 3.6
    assert_eq!(epicenters[0].severity, SeverityTier::Critical);
    assert_eq!(epicenters[1].severity, SeverityTier::High);
    assert!((epicenters[0].lat - 31.7015).abs() < 1e-3);
}

#[test]
fn history_shorter_than_k_is_insufficient() {
    let history = grouped_history();
    let err = extract_epicenters(&history[..2], &ClusterParams::with_k(3)).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientData {
            required: 3,
            available: 2,
            ..
        }
    ));
}

#[test]
fn epicenters_are_reproducible() {
    let history = scattered_history(60);
    let params = ClusterParams::with_k(4);
    let first = extract_epicenters(&history, &params).unwrap();
    let second = extract_epicenters(&history, &params).unwrap();
    assert_eq!(first, second);
}

fn small_forest() -> ClassifierParams {
    ClassifierParams {
        n_trees: 12,
        grid_resolution: 10,
        ..ClassifierParams::default()
    }
}

#[test]
fn grid_model_is_reproducible_and_bounded() {
    let history = scattered_history(80);
    let date = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();

    let first = train_grid_model(&history, date, &small_forest()).unwrap();
    let second = train_grid_model(&history, date, &small_forest()).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.cells.len(), 100);
    assert_eq!(first.test_size, 32);
    assert_eq!(first.train_size, 128);
    assert!((0.0..=1.0).contains(&first.accuracy));
    assert!(first
        .cells
        .iter()
        .all(|c| (0.0..=1.0).contains(&c.probability) && first.bounds.contains(&c.location())));
    assert!(first.high_risk_cells().all(|c| c.probability > first.threshold));
}

#[test]
fn grid_model_refuses_thin_or_degenerate_history() {
    let date = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();

    let err = train_grid_model(&scattered_history(9), date, &small_forest()).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { .. }));

    let same_spot: Vec<_> = (1..=12).map(|d| incident(31.7, -106.4, d, "Centro")).collect();
    let err = train_grid_model(&same_spot, date, &small_forest()).unwrap_err();
    assert!(matches!(err, EngineError::ModelTrainingFailure(_)));
}

#[test]
fn cache_trains_once_and_shares_the_result() {
    let config = EngineConfig::default();
    let cache = RiskModelCache::new(&config.cache).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap();
    let model = create_risk_model(RiskStrategy::Epicenters, &config, date);
    let history = scattered_history(40);

    let surfaces: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| cache.get_or_train(model.as_ref(), &history).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    assert!(surfaces.iter().all(|s| Arc::ptr_eq(s, &surfaces[0])));
    assert!(cache.contains(RiskModelCache::fingerprint(model.as_ref(), &history)));
    let epicenters = surfaces[0].epicenters().unwrap();
    assert!(!epicenters.is_empty() && epicenters.len() <= 5);

    // Different strategy over the same history is a different entry
    let grid_model = create_risk_model(RiskStrategy::GridProbability, &EngineConfig::fast(), date);
    let grid = cache.get_or_train(grid_model.as_ref(), &history).unwrap();
    assert!(grid.grid().is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn analytics_over_history() {
    let history = grouped_history();

    let top = top_neighborhoods(&history, 5);
    let labels: Vec<_> = top.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["Centro", "Anapra", "Zaragoza"]);

    let histogram = temporal_histogram(&history);
    assert_eq!(histogram.total(), history.len());
    assert!(histogram.peak().is_some());

    // Colilla on odd days: 1, 3, 1, 3, 1 → 5 of 9
    assert_eq!(most_common_cause(&history), Some("Colilla"));
}
