//! Supervised grid-probability risk surface
//!
//! Historical incidents are positives. An equal number of background points drawn
//! uniformly inside the incidents' bounding box (with random month and weekday)
//! are negatives. After a seeded 80/20 split the classifier is fit, scored on the
//! held-out part, then evaluated over an N×N lattice for the query date.

use super::forest::{check_training_data, Classifier, Features, RandomForest};
use crate::config::ClassifierParams;
use crate::core_types::geo::{BoundingBox, GeoPoint};
use crate::core_types::incident::IncidentRecord;
use crate::error::{EngineError, Result};
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One lattice cell of the risk surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskGridCell {
    /// Cell latitude
    pub lat: f64,
    /// Cell longitude
    pub lon: f64,
    /// Fire probability in [0, 1]
    pub probability: f64,
}

impl RiskGridCell {
    /// Cell location
    #[inline]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Probability lattice over the incident bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGrid {
    /// Cells in row-major order (latitude outer, longitude inner)
    pub cells: Vec<RiskGridCell>,
    /// Cells per axis
    pub resolution: usize,
    /// Area covered by the lattice
    pub bounds: BoundingBox,
    /// Date the calendar features were taken from
    pub query_date: NaiveDate,
    /// Cells strictly above this probability are high risk
    pub threshold: f64,
    /// Fraction of held-out samples classified correctly
    pub accuracy: f64,
    /// Samples used for fitting
    pub train_size: usize,
    /// Samples held out for accuracy
    pub test_size: usize,
}

impl RiskGrid {
    /// Cells whose probability exceeds the threshold
    pub fn high_risk_cells(&self) -> impl Iterator<Item = &RiskGridCell> {
        self.cells
            .iter()
            .filter(move |cell| cell.probability > self.threshold)
    }

    /// Highest-probability cell; ties go to the first in row-major order
    pub fn peak(&self) -> Option<&RiskGridCell> {
        self.cells.iter().fold(None, |best, cell| match best {
            Some(b) if b.probability >= cell.probability => Some(b),
            _ => Some(cell),
        })
    }
}

/// Labelled samples for the classifier
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    /// Feature vectors
    pub samples: Vec<Features>,
    /// `true` for observed incidents, `false` for background points
    pub labels: Vec<bool>,
}

/// Calendar features for a date: month 1-12 and weekday with Monday = 0
pub fn calendar_features(date: NaiveDate) -> (f64, f64) {
    (
        f64::from(date.month()),
        f64::from(date.weekday().num_days_from_monday()),
    )
}

/// Build positives from `incidents` and an equal count of background negatives
pub fn build_training_set(
    incidents: &[&IncidentRecord],
    bounds: &BoundingBox,
    rng: &mut StdRng,
) -> TrainingSet {
    let n = incidents.len();
    let mut samples = Vec::with_capacity(2 * n);
    let mut labels = Vec::with_capacity(2 * n);

    for record in incidents {
        samples.push([
            record.lat,
            record.lon,
            f64::from(record.month()),
            f64::from(record.weekday()),
        ]);
        labels.push(true);
    }

    for _ in 0..n {
        let lat = rng.random_range(bounds.lat_min..=bounds.lat_max);
        let lon = rng.random_range(bounds.lon_min..=bounds.lon_max);
        let month = rng.random_range(1..=12u32);
        let weekday = rng.random_range(0..7u32);
        samples.push([lat, lon, f64::from(month), f64::from(weekday)]);
        labels.push(false);
    }

    TrainingSet { samples, labels }
}

/// Train the default random forest and evaluate the lattice for `query_date`
///
/// # Errors
///
/// - `InvalidInput` for bad parameters
/// - `InsufficientData` when usable incidents are below `min_incidents`
/// - `ModelTrainingFailure` when the incidents span zero latitude or longitude,
///   or the training split ends up with a single class
pub fn train_grid_model(
    history: &[IncidentRecord],
    query_date: NaiveDate,
    params: &ClassifierParams,
) -> Result<RiskGrid> {
    train_grid_model_with(history, query_date, params, &RandomForest::new(params))
}

/// Same as [`train_grid_model`] with a caller-supplied classifier
pub fn train_grid_model_with<C>(
    history: &[IncidentRecord],
    query_date: NaiveDate,
    params: &ClassifierParams,
    classifier: &C,
) -> Result<RiskGrid>
where
    C: Classifier + ?Sized,
{
    params.validate()?;

    let incidents: Vec<&IncidentRecord> =
        history.iter().filter(|r| r.has_valid_location()).collect();
    let dropped = history.len() - incidents.len();
    if dropped > 0 {
        warn!(dropped, "ignoring incidents without usable coordinates");
    }
    if incidents.len() < params.min_incidents {
        return Err(EngineError::insufficient(
            "grid classifier training",
            params.min_incidents,
            incidents.len(),
        ));
    }

    let bounds = BoundingBox::from_points(incidents.iter().map(|r| r.location()))
        .ok_or_else(|| EngineError::insufficient("grid classifier training", params.min_incidents, 0))?;
    if !bounds.has_area() {
        return Err(EngineError::ModelTrainingFailure(format!(
            "incident locations span zero area (lat span {}, lon span {})",
            bounds.lat_span(),
            bounds.lon_span()
        )));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let training = build_training_set(&incidents, &bounds, &mut rng);

    let total = training.samples.len();
    let mut order: Vec<usize> = (0..total).collect();
    order.shuffle(&mut rng);
    let test_size = ((params.test_fraction * total as f64).ceil() as usize).clamp(1, total - 1);
    let (test_order, train_order) = order.split_at(test_size);

    let pick = |indices: &[usize]| -> (Vec<Features>, Vec<bool>) {
        indices
            .iter()
            .map(|&i| (training.samples[i], training.labels[i]))
            .unzip()
    };
    let (train_samples, train_labels) = pick(train_order);
    let (test_samples, test_labels) = pick(test_order);

    check_training_data(&train_samples, &train_labels)?;
    let model = classifier.fit(&train_samples, &train_labels)?;

    let correct = test_samples
        .iter()
        .zip(&test_labels)
        .filter(|&(sample, &label)| model.predict(sample) == label)
        .count();
    let accuracy = correct as f64 / test_size as f64;

    let (month, weekday) = calendar_features(query_date);
    let lattice = bounds.lattice(params.grid_resolution);
    let cells: Vec<RiskGridCell> = lattice
        .par_iter()
        .map(|p: &GeoPoint| RiskGridCell {
            lat: p.lat,
            lon: p.lon,
            probability: model.predict_proba(&[p.lat, p.lon, month, weekday]),
        })
        .collect();

    let grid = RiskGrid {
        cells,
        resolution: params.grid_resolution,
        bounds,
        query_date,
        threshold: params.threshold,
        accuracy,
        train_size: train_samples.len(),
        test_size,
    };

    debug!(
        train = grid.train_size,
        test = grid.test_size,
        "split training samples"
    );
    info!(
        incidents = incidents.len(),
        accuracy,
        high_risk_cells = grid.high_risk_cells().count(),
        "trained grid risk model"
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::forest::ProbabilityModel;
    use chrono::NaiveDateTime;

    fn timestamp(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn incident(lat: f64, lon: f64, day: u32) -> IncidentRecord {
        IncidentRecord {
            timestamp: timestamp(day),
            lat,
            lon,
            neighborhood: "Riberas del Bravo".into(),
            incident_type: "Pastizal".into(),
            cause: "Quema de basura".into(),
            severity: "Menor".into(),
        }
    }

    /// Always answers the same probability
    struct ConstantClassifier(f64);

    struct ConstantModel(f64);

    impl ProbabilityModel for ConstantModel {
        fn predict_proba(&self, _sample: &Features) -> f64 {
            self.0
        }
    }

    impl Classifier for ConstantClassifier {
        fn fit(&self, _samples: &[Features], _labels: &[bool]) -> Result<Box<dyn ProbabilityModel>> {
            Ok(Box::new(ConstantModel(self.0)))
        }
    }

    fn spread_history(n: usize) -> Vec<IncidentRecord> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                incident(31.70 + 0.1 * t, -106.50 + 0.1 * (1.0 - t), 1 + (i % 28) as u32)
            })
            .collect()
    }

    #[test]
    fn test_training_set_is_balanced_and_bounded() {
        let history = spread_history(12);
        let refs: Vec<_> = history.iter().collect();
        let bounds = BoundingBox::from_points(history.iter().map(IncidentRecord::location)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let set = build_training_set(&refs, &bounds, &mut rng);

        assert_eq!(set.samples.len(), 24);
        assert_eq!(set.labels.iter().filter(|&&l| l).count(), 12);
        for (sample, &label) in set.samples.iter().zip(&set.labels) {
            if !label {
                assert!(bounds.contains(&GeoPoint::new(sample[0], sample[1])));
                assert!((1.0..=12.0).contains(&sample[2]));
                assert!((0.0..=6.0).contains(&sample[3]));
            }
        }
    }

    #[test]
    fn test_stub_classifier_drives_threshold() {
        let history = spread_history(20);
        let params = ClassifierParams {
            grid_resolution: 5,
            ..ClassifierParams::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();

        let grid =
            train_grid_model_with(&history, date, &params, &ConstantClassifier(0.75)).unwrap();
        assert_eq!(grid.cells.len(), 25);
        assert_eq!(grid.high_risk_cells().count(), 25);
        // Constant 0.75 labels everything positive; half the samples are negative
        assert_eq!(grid.train_size + grid.test_size, 40);
        assert_eq!(grid.test_size, 8);

        let grid =
            train_grid_model_with(&history, date, &params, &ConstantClassifier(0.5)).unwrap();
        assert_eq!(grid.high_risk_cells().count(), 0);
    }

    #[test]
    fn test_insufficient_and_degenerate_history() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let params = ClassifierParams::default();

        let err = train_grid_model(&spread_history(5), date, &params).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientData {
                required: 10,
                available: 5,
                ..
            }
        ));

        let same_spot: Vec<_> = (1..=12).map(|d| incident(31.7, -106.4, d)).collect();
        let err = train_grid_model(&same_spot, date, &params).unwrap_err();
        assert!(matches!(err, EngineError::ModelTrainingFailure(_)));
    }

    #[test]
    fn test_calendar_features() {
        // 2024-07-04 was a Thursday
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(calendar_features(date), (7.0, 3.0));
    }

    #[test]
    fn test_peak_prefers_first_of_equal_cells() {
        let bounds = BoundingBox {
            lat_min: 0.0,
            lat_max: 1.0,
            lon_min: 0.0,
            lon_max: 1.0,
        };
        let grid = RiskGrid {
            cells: vec![
                RiskGridCell { lat: 0.0, lon: 0.0, probability: 0.2 },
                RiskGridCell { lat: 0.0, lon: 1.0, probability: 0.9 },
                RiskGridCell { lat: 1.0, lon: 0.0, probability: 0.9 },
            ],
            resolution: 2,
            bounds,
            query_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            threshold: 0.5,
            accuracy: 1.0,
            train_size: 0,
            test_size: 0,
        };
        let peak = grid.peak().unwrap();
        assert_eq!((peak.lat, peak.lon), (0.0, 1.0));
    }
}
