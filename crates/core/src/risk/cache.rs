//! Memoized spatial-model training
//!
//! Training is the only slow path in the engine. [`RiskModelCache`] keys results
//! by a content fingerprint of (history, model parameters) and guarantees at most
//! one training run per fingerprint: concurrent callers asking for the same key
//! block on the in-flight run instead of duplicating it. Runs execute on a
//! bounded rayon pool so a burst of distinct requests cannot saturate the host.
//!
//! The cache is a caller-owned value; nothing in the engine holds one globally.

use super::{RiskSurface, SpatialRiskModel};
use crate::config::CacheParams;
use crate::core_types::incident::IncidentRecord;
use crate::error::{EngineError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::{FxHashMap, FxHasher};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info};

type Slot = Arc<OnceLock<Result<Arc<RiskSurface>>>>;

#[derive(Default)]
struct Entries {
    slots: FxHashMap<u64, Slot>,
    /// Insertion order, oldest first
    order: VecDeque<u64>,
}

/// Content-addressed cache of trained risk surfaces
pub struct RiskModelCache {
    pool: ThreadPool,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl RiskModelCache {
    /// Create a cache with its own training pool
    ///
    /// # Errors
    ///
    /// `InvalidInput` for zero threads or capacity, or if the pool cannot start.
    pub fn new(params: &CacheParams) -> Result<Self> {
        params.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(params.worker_threads)
            .thread_name(|i| format!("risk-train-{i}"))
            .build()
            .map_err(|e| EngineError::invalid("worker_threads", e.to_string()))?;

        info!(
            worker_threads = params.worker_threads,
            capacity = params.capacity,
            "created risk model cache"
        );

        Ok(Self {
            pool,
            capacity: params.capacity,
            entries: Mutex::new(Entries::default()),
        })
    }

    /// Fingerprint of a model's parameters plus every field of every incident
    pub fn fingerprint(model: &dyn SpatialRiskModel, history: &[IncidentRecord]) -> u64 {
        let mut hasher = FxHasher::default();
        model.parameter_key().hash(&mut hasher);
        history.len().hash(&mut hasher);
        for record in history {
            record.timestamp.hash(&mut hasher);
            record.lat.to_bits().hash(&mut hasher);
            record.lon.to_bits().hash(&mut hasher);
            record.neighborhood.hash(&mut hasher);
            record.incident_type.hash(&mut hasher);
            record.cause.hash(&mut hasher);
            record.severity.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Return the cached surface for (model, history), training it if needed
    ///
    /// Failures are cached as well: the inputs are immutable, so retrying the
    /// same fingerprint would fail the same way.
    pub fn get_or_train(
        &self,
        model: &dyn SpatialRiskModel,
        history: &[IncidentRecord],
    ) -> Result<Arc<RiskSurface>> {
        let key = Self::fingerprint(model, history);
        let slot = self.slot(key);

        slot.get_or_init(|| {
            info!(
                model = model.name(),
                incidents = history.len(),
                key,
                "training risk model"
            );
            self.pool
                .install(|| model.train_and_query(history))
                .map(Arc::new)
        })
        .clone()
    }

    /// Fingerprint is present (trained or in flight)
    pub fn contains(&self, key: u64) -> bool {
        self.lock().slots.contains_key(&key)
    }

    /// Number of retained fingerprints
    ///
    /// May briefly exceed the configured capacity while training runs are in
    /// flight.
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    /// No fingerprints retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every retained result
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.slots.clear();
        entries.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries stay consistent even if a holder panicked: every mutation is a
        // single insert/remove pair
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: u64) -> Slot {
        let mut entries = self.lock();
        if let Some(slot) = entries.slots.get(&key) {
            debug!(key, "risk model cache hit");
            return Arc::clone(slot);
        }

        let slot: Slot = Arc::new(OnceLock::new());
        entries.slots.insert(key, Arc::clone(&slot));
        entries.order.push_back(key);

        // Only finished slots are evicted; dropping an in-flight one would let a
        // later caller start a second run for the same key
        while entries.order.len() > self.capacity {
            let finished = entries
                .order
                .iter()
                .position(|k| entries.slots.get(k).is_some_and(|s| s.get().is_some()));
            let Some(position) = finished else {
                debug!(
                    retained = entries.order.len(),
                    "all retained models in flight, over capacity"
                );
                break;
            };
            if let Some(oldest) = entries.order.remove(position) {
                entries.slots.remove(&oldest);
                debug!(key = oldest, "evicted risk model");
            }
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskEpicenter, SeverityTier};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Condvar;
    use std::thread;
    use std::time::Duration;

    /// Counts training runs and sleeps to widen the race window
    struct CountingModel {
        runs: AtomicUsize,
        key: u64,
    }

    impl CountingModel {
        fn new(key: u64) -> Self {
            Self {
                runs: AtomicUsize::new(0),
                key,
            }
        }
    }

    impl SpatialRiskModel for CountingModel {
        fn train_and_query(&self, history: &[IncidentRecord]) -> Result<RiskSurface> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(surface(history))
        }

        fn parameter_key(&self) -> u64 {
            self.key
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn surface(history: &[IncidentRecord]) -> RiskSurface {
        RiskSurface::Epicenters(vec![RiskEpicenter {
            id: 1,
            lat: 0.0,
            lon: 0.0,
            member_count: history.len(),
            severity: SeverityTier::High,
        }])
    }

    /// Blocks every training run until [`GatedModel::open`] is called
    struct GatedModel {
        runs: AtomicUsize,
        open: Mutex<bool>,
        opened: Condvar,
    }

    impl GatedModel {
        fn new() -> Self {
            Self {
                runs: AtomicUsize::new(0),
                open: Mutex::new(false),
                opened: Condvar::new(),
            }
        }

        fn open(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }
    }

    impl SpatialRiskModel for GatedModel {
        fn train_and_query(&self, history: &[IncidentRecord]) -> Result<RiskSurface> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.opened.wait(open).unwrap();
            }
            Ok(surface(history))
        }

        fn parameter_key(&self) -> u64 {
            7
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    fn history(n: usize) -> Vec<IncidentRecord> {
        (0..n)
            .map(|i| IncidentRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                lat: 31.7,
                lon: -106.4,
                neighborhood: "Centro".into(),
                incident_type: "Pastizal".into(),
                cause: "Quema".into(),
                severity: "Menor".into(),
            })
            .collect()
    }

    #[test]
    fn test_concurrent_requests_train_once() {
        let cache = RiskModelCache::new(&CacheParams::default()).unwrap();
        let model = CountingModel::new(1);
        let history = history(5);

        let results: Vec<Arc<RiskSurface>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_train(&model, &history).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(model.runs.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_history_retrains() {
        let cache = RiskModelCache::new(&CacheParams::default()).unwrap();
        let model = CountingModel::new(1);

        cache.get_or_train(&model, &history(3)).unwrap();
        cache.get_or_train(&model, &history(3)).unwrap();
        cache.get_or_train(&model, &history(4)).unwrap();

        assert_eq!(model.runs.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let params = CacheParams {
            worker_threads: 1,
            capacity: 2,
        };
        let cache = RiskModelCache::new(&params).unwrap();
        let model = CountingModel::new(9);

        let first = history(1);
        let first_key = RiskModelCache::fingerprint(&model, &first);
        cache.get_or_train(&model, &first).unwrap();
        cache.get_or_train(&model, &history(2)).unwrap();
        cache.get_or_train(&model, &history(3)).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(first_key));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_in_flight_run_survives_eviction() {
        let params = CacheParams {
            worker_threads: 2,
            capacity: 1,
        };
        let cache = RiskModelCache::new(&params).unwrap();
        let gated = GatedModel::new();
        let other = CountingModel::new(3);
        let slow = history(2);
        let slow_key = RiskModelCache::fingerprint(&gated, &slow);

        thread::scope(|scope| {
            let first = scope.spawn(|| cache.get_or_train(&gated, &slow).unwrap());
            while gated.runs.load(Ordering::SeqCst) == 0 {
                thread::yield_now();
            }

            // A distinct key fills the single slot while the first run is blocked
            cache.get_or_train(&other, &history(4)).unwrap();
            assert!(cache.contains(slow_key));
            assert_eq!(cache.len(), 2);

            let second = scope.spawn(|| cache.get_or_train(&gated, &slow).unwrap());
            gated.open();
            let (a, b) = (first.join().unwrap(), second.join().unwrap());
            assert!(Arc::ptr_eq(&a, &b));
        });
        assert_eq!(gated.runs.load(Ordering::SeqCst), 1);

        // Once nothing is in flight the next insert trims back to capacity
        cache.get_or_train(&other, &history(5)).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(slow_key));
    }

    #[test]
    fn test_errors_are_cached() {
        let cache = RiskModelCache::new(&CacheParams::default()).unwrap();
        let model = crate::risk::EpicenterModel {
            params: crate::config::ClusterParams::with_k(10),
        };
        let short = history(3);

        let first = cache.get_or_train(&model, &short);
        let second = cache.get_or_train(&model, &short);
        assert!(matches!(first, Err(EngineError::InsufficientData { .. })));
        assert_eq!(first, second);
    }
}
