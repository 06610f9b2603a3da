//! Lazily populated cache of registered metric vectors.

use compact_str::CompactString;
use core::fmt::{self, Debug, Formatter};
use prometheus::core::Collector;
use prometheus::{GaugeVec, IntCounterVec, Opts, Registry};
use rustc_hash::FxHashMap;
use std::sync::{Mutex, PoisonError};
use strum::Display;
use thiserror::Error;

const LOG_TARGET: &str = "     cache";

/// The two kinds of metric the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Everything needed to register a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub name: CompactString,
    pub help: CompactString,
    pub kind: MetricKind,
    pub label_names: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The same metric name was requested with a different shape.
    #[error(
        "metric '{name}' is already registered as a {existing_kind} labeled {existing_labels:?}, \
         refusing to redefine it as a {requested_kind} labeled {requested_labels:?}"
    )]
    Conflict {
        name: CompactString,
        existing_kind: MetricKind,
        existing_labels: Vec<&'static str>,
        requested_kind: MetricKind,
        requested_labels: Vec<&'static str>,
    },

    /// A counter operation was applied to a gauge, or vice versa.
    #[error("metric '{name}' is a {kind}")]
    KindMismatch { name: CompactString, kind: MetricKind },

    #[error("metrics backend rejected '{name}'")]
    Backend {
        name: CompactString,
        #[source]
        source: prometheus::Error,
    },
}

#[derive(Clone)]
enum Vector {
    Counter(IntCounterVec),
    Gauge(GaugeVec),
}

impl Debug for Vector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter(_) => f.write_str("Counter"),
            Self::Gauge(_) => f.write_str("Gauge"),
        }
    }
}

/// A registered metric, addressed by label values given in label-name order.
#[derive(Debug, Clone)]
pub struct MetricHandle {
    name: CompactString,
    vector: Vector,
}

impl MetricHandle {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self.vector {
            Vector::Counter(_) => MetricKind::Counter,
            Vector::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Adds one to the counter series identified by `label_values`.
    pub fn increment(&self, label_values: &[&str]) -> Result<(), RegistryError> {
        let Vector::Counter(vec) = &self.vector else {
            return Err(self.kind_mismatch());
        };

        vec.get_metric_with_label_values(label_values)
            .map_err(|source| self.backend_err(source))?
            .inc();
        Ok(())
    }

    /// Sets the gauge series identified by `label_values`.
    pub fn set(&self, label_values: &[&str], value: f64) -> Result<(), RegistryError> {
        let Vector::Gauge(vec) = &self.vector else {
            return Err(self.kind_mismatch());
        };

        vec.get_metric_with_label_values(label_values)
            .map_err(|source| self.backend_err(source))?
            .set(value);
        Ok(())
    }

    fn kind_mismatch(&self) -> RegistryError {
        RegistryError::KindMismatch {
            name: self.name.clone(),
            kind: self.kind(),
        }
    }

    fn backend_err(&self, source: prometheus::Error) -> RegistryError {
        RegistryError::Backend {
            name: self.name.clone(),
            source,
        }
    }
}

#[derive(Debug)]
struct Entry {
    label_names: Vec<&'static str>,
    handle: MetricHandle,
}

/// Registers each metric with the backend the first time it is asked for and hands out the
/// cached handle afterwards.
///
/// A name is bound to one kind and one label list for the lifetime of the cache. Asking for
/// the same name with a different shape is a [`RegistryError::Conflict`].
pub struct MetricCache {
    registry: Registry,
    entries: Mutex<FxHashMap<CompactString, Entry>>,
}

impl Debug for MetricCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricCache").field("names", &self.names()).finish_non_exhaustive()
    }
}

impl MetricCache {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// The backend registry the metrics are registered with.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the handle for `desc.name`, registering the metric on first use.
    pub fn get_or_create(&self, desc: &MetricDescriptor) -> Result<MetricHandle, RegistryError> {
        // Held across check-then-register so racing first uses register once.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(&desc.name) {
            let existing_kind = entry.handle.kind();
            if existing_kind != desc.kind || entry.label_names != desc.label_names {
                return Err(RegistryError::Conflict {
                    name: desc.name.clone(),
                    existing_kind,
                    existing_labels: entry.label_names.clone(),
                    requested_kind: desc.kind,
                    requested_labels: desc.label_names.clone(),
                });
            }

            return Ok(entry.handle.clone());
        }

        let handle = self.register(desc)?;
        log::debug!(target: LOG_TARGET, "Registered {} '{}' with labels {:?}", desc.kind, desc.name, desc.label_names);

        let _ = entries.insert(
            desc.name.clone(),
            Entry {
                label_names: desc.label_names.clone(),
                handle: handle.clone(),
            },
        );

        Ok(handle)
    }

    fn register(&self, desc: &MetricDescriptor) -> Result<MetricHandle, RegistryError> {
        let backend_err = |source| RegistryError::Backend {
            name: desc.name.clone(),
            source,
        };

        let opts = Opts::new(desc.name.as_str(), desc.help.as_str());
        let vector = match desc.kind {
            MetricKind::Counter => Vector::Counter(IntCounterVec::new(opts, &desc.label_names).map_err(backend_err)?),
            MetricKind::Gauge => Vector::Gauge(GaugeVec::new(opts, &desc.label_names).map_err(backend_err)?),
        };

        let collector: Box<dyn Collector> = match &vector {
            Vector::Counter(vec) => Box::new(vec.clone()),
            Vector::Gauge(vec) => Box::new(vec.clone()),
        };
        self.registry.register(collector).map_err(backend_err)?;

        Ok(MetricHandle {
            name: desc.name.clone(),
            vector,
        })
    }

    /// Number of metrics registered through this cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the metrics registered through this cache, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<CompactString> {
        let mut names: Vec<_> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn desc(name: &str, kind: MetricKind, label_names: &[&'static str]) -> MetricDescriptor {
        MetricDescriptor {
            name: name.into(),
            help: "test metric".into(),
            kind,
            label_names: label_names.to_vec(),
        }
    }

    fn family_count(registry: &Registry) -> usize {
        registry.gather().len()
    }

    #[test]
    fn test_get_or_create_registers_once() {
        let cache = MetricCache::new(Registry::new());
        let d = desc("metric_interface_up", MetricKind::Counter, &["host", "interface"]);

        for _ in 0..5 {
            let handle = cache.get_or_create(&d).unwrap();
            assert_eq!(handle.kind(), MetricKind::Counter);
            handle.increment(&["r1", "eth0"]).unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(family_count(cache.registry()), 1);

        let families = cache.registry().gather();
        let counter = families[0].get_metric()[0].get_counter();
        assert!((counter.get_value() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_conflicting_labels_are_rejected() {
        let cache = MetricCache::new(Registry::new());
        let _ = cache
            .get_or_create(&desc("metric_interface_state", MetricKind::Gauge, &["host", "interface"]))
            .unwrap();

        let err = cache
            .get_or_create(&desc("metric_interface_state", MetricKind::Gauge, &["host"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
        assert!(err.to_string().contains("metric_interface_state"));
    }

    #[test]
    fn test_conflicting_label_order_is_rejected() {
        let cache = MetricCache::new(Registry::new());
        let _ = cache
            .get_or_create(&desc("metric_x", MetricKind::Counter, &["host", "user"]))
            .unwrap();
        let err = cache
            .get_or_create(&desc("metric_x", MetricKind::Counter, &["user", "host"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
    }

    #[test]
    fn test_conflicting_kind_is_rejected() {
        let cache = MetricCache::new(Registry::new());
        let _ = cache.get_or_create(&desc("metric_x", MetricKind::Counter, &["host"])).unwrap();

        let err = cache.get_or_create(&desc("metric_x", MetricKind::Gauge, &["host"])).unwrap_err();
        match err {
            RegistryError::Conflict {
                existing_kind, requested_kind, ..
            } => {
                assert_eq!(existing_kind, MetricKind::Counter);
                assert_eq!(requested_kind, MetricKind::Gauge);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wrong_operation_for_kind() {
        let cache = MetricCache::new(Registry::new());
        let counter = cache.get_or_create(&desc("metric_c", MetricKind::Counter, &["host"])).unwrap();
        let gauge = cache.get_or_create(&desc("metric_g", MetricKind::Gauge, &["host"])).unwrap();

        assert!(matches!(counter.set(&["r1"], 1.0), Err(RegistryError::KindMismatch { .. })));
        assert!(matches!(gauge.increment(&["r1"]), Err(RegistryError::KindMismatch { .. })));
    }

    #[test]
    fn test_wrong_label_count_is_a_backend_error() {
        let cache = MetricCache::new(Registry::new());
        let counter = cache.get_or_create(&desc("metric_c", MetricKind::Counter, &["host"])).unwrap();
        assert!(matches!(counter.increment(&["r1", "extra"]), Err(RegistryError::Backend { .. })));
    }

    #[test]
    fn test_invalid_name_is_a_backend_error() {
        let cache = MetricCache::new(Registry::new());
        let err = cache
            .get_or_create(&desc("not a valid name", MetricKind::Counter, &["host"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Backend { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_separate_caches_do_not_share_state() {
        let d = desc("metric_x", MetricKind::Counter, &["host"]);
        let a = MetricCache::new(Registry::new());
        let b = MetricCache::new(Registry::new());
        let _ = a.get_or_create(&d).unwrap();
        let _ = b.get_or_create(&d).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_names_are_sorted() {
        let cache = MetricCache::new(Registry::new());
        for name in ["metric_b", "metric_c", "metric_a"] {
            let _ = cache.get_or_create(&desc(name, MetricKind::Counter, &["host"])).unwrap();
        }
        assert_eq!(cache.names(), ["metric_a", "metric_b", "metric_c"]);
    }

    #[test]
    fn test_concurrent_first_use_registers_once() {
        let cache = MetricCache::new(Registry::new());
        let d = desc("metric_race", MetricKind::Counter, &["host"]);

        thread::scope(|s| {
            for _ in 0..8 {
                let _ = s.spawn(|| {
                    for _ in 0..100 {
                        cache.get_or_create(&d).unwrap().increment(&["r1"]).unwrap();
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1);
        let families = cache.registry().gather();
        assert_eq!(families.len(), 1);
        let total = families[0].get_metric()[0].get_counter().get_value();
        assert!((total - 800.0).abs() < f64::EPSILON);
    }
}
