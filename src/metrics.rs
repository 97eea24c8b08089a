//! Metrics collection and export for object pools

use crate::observer::{LifecycleEvent, LifecycleObserver};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metrics data for a pool
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{FnCreation, NoopDestruction, NoopObserver, ObjectPool, PoolConfiguration};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let next = AtomicU32::new(0);
/// let mut pool = ObjectPool::new(
///     FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed)),
///     NoopObserver,
///     NoopDestruction,
///     PoolConfiguration::new().with_initial_capacity(2),
/// )
/// .unwrap();
///
/// let _id = pool.request().unwrap();
/// let metrics = pool.get_metrics();
/// assert_eq!(metrics.total_created, 2);
/// assert_eq!(metrics.total_requested, 1);
/// assert_eq!(metrics.in_use_objects, 1);
/// assert_eq!(metrics.idle_objects, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PoolMetrics {
    /// Total objects produced by the creation strategy
    pub total_created: usize,

    /// Total objects handed out
    pub total_requested: usize,

    /// Total objects handed back
    pub total_returned: usize,

    /// Total objects passed to the destruction strategy
    pub total_destroyed: usize,

    /// Requests that found no idle object and had to create one
    pub created_on_demand: usize,

    /// Returns rejected because the object was invalid or not in use
    pub rejected_returns: usize,

    /// Current checked-out objects
    pub in_use_objects: usize,

    /// Current idle objects
    pub idle_objects: usize,

    /// Share of tracked objects that are checked out (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_requested".to_string(), self.total_requested.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("created_on_demand".to_string(), self.created_on_demand.to_string());
        metrics.insert("rejected_returns".to_string(), self.rejected_returns.to_string());
        metrics.insert("in_use_objects".to_string(), self.in_use_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP objectpool_objects_in_use Current checked-out objects\n");
        output.push_str("# TYPE objectpool_objects_in_use gauge\n");
        output.push_str(&format!("objectpool_objects_in_use{{{}}} {}\n", labels, metrics.in_use_objects));

        output.push_str("# HELP objectpool_objects_idle Current idle objects\n");
        output.push_str("# TYPE objectpool_objects_idle gauge\n");
        output.push_str(&format!("objectpool_objects_idle{{{}}} {}\n", labels, metrics.idle_objects));

        output.push_str("# HELP objectpool_utilization Pool utilization ratio\n");
        output.push_str("# TYPE objectpool_utilization gauge\n");
        output.push_str(&format!("objectpool_utilization{{{}}} {:.2}\n", labels, metrics.utilization));

        // Counter metrics
        let counters = [
            ("objectpool_objects_created_total", "Total objects created", metrics.total_created),
            ("objectpool_objects_requested_total", "Total objects requested", metrics.total_requested),
            ("objectpool_objects_returned_total", "Total objects returned", metrics.total_returned),
            ("objectpool_objects_destroyed_total", "Total objects destroyed", metrics.total_destroyed),
            ("objectpool_created_on_demand_total", "Requests served by creating an object", metrics.created_on_demand),
            ("objectpool_rejected_returns_total", "Rejected returns", metrics.rejected_returns),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
        }

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            // HashMap order is random; keep the exposition stable.
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_created: AtomicUsize,
    pub total_requested: AtomicUsize,
    pub total_returned: AtomicUsize,
    pub total_destroyed: AtomicUsize,
    pub created_on_demand: AtomicUsize,
    pub rejected_returns: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: LifecycleEvent) {
        self.counter(event).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, event: LifecycleEvent) -> usize {
        self.counter(event).load(Ordering::Relaxed)
    }

    fn counter(&self, event: LifecycleEvent) -> &AtomicUsize {
        match event {
            LifecycleEvent::Created => &self.total_created,
            LifecycleEvent::Requested => &self.total_requested,
            LifecycleEvent::Returned => &self.total_returned,
            LifecycleEvent::Destroyed => &self.total_destroyed,
        }
    }

    pub fn get_metrics(&self, in_use: usize, idle: usize) -> PoolMetrics {
        let tracked = in_use + idle;
        let utilization = if tracked > 0 {
            in_use as f64 / tracked as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_requested: self.total_requested.load(Ordering::Relaxed),
            total_returned: self.total_returned.load(Ordering::Relaxed),
            total_destroyed: self.total_destroyed.load(Ordering::Relaxed),
            created_on_demand: self.created_on_demand.load(Ordering::Relaxed),
            rejected_returns: self.rejected_returns.load(Ordering::Relaxed),
            in_use_objects: in_use,
            idle_objects: idle,
            utilization,
        }
    }
}

/// Observer that counts lifecycle events
///
/// Clones share the same counters, so one clone can be installed in a pool
/// (or in an [`ObserverChain`](crate::ObserverChain)) while another is kept
/// for reading.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{LifecycleEvent, LifecycleObserver, MetricsObserver};
///
/// let metrics = MetricsObserver::new();
/// let installed = metrics.clone();
/// installed.created(&1u32);
/// installed.requested(&1u32);
///
/// assert_eq!(metrics.count(LifecycleEvent::Created), 1);
/// assert_eq!(metrics.count(LifecycleEvent::Returned), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    tracker: Arc<MetricsTracker>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `event` has been observed
    pub fn count(&self, event: LifecycleEvent) -> usize {
        self.tracker.count(event)
    }

    /// Objects created but not yet destroyed
    pub fn live_objects(&self) -> usize {
        self.count(LifecycleEvent::Created)
            .saturating_sub(self.count(LifecycleEvent::Destroyed))
    }

    /// Objects requested but not yet returned
    pub fn outstanding_objects(&self) -> usize {
        self.count(LifecycleEvent::Requested)
            .saturating_sub(self.count(LifecycleEvent::Returned))
    }
}

impl<T> LifecycleObserver<T> for MetricsObserver {
    fn created(&self, _instance: &T) {
        self.tracker.record(LifecycleEvent::Created);
    }

    fn requested(&self, _instance: &T) {
        self.tracker.record(LifecycleEvent::Requested);
    }

    fn returned(&self, _instance: &T) {
        self.tracker.record(LifecycleEvent::Returned);
    }

    fn destroyed(&self, _instance: &T) {
        self.tracker.record(LifecycleEvent::Destroyed);
    }
}

#[cfg(feature = "prometheus")]
pub use self::registry::PrometheusObserver;

#[cfg(feature = "prometheus")]
mod registry {
    use crate::observer::{LifecycleEvent, LifecycleObserver};
    use prometheus::{IntCounterVec, Opts, Registry};

    /// Observer that records lifecycle events on a Prometheus registry
    ///
    /// Registers `objectpool_lifecycle_events_total{pool, event}`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lifecycle_pool::{LifecycleObserver, PrometheusObserver};
    /// use prometheus::Registry;
    ///
    /// let registry = Registry::new();
    /// let observer = PrometheusObserver::register(&registry, "bullets").unwrap();
    /// observer.requested(&3u32);
    ///
    /// assert_eq!(observer.value(lifecycle_pool::LifecycleEvent::Requested), 1);
    /// ```
    #[derive(Clone)]
    pub struct PrometheusObserver {
        events: IntCounterVec,
    }

    impl PrometheusObserver {
        pub fn register(registry: &Registry, pool_name: &str) -> prometheus::Result<Self> {
            let opts = Opts::new(
                "objectpool_lifecycle_events_total",
                "Lifecycle transitions observed in the pool",
            )
            .const_label("pool", pool_name);
            let events = IntCounterVec::new(opts, &["event"])?;
            registry.register(Box::new(events.clone()))?;

            // Pre-create every series so all four events show up as zero.
            for event in LifecycleEvent::ALL {
                events.with_label_values(&[event.as_str()]);
            }

            Ok(Self { events })
        }

        pub fn value(&self, event: LifecycleEvent) -> u64 {
            self.events.with_label_values(&[event.as_str()]).get()
        }

        fn record(&self, event: LifecycleEvent) {
            self.events.with_label_values(&[event.as_str()]).inc();
        }
    }

    impl<T> LifecycleObserver<T> for PrometheusObserver {
        fn created(&self, _instance: &T) {
            self.record(LifecycleEvent::Created);
        }

        fn requested(&self, _instance: &T) {
            self.record(LifecycleEvent::Requested);
        }

        fn returned(&self, _instance: &T) {
            self.record(LifecycleEvent::Returned);
        }

        fn destroyed(&self, _instance: &T) {
            self.record(LifecycleEvent::Destroyed);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_registry_gathers_all_events() {
            let registry = Registry::new();
            let observer = PrometheusObserver::register(&registry, "sparks").unwrap();
            observer.created(&1u32);
            observer.created(&2u32);

            let families = registry.gather();
            assert_eq!(families.len(), 1);
            assert_eq!(families[0].get_metric().len(), 4);
            assert_eq!(observer.value(LifecycleEvent::Created), 2);
            assert_eq!(observer.value(LifecycleEvent::Destroyed), 0);
        }

        #[test]
        fn test_duplicate_registration_fails() {
            let registry = Registry::new();
            PrometheusObserver::register(&registry, "sparks").unwrap();
            assert!(PrometheusObserver::register(&registry, "sparks").is_err());
        }
    }
}
