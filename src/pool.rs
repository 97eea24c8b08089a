//! Core object pool implementation

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::handle::PoolHandle;
use crate::health::HealthStatus;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::observer::{LifecycleEvent, LifecycleObserver};
use crate::strategy::{CreationStrategy, DestructionStrategy, ensure_valid};

use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use tracing::{debug, trace, warn};

/// Object pool that recycles instances produced by a creation strategy
///
/// The pool tracks every instance it produced as either idle (available for
/// reuse) or in use (handed out and not yet returned). Idle instances are
/// reused most-recently-returned first. When no idle instance exists the
/// creation strategy is asked for a new one; there is no upper bound on the
/// number of instances in use.
///
/// Every transition is reported to the lifecycle observer:
///
/// - `created` when an instance is fabricated (eagerly or on demand)
/// - `requested` when it is handed out
/// - `returned` when it is handed back
/// - `destroyed` right before it is passed to the destruction strategy
///
/// The pool does no locking; wrap it in a [`SharedPool`](crate::SharedPool)
/// to use it from several threads.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{FnCreation, NoopDestruction, NoopObserver, ObjectPool, PoolConfiguration};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let next = AtomicU32::new(1);
/// let mut pool = ObjectPool::new(
///     FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed)),
///     NoopObserver,
///     NoopDestruction,
///     PoolConfiguration::new().with_initial_capacity(2),
/// )?;
///
/// let id = pool.request()?;
/// assert!(pool.is_in_use(&id)?);
///
/// pool.return_instance(id)?;
/// assert!(pool.is_in_pool(&id)?);
///
/// pool.dispose()?;
/// # Ok::<(), lifecycle_pool::PoolError>(())
/// ```
pub struct ObjectPool<T: PoolHandle> {
    creation: Box<dyn CreationStrategy<T>>,
    observer: Box<dyn LifecycleObserver<T>>,
    destruction: Box<dyn DestructionStrategy<T>>,
    config: PoolConfiguration,
    idle: IndexSet<T>,
    in_use: IndexSet<T>,
    metrics: MetricsTracker,
    disposed: bool,
}

impl<T: PoolHandle> ObjectPool<T> {
    /// Create a new pool and eagerly fill it with `config.initial_capacity` objects
    ///
    /// If the creation strategy fails while filling, the error is returned.
    /// The objects created so far are destroyed when
    /// `destroy_idle_on_dispose` is set and released otherwise, the same as a
    /// dispose of the idle set would do.
    pub fn new(
        creation: impl CreationStrategy<T> + 'static,
        observer: impl LifecycleObserver<T> + 'static,
        destruction: impl DestructionStrategy<T> + 'static,
        config: PoolConfiguration,
    ) -> PoolResult<Self> {
        Self::from_parts(
            Box::new(creation),
            Box::new(observer),
            Box::new(destruction),
            config,
        )
    }

    /// Start building a pool whose collaborators are supplied one by one
    pub fn builder() -> ObjectPoolBuilder<T> {
        ObjectPoolBuilder::new()
    }

    pub(crate) fn from_parts(
        creation: Box<dyn CreationStrategy<T>>,
        observer: Box<dyn LifecycleObserver<T>>,
        destruction: Box<dyn DestructionStrategy<T>>,
        config: PoolConfiguration,
    ) -> PoolResult<Self> {
        let mut pool = Self {
            creation,
            observer,
            destruction,
            config,
            idle: IndexSet::new(),
            in_use: IndexSet::new(),
            metrics: MetricsTracker::new(),
            disposed: false,
        };

        for _ in 0..config.initial_capacity {
            let instance = match pool.create() {
                Ok(instance) => instance,
                Err(err) => {
                    warn!(error = %err, created = pool.idle.len(), "failed to fill object pool");
                    pool.abandon();
                    return Err(err);
                }
            };
            pool.idle.insert(instance.clone());
            pool.observer.created(&instance);
        }

        debug!(
            initial_capacity = config.initial_capacity,
            destroy_idle_on_dispose = config.destroy_idle_on_dispose,
            destroy_in_use_on_dispose = config.destroy_in_use_on_dispose,
            "object pool created"
        );
        Ok(pool)
    }

    /// Hand out an object, reusing the most recently returned idle one if any
    pub fn request(&mut self) -> PoolResult<T> {
        self.ensure_live()?;

        let instance = match self.idle.pop() {
            Some(instance) => instance,
            None => {
                let instance = self.create()?;
                self.metrics.created_on_demand.fetch_add(1, Ordering::Relaxed);
                self.observer.created(&instance);
                instance
            }
        };

        self.in_use.insert(instance.clone());
        self.metrics.record(LifecycleEvent::Requested);
        self.observer.requested(&instance);

        trace!(idle = self.idle.len(), in_use = self.in_use.len(), "object requested");
        Ok(instance)
    }

    /// Hand an object back to the pool
    ///
    /// Fails with [`PoolError::InvalidArgument`] for an invalid handle and with
    /// [`PoolError::NotOwned`] if the object is not currently in use by this
    /// pool. A rejected return leaves the pool untouched.
    pub fn return_instance(&mut self, instance: T) -> PoolResult<()> {
        self.ensure_live()?;

        if let Err(err) = ensure_valid(&instance) {
            self.metrics.rejected_returns.fetch_add(1, Ordering::Relaxed);
            return Err(err);
        }

        if self.in_use.swap_remove(&instance) {
            self.idle.insert(instance.clone());
            self.metrics.record(LifecycleEvent::Returned);
            self.observer.returned(&instance);

            trace!(idle = self.idle.len(), in_use = self.in_use.len(), "object returned");
            Ok(())
        } else {
            self.metrics.rejected_returns.fetch_add(1, Ordering::Relaxed);
            Err(PoolError::NotOwned)
        }
    }

    /// Tear the pool down
    ///
    /// Idle and in-use objects are destroyed according to the configuration;
    /// for each one the observer's `destroyed` hook runs before the
    /// destruction strategy. Objects that are not destroyed are released from
    /// bookkeeping and stay with whoever holds them.
    ///
    /// A failing destruction does not stop the teardown; the first failure is
    /// returned once every object has been handled. Disposing twice is a no-op.
    pub fn dispose(&mut self) -> PoolResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;

        let idle = std::mem::take(&mut self.idle);
        let in_use = std::mem::take(&mut self.in_use);
        let mut first_error = None;

        if self.config.destroy_idle_on_dispose {
            // Same order the stack would hand them out in.
            for instance in idle.into_iter().rev() {
                self.destroy(instance, &mut first_error);
            }
        }

        if self.config.destroy_in_use_on_dispose {
            for instance in in_use {
                self.destroy(instance, &mut first_error);
            }
        }

        debug!(
            destroyed = self.metrics.count(LifecycleEvent::Destroyed),
            "object pool disposed"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Whether the object is idle in this pool
    pub fn is_in_pool(&self, instance: &T) -> PoolResult<bool> {
        ensure_valid(instance)?;
        Ok(self.idle.contains(instance))
    }

    /// Whether the object is currently handed out by this pool
    pub fn is_in_use(&self, instance: &T) -> PoolResult<bool> {
        ensure_valid(instance)?;
        Ok(self.in_use.contains(instance))
    }

    /// Get idle count
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Get in-use count
    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Idle objects, the next one to be handed out first
    pub fn idle(&self) -> impl Iterator<Item = &T> {
        self.idle.iter().rev()
    }

    /// Objects currently handed out
    pub fn in_use(&self) -> impl Iterator<Item = &T> {
        self.in_use.iter()
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Get pool metrics
    pub fn get_metrics(&self) -> PoolMetrics {
        self.metrics.get_metrics(self.in_use.len(), self.idle.len())
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.get_metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.get_metrics(), pool_name, tags)
    }

    /// Get health status
    pub fn get_health_status(&self) -> HealthStatus {
        HealthStatus::new(self.idle.len(), self.in_use.len(), self.disposed)
    }

    fn ensure_live(&self) -> PoolResult<()> {
        if self.disposed {
            Err(PoolError::Disposed)
        } else {
            Ok(())
        }
    }

    fn create(&self) -> PoolResult<T> {
        let instance = self.creation.create()?;

        if !instance.is_valid() {
            return Err(PoolError::invalid("creation strategy produced an invalid handle"));
        }
        if self.idle.contains(&instance) || self.in_use.contains(&instance) {
            return Err(PoolError::invalid(
                "creation strategy produced an object already tracked by this pool",
            ));
        }

        self.metrics.record(LifecycleEvent::Created);
        Ok(instance)
    }

    fn destroy(&self, instance: T, first_error: &mut Option<PoolError>) {
        self.observer.destroyed(&instance);
        self.metrics.record(LifecycleEvent::Destroyed);

        if let Err(err) = self.destruction.destroy(instance) {
            warn!(error = %err, "failed to destroy pooled object");
            first_error.get_or_insert(err);
        }
    }

    /// Release everything created by a construction that did not finish
    fn abandon(&mut self) {
        let idle = std::mem::take(&mut self.idle);
        self.disposed = true;
        if !self.config.destroy_idle_on_dispose {
            return;
        }

        let mut first_error = None;
        for instance in idle.into_iter().rev() {
            self.destroy(instance, &mut first_error);
        }
    }
}

/// Builder for [`ObjectPool`]
///
/// Unlike [`ObjectPool::new`], the collaborators are optional until
/// [`build`](ObjectPoolBuilder::build) is called, which reports the first
/// missing one as [`PoolError::InvalidArgument`]. The configuration defaults
/// to [`PoolConfiguration::default`].
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{DefaultCreation, NoopDestruction, NoopObserver, ObjectPool, PoolError};
///
/// let missing = ObjectPool::<u64>::builder()
///     .creation(DefaultCreation)
///     .destruction(NoopDestruction)
///     .build();
/// assert!(matches!(missing, Err(PoolError::InvalidArgument(_))));
///
/// let pool = ObjectPool::<u64>::builder()
///     .creation(DefaultCreation)
///     .observer(NoopObserver)
///     .destruction(NoopDestruction)
///     .build()
///     .unwrap();
/// assert_eq!(pool.idle_count(), 0);
/// ```
pub struct ObjectPoolBuilder<T: PoolHandle> {
    creation: Option<Box<dyn CreationStrategy<T>>>,
    observer: Option<Box<dyn LifecycleObserver<T>>>,
    destruction: Option<Box<dyn DestructionStrategy<T>>>,
    config: Option<PoolConfiguration>,
}

impl<T: PoolHandle> ObjectPoolBuilder<T> {
    pub fn new() -> Self {
        Self {
            creation: None,
            observer: None,
            destruction: None,
            config: None,
        }
    }

    pub fn creation(mut self, creation: impl CreationStrategy<T> + 'static) -> Self {
        self.creation = Some(Box::new(creation));
        self
    }

    pub fn observer(mut self, observer: impl LifecycleObserver<T> + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn destruction(mut self, destruction: impl DestructionStrategy<T> + 'static) -> Self {
        self.destruction = Some(Box::new(destruction));
        self
    }

    pub fn config(mut self, config: PoolConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the collaborators and construct the pool
    pub fn build(self) -> PoolResult<ObjectPool<T>> {
        let creation = self
            .creation
            .ok_or_else(|| PoolError::invalid("creation strategy is required"))?;
        let observer = self
            .observer
            .ok_or_else(|| PoolError::invalid("lifecycle observer is required"))?;
        let destruction = self
            .destruction
            .ok_or_else(|| PoolError::invalid("destruction strategy is required"))?;

        ObjectPool::from_parts(creation, observer, destruction, self.config.unwrap_or_default())
    }
}

impl<T: PoolHandle> Default for ObjectPoolBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::strategy::{FnCreation, NoopDestruction, TryFnCreation};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    type Log = Arc<Mutex<Vec<(LifecycleEvent, u32)>>>;

    struct Recorder(Log);

    impl LifecycleObserver<u32> for Recorder {
        fn created(&self, instance: &u32) {
            self.0.lock().push((LifecycleEvent::Created, *instance));
        }

        fn requested(&self, instance: &u32) {
            self.0.lock().push((LifecycleEvent::Requested, *instance));
        }

        fn returned(&self, instance: &u32) {
            self.0.lock().push((LifecycleEvent::Returned, *instance));
        }

        fn destroyed(&self, instance: &u32) {
            self.0.lock().push((LifecycleEvent::Destroyed, *instance));
        }
    }

    fn counting() -> FnCreation<impl Fn() -> u32 + Send> {
        let next = AtomicU32::new(1);
        FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed))
    }

    fn pool_with(capacity: usize, log: &Log) -> ObjectPool<u32> {
        ObjectPool::new(
            counting(),
            Recorder(Arc::clone(log)),
            NoopDestruction,
            PoolConfiguration::new().with_initial_capacity(capacity),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_capacity_announced_in_order() {
        let log: Log = Arc::default();
        let pool = pool_with(3, &log);

        assert_eq!(pool.idle_count(), 3);
        assert_eq!(
            *log.lock(),
            vec![
                (LifecycleEvent::Created, 1),
                (LifecycleEvent::Created, 2),
                (LifecycleEvent::Created, 3),
            ]
        );
    }

    #[test]
    fn test_request_on_empty_pool_announces_creation_first() {
        let log: Log = Arc::default();
        let mut pool = pool_with(0, &log);

        let id = pool.request().unwrap();

        assert_eq!(
            *log.lock(),
            vec![(LifecycleEvent::Created, id), (LifecycleEvent::Requested, id)]
        );
        assert_eq!(pool.get_metrics().created_on_demand, 1);
    }

    #[test]
    fn test_request_reuses_last_returned() {
        let log: Log = Arc::default();
        let mut pool = pool_with(0, &log);

        let a = pool.request().unwrap();
        let b = pool.request().unwrap();
        pool.return_instance(a).unwrap();
        pool.return_instance(b).unwrap();

        assert_eq!(pool.idle().copied().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(pool.request().unwrap(), b);
        assert_eq!(pool.request().unwrap(), a);
    }

    #[test]
    fn test_double_return_is_rejected_without_side_effects() {
        let log: Log = Arc::default();
        let mut pool = pool_with(1, &log);

        let id = pool.request().unwrap();
        pool.return_instance(id).unwrap();
        let events = log.lock().len();

        assert_eq!(pool.return_instance(id), Err(PoolError::NotOwned));
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(log.lock().len(), events);
        assert_eq!(pool.get_metrics().rejected_returns, 1);
    }

    #[test]
    fn test_invalid_handle_is_rejected() {
        let mut pool: ObjectPool<Option<u32>> = ObjectPool::new(
            FnCreation::new(|| Some(1)),
            NoopObserver,
            NoopDestruction,
            PoolConfiguration::default(),
        )
        .unwrap();

        assert!(matches!(pool.return_instance(None), Err(PoolError::InvalidArgument(_))));
        assert!(matches!(pool.is_in_pool(&None), Err(PoolError::InvalidArgument(_))));
        assert!(matches!(pool.is_in_use(&None), Err(PoolError::InvalidArgument(_))));
    }

    #[test]
    fn test_creation_strategy_returning_invalid_handle_fails() {
        let mut pool: ObjectPool<Option<u32>> = ObjectPool::new(
            FnCreation::new(|| None),
            NoopObserver,
            NoopDestruction,
            PoolConfiguration::default(),
        )
        .unwrap();

        assert!(matches!(pool.request(), Err(PoolError::InvalidArgument(_))));
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_creation_strategy_repeating_an_instance_fails() {
        let mut pool: ObjectPool<u32> = ObjectPool::new(
            FnCreation::new(|| 42),
            NoopObserver,
            NoopDestruction,
            PoolConfiguration::default(),
        )
        .unwrap();

        assert_eq!(pool.request().unwrap(), 42);
        assert!(matches!(pool.request(), Err(PoolError::InvalidArgument(_))));
        assert_eq!(pool.in_use_count(), 1);
    }

    #[test]
    fn test_failed_construction_destroys_partial_fill() {
        let log: Log = Arc::default();
        let next = AtomicU32::new(1);
        let creation = TryFnCreation::new(move || {
            let id = next.fetch_add(1, Ordering::Relaxed);
            if id == 3 {
                Err(PoolError::CreationFailed("device lost".to_string()))
            } else {
                Ok(id)
            }
        });

        let result = ObjectPool::new(
            creation,
            Recorder(Arc::clone(&log)),
            NoopDestruction,
            PoolConfiguration::new().with_initial_capacity(5),
        );

        assert!(matches!(result, Err(PoolError::CreationFailed(_))));
        assert_eq!(
            *log.lock(),
            vec![
                (LifecycleEvent::Created, 1),
                (LifecycleEvent::Created, 2),
                (LifecycleEvent::Destroyed, 2),
                (LifecycleEvent::Destroyed, 1),
            ]
        );
    }

    #[test]
    fn test_failed_construction_keeps_partial_fill_when_idle_is_not_destroyed() {
        let log: Log = Arc::default();
        let next = AtomicU32::new(1);
        let creation = TryFnCreation::new(move || {
            let id = next.fetch_add(1, Ordering::Relaxed);
            if id == 3 {
                Err(PoolError::CreationFailed("device lost".to_string()))
            } else {
                Ok(id)
            }
        });

        let result = ObjectPool::new(
            creation,
            Recorder(Arc::clone(&log)),
            NoopDestruction,
            PoolConfiguration::new()
                .with_initial_capacity(5)
                .with_destroy_idle_on_dispose(false),
        );

        assert!(matches!(result, Err(PoolError::CreationFailed(_))));
        assert_eq!(
            *log.lock(),
            vec![(LifecycleEvent::Created, 1), (LifecycleEvent::Created, 2)]
        );
    }

    #[test]
    fn test_huge_initial_capacity_reports_creation_failure() {
        let result: PoolResult<ObjectPool<u32>> = ObjectPool::new(
            TryFnCreation::new(|| Err(PoolError::CreationFailed("nope".to_string()))),
            NoopObserver,
            NoopDestruction,
            PoolConfiguration::new().with_signed_initial_capacity(i64::MAX),
        );

        assert_eq!(
            result.err(),
            Some(PoolError::CreationFailed("nope".to_string()))
        );
    }

    #[test]
    fn test_dispose_is_terminal_and_idempotent() {
        let log: Log = Arc::default();
        let mut pool = pool_with(2, &log);
        let id = pool.request().unwrap();

        pool.dispose().unwrap();
        let events = log.lock().len();
        pool.dispose().unwrap();

        assert_eq!(log.lock().len(), events);
        assert!(pool.is_disposed());
        assert_eq!(pool.request(), Err(PoolError::Disposed));
        assert_eq!(pool.return_instance(id), Err(PoolError::Disposed));
        assert_eq!(pool.is_in_use(&id), Ok(false));
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_dispose_continues_after_destruction_failure() {
        struct Failing(Arc<Mutex<Vec<u32>>>);

        impl DestructionStrategy<u32> for Failing {
            fn destroy(&self, instance: u32) -> PoolResult<()> {
                self.0.lock().push(instance);
                Err(PoolError::DestructionFailed(format!("busy {instance}")))
            }
        }

        let attempts = Arc::new(Mutex::new(Vec::new()));
        let mut pool = ObjectPool::new(
            counting(),
            NoopObserver,
            Failing(Arc::clone(&attempts)),
            PoolConfiguration::new().with_initial_capacity(3),
        )
        .unwrap();

        assert_eq!(
            pool.dispose(),
            Err(PoolError::DestructionFailed("busy 3".to_string()))
        );
        assert_eq!(*attempts.lock(), vec![3, 2, 1]);
    }

    #[test]
    fn test_builder_reports_missing_collaborators() {
        let no_creation = ObjectPool::<u32>::builder()
            .observer(NoopObserver)
            .destruction(NoopDestruction)
            .build();
        assert_eq!(
            no_creation.err(),
            Some(PoolError::InvalidArgument("creation strategy is required".to_string()))
        );

        let no_destruction = ObjectPool::<u32>::builder()
            .creation(counting())
            .observer(NoopObserver)
            .build();
        assert_eq!(
            no_destruction.err(),
            Some(PoolError::InvalidArgument("destruction strategy is required".to_string()))
        );

        let no_observer = ObjectPool::<u32>::builder()
            .creation(counting())
            .destruction(NoopDestruction)
            .build();
        assert_eq!(
            no_observer.err(),
            Some(PoolError::InvalidArgument("lifecycle observer is required".to_string()))
        );
    }

    #[test]
    fn test_builder_uses_default_config() {
        let pool = ObjectPool::<u32>::builder()
            .creation(counting())
            .observer(NoopObserver)
            .destruction(NoopDestruction)
            .build()
            .unwrap();

        assert_eq!(*pool.config(), PoolConfiguration::default());
    }

    #[test]
    fn test_health_and_metrics_export() {
        let log: Log = Arc::default();
        let mut pool = pool_with(1, &log);
        let _id = pool.request().unwrap();

        let health = pool.get_health_status();
        assert!(!health.is_healthy());
        assert_eq!(health.in_use_objects, 1);

        let metrics = pool.export_metrics();
        assert_eq!(metrics.get("total_requested"), Some(&"1".to_string()));
        assert_eq!(metrics.get("utilization"), Some(&"1.00".to_string()));

        let output = pool.export_metrics_prometheus("bullets", None);
        assert!(output.contains("objectpool_objects_in_use{pool=\"bullets\"} 1"));
    }
}
