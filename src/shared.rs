//! Thread-safe wrapper around [`ObjectPool`]

use crate::errors::PoolResult;
use crate::handle::PoolHandle;
use crate::health::HealthStatus;
use crate::metrics::PoolMetrics;
use crate::pool::ObjectPool;

use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// Cloneable, thread-safe handle to an [`ObjectPool`]
///
/// Every operation holds the pool's lock for its whole duration, including
/// the calls into the creation strategy, destruction strategy and observer.
/// Those collaborators must therefore not call back into the same
/// `SharedPool`.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{DefaultCreation, NoopDestruction, NoopObserver, ObjectPool};
/// use lifecycle_pool::{PoolConfiguration, Shared, SharedPool};
/// use std::thread;
///
/// let pool: SharedPool<Shared<Vec<u8>>> = SharedPool::new(ObjectPool::new(
///     DefaultCreation,
///     NoopObserver,
///     NoopDestruction,
///     PoolConfiguration::new().with_initial_capacity(4),
/// )?);
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let pool = pool.clone();
///         thread::spawn(move || {
///             let buffer = pool.request().unwrap();
///             pool.return_instance(buffer).unwrap();
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert_eq!(pool.in_use_count(), 0);
/// # Ok::<(), lifecycle_pool::PoolError>(())
/// ```
pub struct SharedPool<T: PoolHandle> {
    inner: Arc<Mutex<ObjectPool<T>>>,
}

impl<T: PoolHandle> SharedPool<T> {
    pub fn new(pool: ObjectPool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    pub fn request(&self) -> PoolResult<T> {
        self.inner.lock().request()
    }

    pub fn return_instance(&self, instance: T) -> PoolResult<()> {
        self.inner.lock().return_instance(instance)
    }

    pub fn dispose(&self) -> PoolResult<()> {
        self.inner.lock().dispose()
    }

    pub fn is_in_pool(&self, instance: &T) -> PoolResult<bool> {
        self.inner.lock().is_in_pool(instance)
    }

    pub fn is_in_use(&self, instance: &T) -> PoolResult<bool> {
        self.inner.lock().is_in_use(instance)
    }

    pub fn idle_count(&self) -> usize {
        self.inner.lock().idle_count()
    }

    pub fn in_use_count(&self) -> usize {
        self.inner.lock().in_use_count()
    }

    pub fn get_metrics(&self) -> PoolMetrics {
        self.inner.lock().get_metrics()
    }

    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.inner.lock().export_metrics()
    }

    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        self.inner.lock().export_metrics_prometheus(pool_name, tags)
    }

    pub fn get_health_status(&self) -> HealthStatus {
        self.inner.lock().get_health_status()
    }

    /// Lock the pool for a sequence of operations that must not interleave
    /// with other callers
    pub fn lock(&self) -> MutexGuard<'_, ObjectPool<T>> {
        self.inner.lock()
    }
}

impl<T: PoolHandle> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: PoolHandle> From<ObjectPool<T>> for SharedPool<T> {
    fn from(pool: ObjectPool<T>) -> Self {
        Self::new(pool)
    }
}
