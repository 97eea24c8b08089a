//! Host-managed pool facade
//!
//! A host (a scene, a service, a connection handler) usually owns a pool for
//! exactly as long as it lives itself. [`ManagedPool`] captures that: it builds
//! its pool from a [`PoolProvider`] when started and disposes of it when
//! stopped or dropped.

use crate::config::PoolConfiguration;
use crate::errors::PoolResult;
use crate::handle::PoolHandle;
use crate::observer::{LifecycleObserver, NoopObserver};
use crate::pool::ObjectPool;
use crate::strategy::{CreationStrategy, DestructionStrategy, NoopDestruction};

use std::collections::HashMap;
use tracing::{debug, warn};

/// Supplies the collaborators and configuration for a [`ManagedPool`]
///
/// Only the creation strategy is mandatory. Override the other methods to
/// specialise the pool for a resource type.
pub trait PoolProvider<T: PoolHandle> {
    fn creation_strategy(&self) -> Box<dyn CreationStrategy<T>>;

    fn lifecycle_observer(&self) -> Box<dyn LifecycleObserver<T>> {
        Box::new(NoopObserver)
    }

    fn destruction_strategy(&self) -> Box<dyn DestructionStrategy<T>> {
        Box::new(NoopDestruction)
    }

    fn configuration(&self) -> PoolConfiguration {
        PoolConfiguration::default()
    }
}

/// Pool owned by a host for the host's lifetime
///
/// Dropping a `ManagedPool` disposes of it; use [`stop`](ManagedPool::stop)
/// to observe teardown errors instead of having them logged.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{CreationStrategy, FnCreation, ManagedPool, PoolConfiguration, PoolProvider};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct Bullets;
///
/// impl PoolProvider<u32> for Bullets {
///     fn creation_strategy(&self) -> Box<dyn CreationStrategy<u32>> {
///         let next = AtomicU32::new(0);
///         Box::new(FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed)))
///     }
///
///     fn configuration(&self) -> PoolConfiguration {
///         PoolConfiguration::new().with_initial_capacity(16)
///     }
/// }
///
/// let mut bullets = ManagedPool::start("bullets", &Bullets)?;
/// let bullet = bullets.request()?;
/// bullets.return_instance(bullet)?;
/// assert_eq!(bullets.pool().idle_count(), 16);
/// bullets.stop()?;
/// # Ok::<(), lifecycle_pool::PoolError>(())
/// ```
pub struct ManagedPool<T: PoolHandle> {
    name: String,
    pool: ObjectPool<T>,
}

impl<T: PoolHandle> ManagedPool<T> {
    /// Build the pool from `provider`
    pub fn start<P>(name: impl Into<String>, provider: &P) -> PoolResult<Self>
    where
        P: PoolProvider<T> + ?Sized,
    {
        let name = name.into();
        let pool = ObjectPool::from_parts(
            provider.creation_strategy(),
            provider.lifecycle_observer(),
            provider.destruction_strategy(),
            provider.configuration(),
        )?;

        debug!(pool = %name, idle = pool.idle_count(), "managed pool started");
        Ok(Self { name, pool })
    }

    pub fn request(&mut self) -> PoolResult<T> {
        self.pool.request()
    }

    pub fn return_instance(&mut self, instance: T) -> PoolResult<()> {
        self.pool.return_instance(instance)
    }

    pub fn is_in_pool(&self, instance: &T) -> PoolResult<bool> {
        self.pool.is_in_pool(instance)
    }

    pub fn is_in_use(&self, instance: &T) -> PoolResult<bool> {
        self.pool.is_in_use(instance)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying pool, for introspection
    pub fn pool(&self) -> &ObjectPool<T> {
        &self.pool
    }

    /// Export the pool's metrics in Prometheus format, labelled with its name
    pub fn export_metrics_prometheus(&self, tags: Option<&HashMap<String, String>>) -> String {
        self.pool.export_metrics_prometheus(&self.name, tags)
    }

    /// Dispose of the pool, reporting any teardown error
    pub fn stop(mut self) -> PoolResult<()> {
        debug!(pool = %self.name, "managed pool stopping");
        self.pool.dispose()
    }
}

impl<T: PoolHandle> Drop for ManagedPool<T> {
    fn drop(&mut self) {
        if self.pool.is_disposed() {
            return;
        }
        if let Err(err) = self.pool.dispose() {
            warn!(pool = %self.name, error = %err, "failed to dispose managed pool");
        }
    }
}
