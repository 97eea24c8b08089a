//! # lifecycle_pool
//!
//! Reusable-object pool with pluggable creation, destruction and lifecycle
//! observation.
//!
//! ## Features
//!
//! - Last-in-first-out reuse of idle objects, creation on demand when empty
//! - Return validation: only objects currently handed out can come back
//! - Lifecycle observers for created, requested, returned and destroyed
//!   transitions, composable as chains, decorators and broadcasts
//! - Configurable teardown of idle and in-use objects on dispose
//! - Thread-safe wrapper and host-managed facade
//! - Metrics, Prometheus export and health status
//!
//! ## Quick Start
//!
//! ```rust
//! use lifecycle_pool::{DefaultCreation, NoopDestruction, NoopObserver};
//! use lifecycle_pool::{ObjectPool, PoolConfiguration, Shared};
//!
//! let mut pool: ObjectPool<Shared<String>> = ObjectPool::new(
//!     DefaultCreation,
//!     NoopObserver,
//!     NoopDestruction,
//!     PoolConfiguration::new().with_initial_capacity(3),
//! )
//! .unwrap();
//!
//! let buffer = pool.request().unwrap();
//! println!("Got: {:?}", buffer);
//! pool.return_instance(buffer).unwrap();
//!
//! assert_eq!(pool.idle_count(), 3);
//! pool.dispose().unwrap();
//! ```

mod config;
mod errors;
mod facade;
mod handle;
mod health;
mod metrics;
mod observer;
mod pool;
mod shared;
mod strategy;

pub use config::PoolConfiguration;
pub use errors::{PoolError, PoolResult};
pub use facade::{ManagedPool, PoolProvider};
pub use handle::{PoolHandle, Shared};
pub use health::HealthStatus;
pub use metrics::{MetricsExporter, MetricsObserver, PoolMetrics};
#[cfg(feature = "prometheus")]
pub use metrics::PrometheusObserver;
pub use observer::{
    BroadcastObserver, LifecycleEvent, LifecycleObserver, NoopObserver, ObserverChain, Poolable,
    PoolableObserver,
};
pub use pool::{ObjectPool, ObjectPoolBuilder};
pub use shared::SharedPool;
pub use strategy::{
    CreationStrategy, DefaultCreation, DestructionStrategy, FnCreation, FnDestruction,
    NoopDestruction, TemplateCreation, TryFnCreation,
};
