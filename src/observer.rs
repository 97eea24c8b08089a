//! Lifecycle observers
//!
//! An observer is told about every transition an instance goes through in a
//! pool: created, requested, returned and destroyed. Observers are pure
//! notifications. They never affect pool bookkeeping, which is what lets
//! resource-specific behavior live outside the pool.
//!
//! Observers compose:
//!
//! - [`ObserverChain`] forwards to several observers in insertion order.
//! - [`PoolableObserver`] wraps a base observer and additionally calls the
//!   resource's own [`Poolable`] callbacks.
//! - [`BroadcastObserver`] fans events out to named listeners.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The four transitions an instance goes through in a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    /// The instance was fabricated by the creation strategy.
    Created,
    /// The instance was handed out to a caller.
    Requested,
    /// The instance was handed back by a caller.
    Returned,
    /// The instance is about to be destroyed.
    Destroyed,
}

impl LifecycleEvent {
    /// All events, in lifecycle order
    pub const ALL: [LifecycleEvent; 4] = [
        LifecycleEvent::Created,
        LifecycleEvent::Requested,
        LifecycleEvent::Returned,
        LifecycleEvent::Destroyed,
    ];

    /// Lowercase name, suitable for metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Requested => "requested",
            Self::Returned => "returned",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives notifications for pool lifecycle transitions
///
/// Every hook defaults to doing nothing, so implementations only override the
/// events they care about. `destroyed` is called while the instance is still
/// alive, right before it is passed to the destruction strategy.
pub trait LifecycleObserver<T>: Send {
    fn created(&self, _instance: &T) {}

    fn requested(&self, _instance: &T) {}

    fn returned(&self, _instance: &T) {}

    fn destroyed(&self, _instance: &T) {}

    /// Dispatch an event to the matching hook
    fn notify(&self, event: LifecycleEvent, instance: &T) {
        match event {
            LifecycleEvent::Created => self.created(instance),
            LifecycleEvent::Requested => self.requested(instance),
            LifecycleEvent::Returned => self.returned(instance),
            LifecycleEvent::Destroyed => self.destroyed(instance),
        }
    }
}

impl<T, O: LifecycleObserver<T> + ?Sized> LifecycleObserver<T> for Box<O> {
    fn created(&self, instance: &T) {
        (**self).created(instance)
    }

    fn requested(&self, instance: &T) {
        (**self).requested(instance)
    }

    fn returned(&self, instance: &T) {
        (**self).returned(instance)
    }

    fn destroyed(&self, instance: &T) {
        (**self).destroyed(instance)
    }
}

impl<T, O: LifecycleObserver<T> + Sync + ?Sized> LifecycleObserver<T> for Arc<O> {
    fn created(&self, instance: &T) {
        (**self).created(instance)
    }

    fn requested(&self, instance: &T) {
        (**self).requested(instance)
    }

    fn returned(&self, instance: &T) {
        (**self).returned(instance)
    }

    fn destroyed(&self, instance: &T) {
        (**self).destroyed(instance)
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<T> LifecycleObserver<T> for NoopObserver {}

/// Forwards every event to a list of observers, in the order they were added
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{LifecycleObserver, NoopObserver, ObserverChain};
///
/// let chain = ObserverChain::<u32>::new()
///     .with(NoopObserver)
///     .with(NoopObserver);
///
/// assert_eq!(chain.len(), 2);
/// chain.created(&1);
/// ```
pub struct ObserverChain<T> {
    observers: Vec<Box<dyn LifecycleObserver<T>>>,
}

impl<T> ObserverChain<T> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Append an observer; it runs after every observer already in the chain
    pub fn with(mut self, observer: impl LifecycleObserver<T> + 'static) -> Self {
        self.push(observer);
        self
    }

    pub fn push(&mut self, observer: impl LifecycleObserver<T> + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> Default for ObserverChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LifecycleObserver<T> for ObserverChain<T> {
    fn created(&self, instance: &T) {
        self.observers.iter().for_each(|o| o.created(instance));
    }

    fn requested(&self, instance: &T) {
        self.observers.iter().for_each(|o| o.requested(instance));
    }

    fn returned(&self, instance: &T) {
        self.observers.iter().for_each(|o| o.returned(instance));
    }

    fn destroyed(&self, instance: &T) {
        self.observers.iter().for_each(|o| o.destroyed(instance));
    }
}

/// A resource that wants to react to being handed out and handed back
pub trait Poolable {
    /// Called after the instance has been requested from its pool.
    fn on_requested(&self);

    /// Called when the instance is being returned to its pool.
    fn on_returned(&self);
}

/// Decorates a base observer with the resource's own [`Poolable`] callbacks
///
/// Ordering:
///
/// - request: base `requested`, then `on_requested`
/// - return: `on_returned`, then base `returned`
/// - created and destroyed go to the base observer only
///
/// The resource therefore sees itself fully set up when it is told it was
/// requested, and is still set up when it is told it is being returned.
pub struct PoolableObserver<O> {
    base: O,
}

impl<O> PoolableObserver<O> {
    pub fn new(base: O) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &O {
        &self.base
    }
}

impl Default for PoolableObserver<NoopObserver> {
    fn default() -> Self {
        Self::new(NoopObserver)
    }
}

impl<T, O> LifecycleObserver<T> for PoolableObserver<O>
where
    T: Poolable,
    O: LifecycleObserver<T>,
{
    fn created(&self, instance: &T) {
        self.base.created(instance);
    }

    fn requested(&self, instance: &T) {
        self.base.requested(instance);
        instance.on_requested();
    }

    fn returned(&self, instance: &T) {
        instance.on_returned();
        self.base.returned(instance);
    }

    fn destroyed(&self, instance: &T) {
        self.base.destroyed(instance);
    }
}

type Listener<T> = Arc<dyn Fn(LifecycleEvent, &T) + Send + Sync>;

/// Fans lifecycle events out to listeners registered by name
///
/// Listeners are invoked in ascending name order. Registering a listener under
/// an existing name replaces it. The listener set can change while the
/// observer is installed in a pool, through a cloned handle.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{BroadcastObserver, LifecycleEvent, LifecycleObserver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let broadcast = BroadcastObserver::<u32>::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// broadcast.subscribe("audio", move |event, _| {
///     if event == LifecycleEvent::Requested {
///         counter.fetch_add(1, Ordering::Relaxed);
///     }
/// });
///
/// broadcast.requested(&5);
/// assert_eq!(seen.load(Ordering::Relaxed), 1);
/// ```
pub struct BroadcastObserver<T> {
    listeners: Arc<RwLock<BTreeMap<String, Listener<T>>>>,
}

impl<T> BroadcastObserver<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Register a listener, replacing any listener with the same name
    pub fn subscribe<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(LifecycleEvent, &T) + Send + Sync + 'static,
    {
        self.listeners.write().insert(name.into(), Arc::new(listener));
    }

    /// Remove a listener; returns whether one was registered under `name`
    pub fn unsubscribe(&self, name: &str) -> bool {
        self.listeners.write().remove(name).is_some()
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.listeners.read().keys().cloned().collect()
    }

    fn broadcast(&self, event: LifecycleEvent, instance: &T) {
        // Snapshot so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<Listener<T>> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener(event, instance);
        }
    }
}

impl<T> Clone for BroadcastObserver<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T> Default for BroadcastObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LifecycleObserver<T> for BroadcastObserver<T> {
    fn created(&self, instance: &T) {
        self.broadcast(LifecycleEvent::Created, instance);
    }

    fn requested(&self, instance: &T) {
        self.broadcast(LifecycleEvent::Requested, instance);
    }

    fn returned(&self, instance: &T) {
        self.broadcast(LifecycleEvent::Returned, instance);
    }

    fn destroyed(&self, instance: &T) {
        self.broadcast(LifecycleEvent::Destroyed, instance);
    }
}
