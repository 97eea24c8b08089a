//! Creation and destruction strategies
//!
//! The pool never constructs or tears down resources itself. It asks a
//! [`CreationStrategy`] for new instances and hands instances it is done with
//! to a [`DestructionStrategy`].

use crate::errors::{PoolError, PoolResult};
use crate::handle::PoolHandle;

use std::sync::Arc;

/// Produces new resource instances for a pool
///
/// Implementations must either return a valid handle or fail with an error.
/// They must not touch the pool that calls them.
pub trait CreationStrategy<T>: Send {
    /// Create one new instance
    fn create(&self) -> PoolResult<T>;
}

/// Permanently disposes of resource instances
pub trait DestructionStrategy<T>: Send {
    /// Destroy the given instance
    ///
    /// Fails with [`PoolError::InvalidArgument`] if the handle is invalid.
    fn destroy(&self, instance: T) -> PoolResult<()>;
}

impl<T, C: CreationStrategy<T> + ?Sized> CreationStrategy<T> for Box<C> {
    fn create(&self) -> PoolResult<T> {
        (**self).create()
    }
}

impl<T, C: CreationStrategy<T> + Sync + ?Sized> CreationStrategy<T> for Arc<C> {
    fn create(&self) -> PoolResult<T> {
        (**self).create()
    }
}

impl<T, D: DestructionStrategy<T> + ?Sized> DestructionStrategy<T> for Box<D> {
    fn destroy(&self, instance: T) -> PoolResult<()> {
        (**self).destroy(instance)
    }
}

impl<T, D: DestructionStrategy<T> + Sync + ?Sized> DestructionStrategy<T> for Arc<D> {
    fn destroy(&self, instance: T) -> PoolResult<()> {
        (**self).destroy(instance)
    }
}

/// Creates instances from a template
///
/// Each call hands the template to `instantiate`, which builds a fresh
/// instance from it. The template itself is never pooled.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{CreationStrategy, TemplateCreation};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// struct Sprite {
///     id: u32,
///     texture: String,
/// }
///
/// let next = AtomicU32::new(0);
/// let creation = TemplateCreation::new("goblin.png".to_string(), move |texture: &String| Sprite {
///     id: next.fetch_add(1, Ordering::Relaxed),
///     texture: texture.clone(),
/// });
///
/// let first = creation.create().unwrap();
/// let second = creation.create().unwrap();
/// assert_eq!(first.texture, second.texture);
/// assert_ne!(first, second);
/// ```
pub struct TemplateCreation<P, F> {
    template: P,
    instantiate: F,
}

impl<P, F> TemplateCreation<P, F> {
    pub fn new(template: P, instantiate: F) -> Self {
        Self {
            template,
            instantiate,
        }
    }

    /// The template new instances are built from
    pub fn template(&self) -> &P {
        &self.template
    }
}

impl<T, P, F> CreationStrategy<T> for TemplateCreation<P, F>
where
    P: Send,
    F: Fn(&P) -> T + Send,
{
    fn create(&self) -> PoolResult<T> {
        Ok((self.instantiate)(&self.template))
    }
}

/// Creates instances through [`Default`]
///
/// Useful with handles whose identity is not their value, such as
/// [`Shared`](crate::Shared): every `Shared::default()` is a distinct object.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCreation;

impl<T: Default> CreationStrategy<T> for DefaultCreation {
    fn create(&self) -> PoolResult<T> {
        Ok(T::default())
    }
}

/// Creates instances with an infallible factory closure
///
/// # Examples
///
/// ```
/// use lifecycle_pool::{CreationStrategy, FnCreation};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let next = AtomicU32::new(1);
/// let creation = FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed));
///
/// assert_eq!(creation.create().unwrap(), 1);
/// assert_eq!(creation.create().unwrap(), 2);
/// ```
pub struct FnCreation<F> {
    factory: F,
}

impl<F> FnCreation<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<T, F> CreationStrategy<T> for FnCreation<F>
where
    F: Fn() -> T + Send,
{
    fn create(&self) -> PoolResult<T> {
        Ok((self.factory)())
    }
}

/// Creates instances with a factory closure that may fail
pub struct TryFnCreation<F> {
    factory: F,
}

impl<F> TryFnCreation<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<T, F> CreationStrategy<T> for TryFnCreation<F>
where
    F: Fn() -> PoolResult<T> + Send,
{
    fn create(&self) -> PoolResult<T> {
        (self.factory)()
    }
}

/// Destruction strategy that only validates the handle
///
/// Suitable for resources with no disposal cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDestruction;

impl<T: PoolHandle> DestructionStrategy<T> for NoopDestruction {
    fn destroy(&self, instance: T) -> PoolResult<()> {
        ensure_valid(&instance)
    }
}

/// Destroys instances by running a closure on them
pub struct FnDestruction<F> {
    destroy: F,
}

impl<F> FnDestruction<F> {
    pub fn new(destroy: F) -> Self {
        Self { destroy }
    }
}

impl<T, F> DestructionStrategy<T> for FnDestruction<F>
where
    T: PoolHandle,
    F: Fn(T) + Send,
{
    fn destroy(&self, instance: T) -> PoolResult<()> {
        ensure_valid(&instance)?;
        (self.destroy)(instance);
        Ok(())
    }
}

pub(crate) fn ensure_valid<T: PoolHandle>(instance: &T) -> PoolResult<()> {
    if instance.is_valid() {
        Ok(())
    } else {
        Err(PoolError::invalid("instance handle is absent or invalid"))
    }
}
