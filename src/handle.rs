//! Handles to pooled resources

use crate::observer::Poolable;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// An opaque handle to a pooled resource
///
/// The pool tracks handles by identity, so two handles that compare equal are
/// treated as the same resource. Handles are cloned freely: one copy stays in
/// the pool's bookkeeping while another is handed to the caller.
///
/// `is_valid` lets a handle type express "absent" or "already released". The
/// pool rejects invalid handles with [`PoolError::InvalidArgument`].
///
/// [`PoolError::InvalidArgument`]: crate::PoolError::InvalidArgument
///
/// # Examples
///
/// ```
/// use lifecycle_pool::PoolHandle;
///
/// #[derive(Clone, PartialEq, Eq, Hash)]
/// struct Slot(u32);
///
/// impl PoolHandle for Slot {}
///
/// assert!(Slot(3).is_valid());
/// assert!(!None::<Slot>.is_valid());
/// ```
pub trait PoolHandle: Clone + Eq + Hash {
    /// Whether this handle refers to a live resource
    fn is_valid(&self) -> bool {
        true
    }
}

impl<H: PoolHandle> PoolHandle for Option<H> {
    fn is_valid(&self) -> bool {
        self.as_ref().is_some_and(PoolHandle::is_valid)
    }
}

macro_rules! integer_handles {
    ($($ty:ty),*) => {
        $(impl PoolHandle for $ty {})*
    };
}

integer_handles!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Reference-counted handle compared by identity rather than by value
///
/// Two `Shared` handles are equal only if they point to the same allocation,
/// which makes it the natural handle for pooling heavier resources that are
/// not themselves comparable.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::Shared;
///
/// let a = Shared::new(vec![0u8; 16]);
/// let b = Shared::new(vec![0u8; 16]);
///
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// assert_eq!(a.len(), 16);
/// ```
pub struct Shared<T>(Arc<T>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Number of clones of this handle currently alive
    pub fn handle_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for Shared<T> {}

impl<T> Hash for Shared<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&*self.0).finish()
    }
}

impl<T> PoolHandle for Shared<T> {}

impl<T: Poolable> Poolable for Shared<T> {
    fn on_requested(&self) {
        self.0.on_requested();
    }

    fn on_returned(&self) {
        self.0.on_returned();
    }
}
