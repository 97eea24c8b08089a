//! Pool configuration options

/// Configuration for object pool behavior
///
/// Immutable once handed to a pool.
///
/// # Examples
///
/// ```
/// use lifecycle_pool::PoolConfiguration;
///
/// let config = PoolConfiguration::new()
///     .with_initial_capacity(8)
///     .with_destroy_in_use_on_dispose(true);
///
/// assert_eq!(config.initial_capacity, 8);
/// assert!(config.destroy_idle_on_dispose);
/// assert!(config.destroy_in_use_on_dispose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of objects created eagerly when the pool is constructed
    #[cfg_attr(
        feature = "serde",
        serde(deserialize_with = "clamped_capacity::deserialize")
    )]
    pub initial_capacity: usize,

    /// Whether idle objects are destroyed when the pool is disposed
    pub destroy_idle_on_dispose: bool,

    /// Whether objects still checked out are destroyed when the pool is disposed
    pub destroy_in_use_on_dispose: bool,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            destroy_idle_on_dispose: true,
            destroy_in_use_on_dispose: false,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of objects created up front
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the initial capacity from a signed value, clamping negatives to zero
    ///
    /// # Examples
    ///
    /// ```
    /// use lifecycle_pool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_signed_initial_capacity(-4);
    /// assert_eq!(config.initial_capacity, 0);
    /// ```
    pub fn with_signed_initial_capacity(mut self, capacity: i64) -> Self {
        self.initial_capacity = clamp_capacity(capacity);
        self
    }

    /// Destroy idle objects on dispose
    pub fn with_destroy_idle_on_dispose(mut self, destroy: bool) -> Self {
        self.destroy_idle_on_dispose = destroy;
        self
    }

    /// Destroy checked-out objects on dispose
    pub fn with_destroy_in_use_on_dispose(mut self, destroy: bool) -> Self {
        self.destroy_in_use_on_dispose = destroy;
        self
    }
}

fn clamp_capacity(capacity: i64) -> usize {
    usize::try_from(capacity.max(0)).unwrap_or(usize::MAX)
}

#[cfg(feature = "serde")]
mod clamped_capacity {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(super::clamp_capacity)
    }
}
