//! Health monitoring for object pools

/// Health status of an object pool
///
/// # Examples
///
/// ```
/// use lifecycle_pool::HealthStatus;
///
/// let health = HealthStatus::new(3, 1, false);
/// assert!(health.is_healthy());
/// assert_eq!(health.idle_objects, 3);
///
/// let exhausted = HealthStatus::new(0, 10, false);
/// assert!(!exhausted.is_healthy());
/// assert_eq!(exhausted.warning_count, 2);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Share of tracked objects that are checked out (0.0 to 1.0)
    pub utilization: f64,

    /// Idle objects count
    pub idle_objects: usize,

    /// Checked-out objects count
    pub in_use_objects: usize,

    /// Whether the pool has been disposed
    pub disposed: bool,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    /// Create a new health status
    pub fn new(idle: usize, in_use: usize, disposed: bool) -> Self {
        let tracked = idle + in_use;
        let utilization = if tracked > 0 {
            in_use as f64 / tracked as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if disposed {
            warnings.push("Pool has been disposed".to_string());
            is_healthy = false;
        }

        // Check for high utilization
        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        // Every request will go through the creation strategy
        if idle == 0 && !disposed {
            warnings.push("No idle objects; requests will create new ones".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization,
            idle_objects: idle,
            in_use_objects: in_use,
            disposed,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
