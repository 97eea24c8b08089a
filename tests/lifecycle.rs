//! End-to-end behaviour of the pool core: issue, reuse, return validation
//! and teardown, observed through recording strategies and observers.

use lifecycle_pool::{
    FnCreation, FnDestruction, LifecycleObserver, NoopDestruction, NoopObserver, ObjectPool,
    PoolConfiguration, PoolError, Shared,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

type Log = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

struct Recorder(Log);

impl LifecycleObserver<u32> for Recorder {
    fn created(&self, id: &u32) {
        self.0.lock().push(format!("created {id}"));
    }

    fn requested(&self, id: &u32) {
        self.0.lock().push(format!("requested {id}"));
    }

    fn returned(&self, id: &u32) {
        self.0.lock().push(format!("returned {id}"));
    }

    fn destroyed(&self, id: &u32) {
        self.0.lock().push(format!("destroyed {id}"));
    }
}

struct Harness {
    log: Log,
    creations: Arc<AtomicUsize>,
    pool: ObjectPool<u32>,
}

fn harness(config: PoolConfiguration) -> Harness {
    let log: Log = Arc::default();
    let creations = Arc::new(AtomicUsize::new(0));

    let next = AtomicU32::new(1);
    let counter = Arc::clone(&creations);
    let creation = FnCreation::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        next.fetch_add(1, Ordering::SeqCst)
    });

    let destroyed = Arc::clone(&log);
    let destruction = FnDestruction::new(move |id: u32| {
        destroyed.lock().push(format!("destruction {id}"));
    });

    let pool = ObjectPool::new(creation, Recorder(Arc::clone(&log)), destruction, config).unwrap();
    Harness {
        log,
        creations,
        pool,
    }
}

fn capacity(n: usize) -> PoolConfiguration {
    PoolConfiguration::new().with_initial_capacity(n)
}

// ---------------------------------------------------------------------------
// Issue and reuse
// ---------------------------------------------------------------------------

#[test]
fn test_outstanding_requests_are_distinct() {
    let mut h = harness(capacity(2));

    let ids: Vec<u32> = (0..5).map(|_| h.pool.request().unwrap()).collect();
    let mut unique = ids.clone();
    unique.sort_unstable();
    unique.dedup();

    assert_eq!(unique.len(), 5);
    assert_eq!(h.pool.in_use_count(), 5);
    assert_eq!(h.pool.idle_count(), 0);
}

#[test]
fn test_idle_instances_are_reused_before_creating() {
    let mut h = harness(capacity(3));
    assert_eq!(h.creations.load(Ordering::SeqCst), 3);

    for _ in 0..3 {
        h.pool.request().unwrap();
    }
    assert_eq!(h.creations.load(Ordering::SeqCst), 3);

    h.pool.request().unwrap();
    assert_eq!(h.creations.load(Ordering::SeqCst), 4);
}

#[test]
fn test_most_recently_returned_is_reused_first() {
    let mut h = harness(capacity(0));
    let a = h.pool.request().unwrap();
    let b = h.pool.request().unwrap();

    h.pool.return_instance(a).unwrap();
    h.pool.return_instance(b).unwrap();

    assert_eq!(h.pool.request().unwrap(), b);
    assert_eq!(h.pool.request().unwrap(), a);
}

#[test]
fn test_membership_flips_on_request_and_return() {
    let mut h = harness(capacity(1));

    let id = h.pool.request().unwrap();
    assert_eq!(h.pool.is_in_use(&id), Ok(true));
    assert_eq!(h.pool.is_in_pool(&id), Ok(false));

    h.pool.return_instance(id).unwrap();
    assert_eq!(h.pool.is_in_use(&id), Ok(false));
    assert_eq!(h.pool.is_in_pool(&id), Ok(true));
}

// ---------------------------------------------------------------------------
// Return validation
// ---------------------------------------------------------------------------

#[test]
fn test_return_rejects_unknown_and_absent_instances() {
    let mut pool: ObjectPool<Option<u32>> = ObjectPool::new(
        FnCreation::new({
            let next = AtomicU32::new(1);
            move || Some(next.fetch_add(1, Ordering::SeqCst))
        }),
        NoopObserver,
        NoopDestruction,
        capacity(1),
    )
    .unwrap();

    let issued = pool.request().unwrap();
    pool.return_instance(issued).unwrap();

    assert_eq!(pool.return_instance(issued), Err(PoolError::NotOwned));
    assert_eq!(pool.return_instance(Some(77)), Err(PoolError::NotOwned));
    assert!(matches!(
        pool.return_instance(None),
        Err(PoolError::InvalidArgument(_))
    ));
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn test_return_of_foreign_instance_fails() {
    let mut h = harness(capacity(2));
    let before = h.log.lock().len();

    assert_eq!(h.pool.return_instance(999), Err(PoolError::NotOwned));
    assert_eq!(h.log.lock().len(), before);
}

#[test]
fn test_instances_from_another_pool_are_not_owned() {
    let mut first: ObjectPool<Shared<String>> = ObjectPool::new(
        lifecycle_pool::DefaultCreation,
        NoopObserver,
        NoopDestruction,
        capacity(1),
    )
    .unwrap();
    let mut second: ObjectPool<Shared<String>> = ObjectPool::new(
        lifecycle_pool::DefaultCreation,
        NoopObserver,
        NoopDestruction,
        capacity(1),
    )
    .unwrap();

    let borrowed = first.request().unwrap();
    assert_eq!(second.return_instance(borrowed.clone()), Err(PoolError::NotOwned));
    assert_eq!(first.return_instance(borrowed), Ok(()));
}

// ---------------------------------------------------------------------------
// Creation scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_empty_pool_creates_on_every_request() {
    let mut h = harness(capacity(0));

    h.pool.request().unwrap();
    h.pool.request().unwrap();

    assert_eq!(h.creations.load(Ordering::SeqCst), 2);
    assert_eq!(h.pool.in_use_count(), 2);
    assert_eq!(h.pool.idle_count(), 0);
}

#[test]
fn test_round_trip_restores_idle_set() {
    let mut h = harness(capacity(3));

    let id = h.pool.request().unwrap();
    h.pool.return_instance(id).unwrap();

    assert_eq!(h.pool.idle_count(), 3);
    assert_eq!(h.pool.in_use_count(), 0);
    assert_eq!(
        *h.log.lock(),
        vec![
            "created 1",
            "created 2",
            "created 3",
            "requested 3",
            "returned 3",
        ]
    );
}

// ---------------------------------------------------------------------------
// Dispose
// ---------------------------------------------------------------------------

#[test]
fn test_dispose_destroys_only_idle_by_default() {
    let config = capacity(2)
        .with_destroy_idle_on_dispose(true)
        .with_destroy_in_use_on_dispose(false);
    let mut h = harness(config);

    let held = h.pool.request().unwrap();
    h.log.lock().clear();
    h.pool.dispose().unwrap();

    let idle = if held == 1 { 2 } else { 1 };
    assert_eq!(
        *h.log.lock(),
        vec![format!("destroyed {idle}"), format!("destruction {idle}")]
    );
}

#[test]
fn test_dispose_can_destroy_in_use_instances() {
    let config = capacity(1)
        .with_destroy_idle_on_dispose(false)
        .with_destroy_in_use_on_dispose(true);
    let mut h = harness(config);

    let a = h.pool.request().unwrap();
    let b = h.pool.request().unwrap();
    h.pool.return_instance(a).unwrap();
    h.log.lock().clear();

    h.pool.dispose().unwrap();

    assert_eq!(
        *h.log.lock(),
        vec![format!("destroyed {b}"), format!("destruction {b}")]
    );
    assert_eq!(h.pool.idle_count(), 0);
    assert_eq!(h.pool.in_use_count(), 0);
}

#[test]
fn test_dispose_without_destruction_only_forgets() {
    let config = capacity(2)
        .with_destroy_idle_on_dispose(false)
        .with_destroy_in_use_on_dispose(false);
    let mut h = harness(config);
    h.pool.request().unwrap();
    h.log.lock().clear();

    h.pool.dispose().unwrap();

    assert!(h.log.lock().is_empty());
    assert_eq!(h.pool.idle_count(), 0);
    assert_eq!(h.pool.in_use_count(), 0);
}

#[test]
fn test_pool_rejects_work_after_dispose() {
    let mut h = harness(capacity(1));
    let id = h.pool.request().unwrap();
    h.pool.dispose().unwrap();

    assert_eq!(h.pool.request(), Err(PoolError::Disposed));
    assert_eq!(h.pool.return_instance(id), Err(PoolError::Disposed));
    assert_eq!(h.pool.is_in_pool(&id), Ok(false));
    assert!(!h.pool.get_health_status().is_healthy());
}

#[test]
fn test_creation_failure_surfaces_to_the_caller() {
    let mut pool: ObjectPool<u32> = ObjectPool::new(
        lifecycle_pool::TryFnCreation::new(|| {
            Err(PoolError::CreationFailed("out of handles".to_string()))
        }),
        NoopObserver,
        NoopDestruction,
        PoolConfiguration::default(),
    )
    .unwrap();

    assert_eq!(
        pool.request(),
        Err(PoolError::CreationFailed("out of handles".to_string()))
    );
    assert_eq!(pool.in_use_count(), 0);
    assert_eq!(pool.get_metrics().total_created, 0);
}
