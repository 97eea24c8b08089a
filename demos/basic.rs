//! Basic usage examples for ObjectPool

use lifecycle_pool::{
    DefaultCreation, FnCreation, NoopDestruction, NoopObserver, ObjectPool, PoolConfiguration,
    PoolError, Shared, SharedPool,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== lifecycle_pool - Basic Examples ===\n");

    // Example 1: Request and return
    request_and_return()?;

    // Example 2: Validation of returns
    return_validation()?;

    // Example 3: Dispose behaviour
    dispose_flags()?;

    // Example 4: Sharing across threads
    shared_pool()?;

    Ok(())
}

fn ids() -> FnCreation<impl Fn() -> u32 + Send> {
    let next = AtomicU32::new(1);
    FnCreation::new(move || next.fetch_add(1, Ordering::Relaxed))
}

fn request_and_return() -> Result<(), PoolError> {
    println!("1. Request and Return:");
    let mut pool = ObjectPool::new(
        ids(),
        NoopObserver,
        NoopDestruction,
        PoolConfiguration::new().with_initial_capacity(2),
    )?;

    let a = pool.request()?;
    let b = pool.request()?;
    let c = pool.request()?;
    println!("   Handed out: {a}, {b}, {c} (the third was created on demand)");

    pool.return_instance(c)?;
    println!("   Next request reuses {}", pool.request()?);
    println!(
        "   In use: {}, idle: {}\n",
        pool.in_use_count(),
        pool.idle_count()
    );
    Ok(())
}

fn return_validation() -> Result<(), PoolError> {
    println!("2. Return Validation:");
    let mut pool = ObjectPool::new(ids(), NoopObserver, NoopDestruction, PoolConfiguration::new())?;

    let id = pool.request()?;
    pool.return_instance(id)?;

    match pool.return_instance(id) {
        Err(err) => println!("   Second return rejected: {err}"),
        Ok(()) => println!("   Second return accepted?"),
    }
    match pool.return_instance(999) {
        Err(err) => println!("   Foreign return rejected: {err}\n"),
        Ok(()) => println!("   Foreign return accepted?\n"),
    }
    Ok(())
}

fn dispose_flags() -> Result<(), PoolError> {
    println!("3. Dispose:");
    let config = PoolConfiguration::new()
        .with_initial_capacity(2)
        .with_destroy_idle_on_dispose(true)
        .with_destroy_in_use_on_dispose(false);

    let mut pool = ObjectPool::new(ids(), NoopObserver, NoopDestruction, config)?;
    let kept = pool.request()?;
    pool.dispose()?;

    println!("   Object {kept} outlives the pool");
    println!("   Request after dispose: {:?}\n", pool.request());
    Ok(())
}

fn shared_pool() -> Result<(), PoolError> {
    println!("4. Shared Pool:");
    let pool: SharedPool<Shared<Vec<u8>>> = ObjectPool::new(
        DefaultCreation,
        NoopObserver,
        NoopDestruction,
        PoolConfiguration::new().with_initial_capacity(4),
    )?
    .into();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let pool = pool.clone();
            thread::spawn(move || -> Result<(), PoolError> {
                let buffer = pool.request()?;
                println!("   Worker {worker} got a buffer");
                pool.return_instance(buffer)
            })
        })
        .collect();

    for worker in workers {
        if let Ok(Err(err)) = worker.join() {
            println!("   Worker failed: {err}");
        }
    }

    let metrics = pool.export_metrics();
    println!("\n   Metrics:");
    for (key, value) in metrics {
        println!("     {}: {}", key, value);
    }
    pool.dispose()
}
