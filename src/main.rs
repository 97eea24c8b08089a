// lifecycle_pool demo binary
// The library lives in lib.rs; run the examples with: cargo run --example basic

use lifecycle_pool::{
    DefaultCreation, MetricsObserver, NoopDestruction, ObjectPool, PoolConfiguration, Shared,
};

fn main() -> Result<(), lifecycle_pool::PoolError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    println!("=== lifecycle_pool ===");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let metrics = MetricsObserver::new();
    let mut pool: ObjectPool<Shared<Vec<u8>>> = ObjectPool::new(
        DefaultCreation,
        metrics.clone(),
        NoopDestruction,
        PoolConfiguration::new().with_initial_capacity(3),
    )?;

    let buffer = pool.request()?;
    println!("  Got buffer of {} bytes", buffer.len());
    pool.return_instance(buffer)?;

    println!("  Idle after return: {}", pool.idle_count());
    pool.dispose()?;
    println!("  Live objects after dispose: {}", metrics.live_objects());
    Ok(())
}
