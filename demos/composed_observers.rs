//! Layering resource-specific behaviour onto a pool with observers

use lifecycle_pool::{
    BroadcastObserver, DefaultCreation, FnDestruction, LifecycleEvent, LifecycleObserver,
    MetricsObserver, ObjectPool, ObserverChain, PoolConfiguration, PoolError, Poolable,
    PoolableObserver, PrometheusObserver, Shared,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Enemy {
    visible: AtomicBool,
}

impl Poolable for Enemy {
    fn on_requested(&self) {
        println!("   enemy: spawning");
    }

    fn on_returned(&self) {
        println!("   enemy: despawning");
    }
}

/// Toggles visibility, the way a scene graph would
struct Visibility;

impl LifecycleObserver<Shared<Enemy>> for Visibility {
    fn created(&self, enemy: &Shared<Enemy>) {
        enemy.visible.store(false, Ordering::Relaxed);
    }

    fn requested(&self, enemy: &Shared<Enemy>) {
        enemy.visible.store(true, Ordering::Relaxed);
    }

    fn returned(&self, enemy: &Shared<Enemy>) {
        enemy.visible.store(false, Ordering::Relaxed);
    }
}

fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== lifecycle_pool - Composed Observers ===\n");

    let metrics = MetricsObserver::new();
    let broadcast = BroadcastObserver::new();
    broadcast.subscribe("audio", |event, _enemy: &Shared<Enemy>| {
        if event == LifecycleEvent::Requested {
            println!("   audio: play spawn sound");
        }
    });
    broadcast.subscribe("hud", |event, _enemy: &Shared<Enemy>| {
        println!("   hud: enemy {event}");
    });

    let registry = Registry::new();
    let prometheus = PrometheusObserver::register(&registry, "enemies")
        .map_err(|err| PoolError::InvalidArgument(err.to_string()))?;

    // Visibility first, then metrics, then listeners; the enemy's own
    // callbacks wrap the whole chain.
    let chain = ObserverChain::new()
        .with(Visibility)
        .with(metrics.clone())
        .with(prometheus)
        .with(broadcast.clone());

    let mut pool = ObjectPool::new(
        DefaultCreation,
        PoolableObserver::new(chain),
        FnDestruction::new(|enemy: Shared<Enemy>| {
            println!("   destroying enemy (visible: {})", enemy.visible.load(Ordering::Relaxed));
        }),
        PoolConfiguration::new()
            .with_initial_capacity(2)
            .with_destroy_in_use_on_dispose(true),
    )?;

    println!("1. Request:");
    let enemy = pool.request()?;
    println!("   visible: {}\n", enemy.visible.load(Ordering::Relaxed));

    println!("2. Return:");
    pool.return_instance(enemy.clone())?;
    println!("   visible: {}\n", enemy.visible.load(Ordering::Relaxed));

    println!("3. Unsubscribe hud and dispose:");
    broadcast.unsubscribe("hud");
    let _held = pool.request()?;
    pool.dispose()?;

    println!("\n   live objects: {}", metrics.live_objects());

    let mut output = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut output)
        .map_err(|err| PoolError::InvalidArgument(err.to_string()))?;
    println!("\n{}", String::from_utf8_lossy(&output));

    Ok(())
}
