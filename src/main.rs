//! # Example: Using the Object Pool
//!
//! This example demonstrates basic usage of the `axiom_pool` crate:
//! - Creating and initializing a pool from a RON config
//! - Allocating objects, including in-place construction
//! - Releasing slots and watching LIFO reuse
//! - Dumping the raw slot bytes of a small pool
//!
//! Run with `RUST_LOG=debug` to see the pool's own log output.

use axiom_pool::{ObjectPool, PoolConfig, PoolResult};
use bytemuck::{Pod, Zeroable};

/// Byte dumps need a padding-free layout, so the alignment gap is a field.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, Pod, Zeroable)]
struct Particle {
    x: i16,
    y: i16,
    ttl: u8,
    _pad: u8,
}

impl Particle {
    fn new(x: i16, y: i16, ttl: u8) -> Self {
        Self { x, y, ttl, _pad: 0 }
    }
}

fn main() -> PoolResult<()> {
    env_logger::init();

    // -------------------------------------------------------------------------
    // Small pool, small enough for the byte dump
    // -------------------------------------------------------------------------
    let config = PoolConfig::from_ron_str("(capacity: 4)")?;
    let mut pool = ObjectPool::<Particle>::new(config)?;
    pool.initialize();

    let a = pool.allocate(Particle::new(1, 2, 30))?;
    let b = pool.allocate_default()?;
    let c = pool.allocate_with(|| Particle::new(-1, -1, 5))?;
    println!("allocated slots {}, {}, {}", a.index(), b.index(), c.index());

    if let Some(p) = pool.get_mut(&b) {
        p.ttl = 99;
    }

    pool.deallocate(b)?;
    println!("next free slot: {:?}", pool.next_free());

    let d = pool.allocate(Particle::new(7, 7, 1))?;
    println!("reused slot {} -> {:?}", d.index(), pool.get(&d));

    if let Some(dump) = pool.dump() {
        println!("{dump}");
    }

    for (idx, p) in pool.iter() {
        println!("slot {idx}: ({}, {}) ttl={}", p.x, p.y, p.ttl);
    }

    pool.destroy();
    println!("pool state after destroy: {:?}", pool.state());

    // -------------------------------------------------------------------------
    // Exhaustion is reported, not fatal, under the default policy
    // -------------------------------------------------------------------------
    let mut pool = ObjectPool::<String>::with_capacity(1)?;
    pool.initialize();
    let _only = pool.allocate("only one".to_string())?;
    match pool.allocate("one too many".to_string()) {
        Ok(_) => println!("unexpected extra slot"),
        Err(e) => println!("second allocation failed: {e}"),
    }

    println!("example run complete");
    Ok(())
}
