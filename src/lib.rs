//! # Fixed-Capacity Object Pool
//! This crate provides a pre-allocated slab of storage for objects of a single
//! type. Slots are handed out and reclaimed through an O(1) index stack instead
//! of the global allocator, avoiding per-object allocation cost and heap
//! fragmentation.
//!
//! ## Modules
//!
//! - `pool_manager` — the pool, its slot storage and its free-slot bookkeeping.
//! - `config` — per-pool settings, loadable from RON.
//! - `error` — [`PoolError`] and the [`PoolResult`] alias.
//!
//! ## Example
//! ```
//! use axiom_pool::{ObjectPool, PoolError};
//!
//! let mut pool = ObjectPool::<u64>::with_capacity(2).unwrap();
//! pool.initialize();
//!
//! let a = pool.allocate(1).unwrap();
//! let b = pool.allocate(2).unwrap();
//! assert_eq!((a.index(), b.index()), (0, 1));
//! assert_eq!(pool.allocate(3).unwrap_err(), PoolError::PoolExhausted { capacity: 2 });
//!
//! pool.deallocate(a).unwrap();
//! assert_eq!(pool.next_free(), Some(0));
//! ```
//!
//! ## Safety
//!
//! Slot storage is managed with raw pointers internally. The public API is safe:
//! handles are opaque indices validated on every use, and the pool is
//! single-threaded (`!Send`, `!Sync`).
pub mod config;
pub mod error;
pub mod pool_manager;

pub use config::{ExhaustionPolicy, PoolConfig};
pub use error::{PoolError, PoolResult};
pub use pool_manager::{ObjectPool, PoolState, RawSlot, Slot};
