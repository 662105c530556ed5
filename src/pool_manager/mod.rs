//! # Object Pool Modules
//!
//! Fixed-capacity object pooling for latency-sensitive code that keeps creating
//! and destroying values of one type.
//!
//! ## Modules
//!
//! - [`free_idx_stack`] — occupancy bitmap plus LIFO stack of free slot indices.
//! - [`raw_slots`] — contiguous, zero-filled storage for `MaybeUninit<T>` cells.
//! - [`object_pool`] — the pool itself: lifecycle, allocation, release, dump.
//!
//! ## Re-exports
//!
//! - [`ObjectPool`] — from [`object_pool`]; the fixed-capacity pool.
//! - [`Slot`] / [`RawSlot`] — from [`object_pool`]; handles to occupied slots.
//! - [`PoolState`] — from [`object_pool`]; `Uninitialized` or `Active`.
//!
//! ## Safety
//!
//! [`raw_slots`] does unchecked pointer arithmetic over uninitialized memory.
//! [`ObjectPool`] only touches a cell after the bookkeeping in
//! [`free_idx_stack`] says it is live, and validates every handle first.
pub mod free_idx_stack;
pub mod object_pool;
pub mod raw_slots;

pub use object_pool::{DUMP_THRESHOLD, ObjectPool, PoolState, RawSlot, Slot};
