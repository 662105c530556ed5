use std::{
    cell::Cell,
    fmt,
    marker::PhantomData,
    sync::atomic::{AtomicU64, Ordering},
};

use bytemuck::Pod;
use log::{debug, error, trace, warn};

use crate::{
    config::{ExhaustionPolicy, PoolConfig},
    error::{PoolError, PoolResult},
    pool_manager::{free_idx_stack::FreeIdxStack, raw_slots::RawSlots},
};

/// Source of lifecycle epochs. Every `initialize` on every pool takes a fresh
/// one, so a handle can only ever match the lifecycle that issued it. At 64
/// bits the counter does not wrap in any realistic process lifetime.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

/// Capacities above this produce no [`ObjectPool::dump`] output.
pub const DUMP_THRESHOLD: u32 = 7;

/// Lifecycle state of an [`ObjectPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// No storage is allocated.
    Uninitialized,
    /// Storage is allocated and slots can be handed out.
    Active,
}

/// Handle to one occupied slot of an [`ObjectPool`].
///
/// A `Slot` is an opaque, move-only token: it is neither `Clone` nor `Copy`, and
/// [`ObjectPool::deallocate`] / [`ObjectPool::take`] consume it, so a slot can't
/// be released twice through the same handle. Access goes through the pool
/// ([`ObjectPool::get`], [`ObjectPool::get_mut`]), which checks the handle every
/// time.
#[must_use = "dropping a Slot leaks the pool slot until the pool is destroyed"]
pub struct Slot<T> {
    /// Slot index in the pool.
    idx: u32,
    /// Epoch of the pool lifecycle that issued this handle.
    epoch: u64,
    _marker: PhantomData<fn() -> T>,
}

/// Plain-integer form of a [`Slot`], for parking a handle outside the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSlot {
    pub index: u32,
    pub epoch: u64,
}

impl<T> Slot<T> {
    /// Returns the slot index of this handle in the pool.
    pub const fn index(&self) -> u32 {
        self.idx
    }

    pub const fn into_raw(self) -> RawSlot {
        RawSlot {
            index: self.idx,
            epoch: self.epoch,
        }
    }

    /// Rebuilds a handle from its raw form.
    ///
    /// The pool validates rebuilt handles like any other: a foreign or stale
    /// epoch is rejected and an out-of-range index is reported. Rebuilding a
    /// handle to a slot that was already released makes a second release
    /// possible; the pool ignores it.
    pub const fn from_raw(raw: RawSlot) -> Self {
        Slot {
            idx: raw.index,
            epoch: raw.epoch,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("idx", &self.idx)
            .field("epoch", &self.epoch)
            .finish()
    }
}

/// Everything an active pool owns.
struct Storage<T> {
    slots: RawSlots<T>,
    free_idx: FreeIdxStack,
    epoch: u64,
}

/// Fixed-capacity object pool for type `T`.
///
/// # Overview
/// `ObjectPool` hands out slots of one contiguous buffer holding up to
/// `capacity` values of `T`. Free slots sit on a LIFO index stack: a fresh pool
/// hands out `0, 1, 2, ...`, and after that the most recently released slot is
/// reused first. Allocation and release are O(1); [`initialize`] and
/// [`destroy`] are O(capacity).
///
/// A pool starts [`PoolState::Uninitialized`] with no storage. [`initialize`]
/// allocates the slot buffer and its bookkeeping, [`destroy`] drops any live
/// values and releases everything. A pool can go through this cycle any
/// number of times; handles from an earlier cycle are rejected.
///
/// # Slot reuse
/// Releasing a slot runs the value's destructor but does not clear the slot
/// memory. The next value placed there overwrites it completely, so stale
/// bytes are only visible through [`dump`].
///
/// # Threading
/// The pool is **not Send or Sync**; it is meant for single-threaded use.
///
/// [`initialize`]: Self::initialize
/// [`destroy`]: Self::destroy
/// [`dump`]: Self::dump
pub struct ObjectPool<T> {
    config: PoolConfig,

    /// `None` while uninitialized.
    storage: Option<Storage<T>>,

    // Internal marker for compiler bookkeeping; This is to indicate !Send & !Sync
    _marker: PhantomData<Cell<()>>,
}

impl<T> ObjectPool<T> {
    /// Creates an uninitialized pool. No memory is allocated until
    /// [`initialize`](Self::initialize).
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            storage: None,
            _marker: PhantomData,
        })
    }

    /// Creates an uninitialized pool with `capacity` slots and default settings.
    pub fn with_capacity(capacity: u32) -> PoolResult<Self> {
        Self::new(PoolConfig::with_capacity(capacity))
    }

    /// Allocates the slot buffer, occupancy table and free stack.
    ///
    /// Does nothing if the pool is already active.
    pub fn initialize(&mut self) {
        if self.storage.is_some() {
            debug!("pool already active, initialize ignored");
            return;
        }
        let capacity = self.config.capacity;
        let epoch = NEXT_EPOCH.fetch_add(1, Ordering::Relaxed);
        self.storage = Some(Storage {
            slots: RawSlots::new(capacity),
            free_idx: FreeIdxStack::new(capacity),
            epoch,
        });
        debug!("pool initialized: capacity={capacity} epoch={epoch}");
    }

    /// Drops every live value and releases all storage.
    ///
    /// Does nothing if the pool is not active. Outstanding handles become stale.
    pub fn destroy(&mut self) {
        let Some(Storage {
            mut slots,
            free_idx,
            epoch,
        }) = self.storage.take()
        else {
            return;
        };
        let live = free_idx.occupied_len();
        for idx in free_idx.occupied() {
            unsafe { slots.drop_in_place(idx) };
        }
        debug!("pool destroyed: epoch={epoch} dropped {live} live objects");
    }

    /// Places `value` in a free slot.
    ///
    /// # Errors
    /// - [`PoolError::PoolNotReady`] if the pool is not active.
    /// - [`PoolError::PoolExhausted`] if every slot is taken and the policy is
    ///   [`ExhaustionPolicy::Error`].
    ///
    /// # Panics
    /// If every slot is taken and the policy is [`ExhaustionPolicy::Abort`].
    pub fn allocate(&mut self, value: T) -> PoolResult<Slot<T>> {
        self.allocate_with(|| value)
    }

    /// Places `T::default()` in a free slot. See [`allocate`](Self::allocate).
    pub fn allocate_default(&mut self) -> PoolResult<Slot<T>>
    where
        T: Default,
    {
        self.allocate_with(T::default)
    }

    /// Builds a value with `init` directly into a free slot.
    ///
    /// `init` only runs once a slot is known to be available. See
    /// [`allocate`](Self::allocate) for errors.
    pub fn allocate_with<F>(&mut self, init: F) -> PoolResult<Slot<T>>
    where
        F: FnOnce() -> T,
    {
        let capacity = self.config.capacity;
        let policy = self.config.on_exhaustion;
        let storage = self.storage.as_mut().ok_or(PoolError::PoolNotReady)?;
        if storage.free_idx.free_len() == 0 {
            return match policy {
                ExhaustionPolicy::Error => Err(PoolError::PoolExhausted { capacity }),
                ExhaustionPolicy::Abort => {
                    error!("pool exhausted: all {capacity} slots are in use, aborting");
                    panic!("object pool exhausted: all {capacity} slots are in use");
                }
            };
        }
        Ok(Self::place(storage, init))
    }

    /// Runs `init` and moves its value into the slot on top of the free stack.
    /// The caller has checked that the stack is not empty.
    fn place<F>(storage: &mut Storage<T>, init: F) -> Slot<T>
    where
        F: FnOnce() -> T,
    {
        // `init` runs before the pop: an occupied slot always holds a value.
        let value = init();
        let idx = storage.free_idx.pop_free();
        debug_assert_ne!(idx, FreeIdxStack::NULL_IDX);
        unsafe { storage.slots.write(idx, value) };
        trace!("allocated slot {idx}");
        Slot {
            idx,
            epoch: storage.epoch,
            _marker: PhantomData,
        }
    }

    /// Releases the slot behind `slot`, dropping its value in place.
    ///
    /// Releasing a slot that is already free (possible only through
    /// [`Slot::from_raw`]) is a no-op.
    ///
    /// # Errors
    /// - [`PoolError::PoolNotReady`] if the pool is not active.
    /// - [`PoolError::StaleHandle`] if the handle comes from another pool or an
    ///   earlier lifecycle.
    /// - [`PoolError::OutOfRangeHandle`] if the index is past the end of the buffer.
    pub fn deallocate(&mut self, slot: Slot<T>) -> PoolResult<()> {
        let idx = slot.idx;
        let storage = self.checked_storage_mut(idx, slot.epoch)?;
        if storage.free_idx.retire(idx) {
            unsafe { storage.slots.drop_in_place(idx) };
            trace!("released slot {idx}");
        } else {
            debug!("slot {idx} is already free, release ignored");
        }
        Ok(())
    }

    /// Releases the slot behind `slot` and moves its value out.
    ///
    /// Returns `Ok(None)` if the slot was already free. Errors are the same as
    /// for [`deallocate`](Self::deallocate).
    pub fn take(&mut self, slot: Slot<T>) -> PoolResult<Option<T>> {
        let idx = slot.idx;
        let storage = self.checked_storage_mut(idx, slot.epoch)?;
        if !storage.free_idx.retire(idx) {
            debug!("slot {idx} is already free, take ignored");
            return Ok(None);
        }
        trace!("took slot {idx}");
        Ok(Some(unsafe { storage.slots.take(idx) }))
    }

    fn checked_storage_mut(&mut self, idx: u32, epoch: u64) -> PoolResult<&mut Storage<T>> {
        let capacity = self.config.capacity;
        let storage = self.storage.as_mut().ok_or(PoolError::PoolNotReady)?;
        if storage.epoch != epoch {
            warn!(
                "rejected handle for slot {idx}: epoch {epoch}, pool epoch {}",
                storage.epoch
            );
            return Err(PoolError::StaleHandle);
        }
        if idx >= capacity {
            warn!("rejected handle for slot {idx}: capacity is {capacity}");
            return Err(PoolError::OutOfRangeHandle {
                index: idx,
                capacity,
            });
        }
        Ok(storage)
    }

    /// Storage behind `slot`, if it is a live handle of the current lifecycle.
    fn live_storage(&self, slot: &Slot<T>) -> Option<&Storage<T>> {
        self.storage
            .as_ref()
            .filter(|s| s.epoch == slot.epoch && s.free_idx.is_occupied(slot.idx))
    }

    pub fn get(&self, slot: &Slot<T>) -> Option<&T> {
        let storage = self.live_storage(slot)?;
        Some(unsafe { storage.slots.get(slot.idx) })
    }

    pub fn get_mut(&mut self, slot: &Slot<T>) -> Option<&mut T> {
        self.live_storage(slot)?;
        let storage = self.storage.as_mut()?;
        Some(unsafe { storage.slots.get_mut(slot.idx) })
    }

    /// Whether `slot` is a live handle into this pool.
    pub fn contains(&self, slot: &Slot<T>) -> bool {
        self.live_storage(slot).is_some()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    pub fn state(&self) -> PoolState {
        match self.storage {
            Some(_) => PoolState::Active,
            None => PoolState::Uninitialized,
        }
    }

    pub fn is_active(&self) -> bool {
        self.storage.is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> u32 {
        self.storage.as_ref().map_or(0, |s| s.free_idx.occupied_len())
    }

    /// Number of free slots. Zero while uninitialized.
    pub fn available(&self) -> u32 {
        self.storage.as_ref().map_or(0, |s| s.free_idx.free_len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.storage
            .as_ref()
            .is_some_and(|s| s.free_idx.free_len() == 0)
    }

    /// The slot index the next allocation will use.
    pub fn next_free(&self) -> Option<u32> {
        self.storage.as_ref()?.free_idx.peek_free()
    }

    pub fn is_occupied(&self, index: u32) -> bool {
        self.storage
            .as_ref()
            .is_some_and(|s| s.free_idx.is_occupied(index))
    }

    /// Live objects with their slot index, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.storage.iter().flat_map(|s| {
            s.free_idx
                .occupied()
                .map(move |idx| (idx, unsafe { s.slots.get(idx) }))
        })
    }

    /// Asserts the bookkeeping is self-consistent.
    #[cfg(test)]
    fn check_invariants(&self) {
        let Some(storage) = &self.storage else {
            assert_eq!(self.len(), 0);
            assert_eq!(self.available(), 0);
            return;
        };
        let free = storage.free_idx.free_indices();
        assert_eq!(free.len() as u32 + self.len(), self.capacity());
        assert_eq!(storage.free_idx.occupied().count() as u32, self.len());
        let mut seen = vec![false; self.capacity() as usize];
        for &idx in free {
            assert!(idx < self.capacity(), "free index {idx} out of range");
            assert!(!storage.free_idx.is_occupied(idx), "occupied slot {idx} on free stack");
            assert!(!seen[idx as usize], "slot {idx} on free stack twice");
            seen[idx as usize] = true;
        }
    }
}

/// Byte dumps need every byte of `T` to be initialized, so they are only
/// offered for [`Pod`] types: no padding, and any bit pattern (including the
/// zero-filled storage of never-used slots) is a valid value.
///
/// ```compile_fail
/// use axiom_pool::ObjectPool;
///
/// // `u8` followed by `u32` leaves three bytes of padding.
/// #[derive(Clone, Copy)]
/// struct Padded {
///     tag: u8,
///     value: u32,
/// }
///
/// let mut pool = ObjectPool::<Padded>::with_capacity(2).unwrap();
/// pool.initialize();
/// let _ = pool.dump();
/// ```
impl<T: Pod> ObjectPool<T> {
    /// Hex listing of every slot's raw bytes, one line per slot.
    ///
    /// Only produced for active pools with at most [`DUMP_THRESHOLD`] slots;
    /// returns `None` otherwise. Free slots show whatever their last occupant
    /// left behind (zeros if never used).
    ///
    /// ```text
    ///  0 live: 2A 00 00 00
    ///  1 free: 07 00 00 00
    /// ```
    pub fn dump(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        if self.config.capacity > DUMP_THRESHOLD {
            return None;
        }
        let lines = (0..self.config.capacity)
            .map(|idx| {
                let marker = if storage.free_idx.is_occupied(idx) {
                    "live"
                } else {
                    "free"
                };
                let hex = unsafe { storage.slots.bytes(idx) }
                    .iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{idx:>2} {marker}: {hex}").trim_end().to_owned()
            })
            .collect::<Vec<_>>();
        Some(lines.join("\n"))
    }

    /// Writes [`dump`](Self::dump) to the log at debug level.
    pub fn log_dump(&self) {
        if let Some(dump) = self.dump() {
            debug!("pool contents:\n{dump}");
        }
    }
}

impl<T> Default for ObjectPool<T> {
    /// An uninitialized pool with [`PoolConfig::DEFAULT_CAPACITY`] slots.
    fn default() -> Self {
        Self {
            config: PoolConfig::default(),
            storage: None,
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.capacity())
            .field("state", &self.state())
            .field("len", &self.len())
            .finish()
    }
}
