//! # Raw Slot Storage
//!
//! One contiguous, zero-filled allocation of `n_slots` cells of
//! `MaybeUninit<T>`. This type owns the memory but knows nothing about which
//! cells hold live values; the pool pairs it with a
//! [`FreeIdxStack`](super::free_idx_stack::FreeIdxStack) for that.

use std::{
    alloc::{Layout, alloc_zeroed, dealloc, handle_alloc_error},
    mem::MaybeUninit,
    ptr::NonNull,
};

use bytemuck::Pod;

/// Contiguous storage for `n_slots` values of `T`.
///
/// # Safety
/// Dropping a `RawSlots` frees the memory without dropping any value stored in
/// it. The owner must drop live values first.
pub struct RawSlots<T> {
    /// Non-null pointer to the first cell.
    base_ptr: NonNull<MaybeUninit<T>>,
    /// Total number of cells.
    n_slots: u32,
}

impl<T> RawSlots<T> {
    /// Allocates zero-filled storage for `n_slots` cells.
    ///
    /// # Panics
    /// If `n_slots == 0` or the layout overflows `isize`.
    pub fn new(n_slots: u32) -> Self {
        assert!(n_slots > 0, "`n_slots` must be > `0`");
        let layout = Self::layout(n_slots);
        let base_ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            let ptr = unsafe { alloc_zeroed(layout) as *mut MaybeUninit<T> };
            match NonNull::new(ptr) {
                Some(ptr) => ptr,
                None => handle_alloc_error(layout),
            }
        };
        Self { base_ptr, n_slots }
    }

    const fn layout(n_slots: u32) -> Layout {
        match Layout::array::<MaybeUninit<T>>(n_slots as usize) {
            Ok(l) => l,
            Err(_) => panic!("Invalid layout for RawSlots"),
        }
    }

    /// Pointer to cell `idx`.
    ///
    /// # Safety
    /// `idx < n_slots`.
    const unsafe fn cell(&self, idx: u32) -> NonNull<MaybeUninit<T>> {
        unsafe { self.base_ptr.add(idx as usize) }
    }

    /// Moves `value` into cell `idx`, overwriting whatever bytes were there.
    ///
    /// # Safety
    /// - `idx < n_slots`.
    /// - The cell must not hold a live value (it would be leaked).
    pub unsafe fn write(&mut self, idx: u32, value: T) {
        unsafe { (*self.cell(idx).as_ptr()).write(value) };
    }

    /// # Safety
    /// `idx < n_slots` and the cell holds a live value.
    pub unsafe fn get(&self, idx: u32) -> &T {
        unsafe { self.cell(idx).as_ref().assume_init_ref() }
    }

    /// # Safety
    /// `idx < n_slots` and the cell holds a live value.
    pub unsafe fn get_mut(&mut self, idx: u32) -> &mut T {
        unsafe { self.cell(idx).as_mut().assume_init_mut() }
    }

    /// Moves the value out of cell `idx`. The cell's bytes are left as they were.
    ///
    /// # Safety
    /// `idx < n_slots`, the cell holds a live value, and it is treated as dead
    /// afterwards.
    pub unsafe fn take(&mut self, idx: u32) -> T {
        unsafe { self.cell(idx).as_ref().assume_init_read() }
    }

    /// Runs the destructor of the value in cell `idx` in place.
    ///
    /// # Safety
    /// Same as [`take`](Self::take).
    pub unsafe fn drop_in_place(&mut self, idx: u32) {
        unsafe { self.cell(idx).as_mut().assume_init_drop() }
    }
}

impl<T: Pod> RawSlots<T> {
    /// Bytes of cell `idx`, live or not.
    ///
    /// Every `Pod` cell holds a valid `T`: storage starts zero-filled, `T` has
    /// no padding, and releasing a value leaves its bytes in place.
    ///
    /// # Safety
    /// `idx < n_slots`.
    pub unsafe fn bytes(&self, idx: u32) -> &[u8] {
        bytemuck::bytes_of(unsafe { self.cell(idx).as_ref().assume_init_ref() })
    }
}

impl<T> Drop for RawSlots<T> {
    fn drop(&mut self) {
        let layout = Self::layout(self.n_slots);
        if layout.size() != 0 {
            unsafe { dealloc(self.base_ptr.as_ptr() as _, layout) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_storage_is_zeroed() {
        let slots = RawSlots::<u32>::new(3);
        for idx in 0..3 {
            assert_eq!(unsafe { slots.bytes(idx) }, &[0, 0, 0, 0]);
        }
    }

    #[test]
    fn cells_are_isolated() {
        let mut slots = RawSlots::<u32>::new(3);
        unsafe {
            slots.write(0, 10);
            slots.write(1, 20);
            slots.write(2, 30);
            *slots.get_mut(1) += 5;
            assert_eq!(*slots.get(0), 10);
            assert_eq!(*slots.get(1), 25);
            assert_eq!(*slots.get(2), 30);
        }
    }

    #[test]
    fn take_leaves_bytes_behind() {
        let mut slots = RawSlots::<u32>::new(1);
        unsafe {
            slots.write(0, 0x0102_0304);
            assert_eq!(slots.take(0), 0x0102_0304);
            assert_eq!(slots.bytes(0), &0x0102_0304u32.to_ne_bytes());
        }
    }

    #[test]
    fn drop_in_place_runs_destructor() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        let mut slots = RawSlots::<Rc<()>>::new(2);
        unsafe {
            slots.write(1, Rc::clone(&tracker));
            assert_eq!(Rc::strong_count(&tracker), 2);
            slots.drop_in_place(1);
        }
        assert_eq!(Rc::strong_count(&tracker), 1);
    }

    #[test]
    fn zero_sized_elements_need_no_allocation() {
        let mut slots = RawSlots::<()>::new(5);
        unsafe {
            slots.write(4, ());
            assert_eq!(slots.bytes(4).len(), 0);
        }
    }
}
