use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};

/// Interior-mutability cell that hands out mutable access without locking.
///
/// The CFR engine writes child results into disjoint slots of a shared
/// array and mutates trainables that are only ever reached by a single
/// worker, so no synchronization is needed; this cell exists to satisfy
/// `Send`/`Sync` bounds that a plain `&mut` cannot.
///
/// **Note**: this bypasses the "shared XOR mutable" rule. Callers must
/// guarantee that no two workers touch the same data at the same time.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct SyncCell<T: ?Sized> {
    data: UnsafeCell<T>,
}

/// Smart-pointer wrapper returned when a [`SyncCell`] is opened.
#[derive(Debug)]
pub struct SyncCellGuard<'a, T: ?Sized + 'a> {
    cell: &'a SyncCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for SyncCell<T> {}
unsafe impl<T: ?Sized + Send> Sync for SyncCell<T> {}
unsafe impl<'a, T: ?Sized + Sync + 'a> Sync for SyncCellGuard<'a, T> {}

impl<T> SyncCell<T> {
    /// Wraps the given value.
    #[inline]
    pub fn new(val: T) -> Self {
        Self {
            data: UnsafeCell::new(val),
        }
    }
}

impl<T: ?Sized> SyncCell<T> {
    /// Opens the cell **without** any locking.
    #[inline]
    pub fn open(&self) -> SyncCellGuard<T> {
        SyncCellGuard { cell: self }
    }
}

impl<'a, T: ?Sized + 'a> Deref for SyncCellGuard<'a, T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.cell.data.get() }
    }
}

impl<'a, T: ?Sized + 'a> DerefMut for SyncCellGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.cell.data.get() }
    }
}
