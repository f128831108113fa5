use crate::array::{construct_in_place, destroy_in_place};
use std::convert::Infallible;
use std::fmt::{self, Debug};
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};

/// Elements constructed inside storage owned by the caller.
///
/// The storage is borrowed for as long as the elements live. It is never
/// allocated or freed here; dropping the `InitSlice` drops the elements last
/// to first and leaves the storage uninitialized again.
pub struct InitSlice<'a, T> where T: Sized {
    items: &'a mut [MaybeUninit<T>],
}

impl<'a, T> InitSlice<'a, T> where T: Sized {
    /// Fills every slot of `storage` with `init(index)`, in index order.
    ///
    /// If `init` fails, the elements already built are dropped, last to first,
    /// and the failure is returned. The storage is uninitialized again in that case.
    pub fn try_new<E, F>(storage: &'a mut [MaybeUninit<T>], init: F) -> Result<InitSlice<'a, T>, E>
        where
            E: Debug,
            F: FnMut(usize) -> Result<T, E>,
    {
        unsafe { construct_in_place(storage.as_mut_ptr() as *mut T, storage.len(), init)? };
        Ok(InitSlice { items: storage })
    }

    pub fn new<F>(storage: &'a mut [MaybeUninit<T>], mut init: F) -> InitSlice<'a, T> where F: FnMut(usize) -> T {
        match InitSlice::try_new::<Infallible, _>(storage, |index| Ok(init(index))) {
            Ok(slice) => slice,
            Err(never) => match never {},
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Gives up ownership of the elements without dropping them.
    pub fn leak(self) -> &'a mut [T] {
        let len = self.items.len();
        let first = self.items.as_mut_ptr() as *mut T;
        std::mem::forget(self);
        unsafe { std::slice::from_raw_parts_mut(first, len) }
    }
}

impl<T> Drop for InitSlice<'_, T> where T: Sized {
    fn drop(&mut self) {
        trace!("drop init slice of {}", self.items.len());
        unsafe { destroy_in_place(self.items.as_mut_ptr() as *mut T, self.items.len()) }
    }
}

impl<T> Deref for InitSlice<'_, T> where T: Sized {
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.items.as_ptr() as *const T, self.items.len()) }
    }
}

impl<T> DerefMut for InitSlice<'_, T> where T: Sized {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.items.as_mut_ptr() as *mut T, self.items.len()) }
    }
}

impl<T> Debug for InitSlice<'_, T> where T: Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
