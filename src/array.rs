use crate::raw::{construct_array, destroy_array};
use std::convert::Infallible;
use std::fmt::{self, Debug};
use std::mem::{size_of, ManuallyDrop, MaybeUninit};
use std::ops::{Deref, DerefMut};

/// Builds `len` values of `T` at `first` in index order, taking each from `init(index)`.
///
/// On failure the values already built are dropped last to first and the
/// failure is returned.
///
/// # Safety
///
/// `first` must be valid for writes of `len` values of `T`. The slots are
/// treated as uninitialized: anything in them is overwritten without being dropped.
pub(crate) unsafe fn construct_in_place<T, E, F>(first: *mut T, len: usize, mut init: F) -> Result<(), E>
    where
        E: Debug,
        F: FnMut(usize) -> Result<T, E>,
{
    let mut index = 0;
    construct_array(
        first as *mut u8,
        size_of::<T>(),
        len,
        |slot| {
            let value = init(index)?;
            (slot as *mut T).write(value);
            index += 1;
            Ok(())
        },
        |slot| {
            std::ptr::drop_in_place(slot as *mut T);
            Ok(())
        },
    )
}

/// Drops `len` values of `T` starting at `first`, last to first.
///
/// # Safety
///
/// All `len` values must be initialized, and must be treated as uninitialized afterwards.
pub(crate) unsafe fn destroy_in_place<T>(first: *mut T, len: usize) {
    destroy_array::<Infallible, _>(first.add(len) as *mut u8, size_of::<T>(), len, |slot| {
        std::ptr::drop_in_place(slot as *mut T);
        Ok(())
    })
}

#[inline(always)]
fn uninit_items<T, const N: usize>() -> [MaybeUninit<T>; N] {
    // SAFETY: an array of `MaybeUninit` needs no initialization
    unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() }
}

/// Fixed size array whose elements are constructed in order and dropped in reverse order.
///
/// If an element fails to construct, the ones before it are dropped (last to
/// first) and the failure is returned; no element is leaked. If dropping an
/// element panics, the process is aborted.
pub struct Array<T, const N: usize> where T: Sized {
    items: [MaybeUninit<T>; N],
}

impl<T, const N: usize> Array<T, N> where T: Sized {
    /// Builds every element with `init(index)`, stopping at the first failure.
    pub fn try_from_fn<E, F>(init: F) -> Result<Array<T, N>, E>
        where
            E: Debug,
            F: FnMut(usize) -> Result<T, E>,
    {
        let mut items = uninit_items::<T, N>();
        unsafe { construct_in_place(items.as_mut_ptr() as *mut T, N, init)? };
        Ok(Array { items })
    }

    pub fn from_fn<F>(mut init: F) -> Array<T, N> where F: FnMut(usize) -> T {
        match Array::try_from_fn::<Infallible, _>(|index| Ok(init(index))) {
            Ok(array) => array,
            Err(never) => match never {},
        }
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.items.as_ptr() as *const T, N) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.items.as_mut_ptr() as *mut T, N) }
    }

    /// Moves the elements out into a plain array. Nothing is dropped here; the
    /// plain array drops its elements in its own (forward) order later.
    pub fn into_array(self) -> [T; N] {
        let this = ManuallyDrop::new(self);
        unsafe { std::ptr::read(this.items.as_ptr() as *const [T; N]) }
    }
}

impl<T, const N: usize> Drop for Array<T, N> where T: Sized {
    fn drop(&mut self) {
        trace!("drop array of {}", N);
        unsafe { destroy_in_place(self.items.as_mut_ptr() as *mut T, N) }
    }
}

impl<T, const N: usize> Deref for Array<T, N> where T: Sized {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for Array<T, N> where T: Sized {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> Default for Array<T, N> where T: Default {
    fn default() -> Self {
        Array::from_fn(|_| T::default())
    }
}

impl<T, const N: usize> Clone for Array<T, N> where T: Clone {
    fn clone(&self) -> Self {
        Array::from_fn(|index| self.as_slice()[index].clone())
    }
}

impl<T, const N: usize> Debug for Array<T, N> where T: Debug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
