//! C ABI entry points with the shape of the compiler-runtime array helpers.
//!
//! A C++ compiler building `T objects[N]` calls a vector constructor iterator
//! with the array start, the element size, the count and the constructor and
//! destructor of `T`; tearing the array down goes through a vector destructor
//! iterator that gets the array *end*. Freestanding targets often ship without
//! these helpers. With the `abi-symbols` feature the functions below are
//! exported as `__ehvec_ctor` and `__ehvec_dtor` to fill that gap.
//!
//! Element constructors and destructors signal failure by unwinding, so both
//! the entry points and the callbacks use the `"C-unwind"` ABI.

use crate::raw::{construct_array, destroy_array};
use std::convert::Infallible;
use std::ffi::c_void;

/// Constructs one element in place.
pub type Constructor = unsafe extern "C-unwind" fn(*mut c_void);

/// Destroys one element in place. Must not unwind: if it does, the process aborts.
pub type Destructor = unsafe extern "C-unwind" fn(*mut c_void);

/// Vector constructor iterator.
///
/// Calls `constructor` on `count` elements of `element_size` bytes starting
/// at `arr_begin`. If a constructor unwinds, the elements already constructed
/// are destroyed in reverse order and the unwind continues to the caller.
///
/// # Safety
///
/// `arr_begin` must be valid for writes of `element_size * count` bytes, and
/// `destructor` must undo `constructor`.
#[cfg_attr(feature = "abi-symbols", export_name = "__ehvec_ctor")]
pub unsafe extern "C-unwind" fn ehvec_ctor(
    arr_begin: *mut c_void,
    element_size: usize,
    count: usize,
    constructor: Constructor,
    destructor: Destructor,
) {
    let built = construct_array::<Infallible, _, _>(
        arr_begin as *mut u8,
        element_size,
        count,
        |slot| {
            constructor(slot as *mut c_void);
            Ok(())
        },
        |slot| {
            destructor(slot as *mut c_void);
            Ok(())
        },
    );
    if let Err(never) = built {
        match never {}
    }
}

/// Vector destructor iterator.
///
/// Calls `destructor` on the `count` elements of `element_size` bytes that end
/// at `arr_end`, last element first.
///
/// # Safety
///
/// The `count` elements before `arr_end` must be constructed, and are
/// uninitialized afterwards.
#[cfg_attr(feature = "abi-symbols", export_name = "__ehvec_dtor")]
pub unsafe extern "C-unwind" fn ehvec_dtor(
    arr_end: *mut c_void,
    element_size: usize,
    count: usize,
    destructor: Destructor,
) {
    destroy_array::<Infallible, _>(arr_end as *mut u8, element_size, count, |slot| {
        destructor(slot as *mut c_void);
        Ok(())
    })
}
