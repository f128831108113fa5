/*!

Array constructor and destructor iterators over raw storage.

Both functions walk `count` slots of `element_size` bytes each and hand every
slot address to a callback. The constructor walks forward; if an element
fails to construct, the already built prefix is destroyed back to front and
the failure is handed to the caller untouched. The destructor walks
backwards, the mirror image of construction.

A failing destructor has nowhere to go. Whether it returns an error or
panics, the process is terminated (see `fatal`).

*/

use crate::fatal::{terminate, AbortOnUnwind, Fatal, Teardown};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Constructs `count` elements of `element_size` bytes, left to right, starting at `buffer`.
///
/// `construct_one` is called with the address of each slot in turn. If it
/// fails for slot `k`, slots `k - 1` down to `0` are handed to `destroy_one`
/// (and nothing else is), then the failure is returned as it was raised.
/// A panic in `construct_one` triggers the same rollback while it unwinds.
/// Slots past `k` are never touched.
///
/// If `destroy_one` fails during that rollback, the process is aborted.
///
/// `E` is otherwise opaque; the `Debug` bound only serves the abort report.
///
/// # Safety
///
/// `buffer` must be valid for writes of `element_size * count` bytes and suitably aligned
/// for the element type, and `destroy_one` must be able to destroy whatever `construct_one`
/// built in a slot. The slots must not be accessed from elsewhere during the call.
pub unsafe fn construct_array<E, C, D>(
    buffer: *mut u8,
    element_size: usize,
    count: usize,
    mut construct_one: C,
    mut destroy_one: D,
) -> Result<(), E>
    where
        E: Debug,
        C: FnMut(*mut u8) -> Result<(), E>,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    let mut progress = Progress {
        buffer,
        element_size,
        constructed: 0,
        destroy_one: &mut destroy_one,
        _failure: PhantomData,
    };

    while progress.constructed < count {
        if let Err(failure) = construct_one(progress.next_slot()) {
            progress.roll_back(&failure);
            return Err(failure);
        }
        progress.constructed += 1;
    }

    progress.disarm();
    Ok(())
}

/// Destroys the `count` elements of `element_size` bytes that end at `array_end`,
/// right to left.
///
/// `destroy_one` is called exactly once per slot, last slot first. If it fails,
/// by error or by panic, the process is aborted and no further slot is visited.
/// The `Debug` bound on `E` only serves that abort report.
///
/// # Safety
///
/// The `count` slots immediately before `array_end` must all hold constructed
/// elements that `destroy_one` can destroy, and must not be used again afterwards.
pub unsafe fn destroy_array<E, D>(array_end: *mut u8, element_size: usize, count: usize, mut destroy_one: D)
    where
        E: Debug,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    destroy_slots(array_end, element_size, count, &mut destroy_one, Teardown::Primary)
}

unsafe fn destroy_slots<E, D>(
    array_end: *mut u8,
    element_size: usize,
    count: usize,
    destroy_one: &mut D,
    teardown: Teardown<'_>,
)
    where
        E: Debug,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    let mut current = array_end;
    let mut index = count;
    while index > 0 {
        index -= 1;
        current = current.sub(element_size);

        let bomb = AbortOnUnwind::arm(index, teardown);
        let outcome = destroy_one(current);
        bomb.disarm();

        if let Err(failure) = outcome {
            terminate(Fatal::failed(index, teardown, &failure));
        }
    }
}

/// Construction progress counter. Knows the exact constructed prefix, so it can
/// undo it when construction is abandoned, by a failure or by a panic.
struct Progress<'d, E, D>
    where
        E: Debug,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    buffer: *mut u8,
    element_size: usize,
    constructed: usize,
    destroy_one: &'d mut D,
    _failure: PhantomData<fn() -> E>,
}

impl<E, D> Progress<'_, E, D>
    where
        E: Debug,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    /// Address of the first slot not yet constructed, which is also the end of
    /// the constructed prefix.
    #[inline(always)]
    unsafe fn next_slot(&self) -> *mut u8 {
        self.buffer.add(self.constructed * self.element_size)
    }

    unsafe fn destroy_prefix(&mut self, teardown: Teardown<'_>) {
        let end = self.next_slot();
        let constructed = std::mem::replace(&mut self.constructed, 0);
        destroy_slots(end, self.element_size, constructed, self.destroy_one, teardown);
        trace!("rolled back {} elements", constructed);
    }

    unsafe fn roll_back(mut self, pending: &E) {
        trace!("construction failed at element {}, rolling back", self.constructed);
        self.destroy_prefix(Teardown::Rollback { pending });
        self.disarm();
    }

    #[inline(always)]
    fn disarm(self) {
        std::mem::forget(self);
    }
}

impl<E, D> Drop for Progress<'_, E, D>
    where
        E: Debug,
        D: FnMut(*mut u8) -> Result<(), E>,
{
    // only runs while `construct_one` unwinds, every other exit disarms
    fn drop(&mut self) {
        debug!("construction panicked at element {}, rolling back", self.constructed);
        unsafe { self.destroy_prefix(Teardown::Unwinding) };
    }
}
