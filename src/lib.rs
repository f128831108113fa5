//! Exception-safe construction and destruction of arrays of non-trivial elements.
//!
//! [`construct_array`] builds elements front to back and, when one of them
//! fails, destroys exactly the ones already built (back to front) before
//! passing the failure on. [`destroy_array`] tears elements down back to
//! front. A destructor that fails aborts the process.

mod logging;
mod fatal;
mod raw;
mod array;
mod slice;
pub mod abi;

pub use raw::{construct_array, destroy_array};
pub use array::Array;
pub use slice::InitSlice;

#[cfg(test)]
pub mod faulty;
