//! Typed, byte-order-aware buffers over heap arrays and native memory.
//!
//! A [`Buffer<T>`] is a bounded, positional view of `T` elements. Buffers over
//! the same storage (slices, duplicates, read-only copies and typed views of a
//! byte buffer) share their contents and keep independent positional state.
//! Native storage is charged to a [`MemoryAccountant`] and released when the
//! last buffer referencing it is dropped.
//!
//! Buffers are single-threaded values (`!Send`, `!Sync`); only the memory
//! accountant is shared across threads.

pub mod buffer;
pub mod bytes;
pub mod copy;
pub mod cursor;
pub mod element;
pub mod native;
mod storage;

pub use buffer::Buffer;
pub use copy::{CopyPolicy, copy_policy, set_copy_policy};
pub use cursor::Cursor;
pub use element::Element;
pub use native::NativeAllocation;
pub use strata_accountant::MemoryAccountant;
pub use strata_common::{
    Result,
    error::{Error, ErrorKind},
};
pub use strata_endian::{ByteOrder, FixedWidth};
