//! Raw, zero-initialized native memory blocks, optionally page aligned.
//!
//! The platform layer lives in `raw`: `calloc`/`free` on unix and the global
//! allocator elsewhere.

pub mod raw_block;

#[cfg_attr(unix, path = "raw_unix.rs")]
#[cfg_attr(not(unix), path = "raw_fallback.rs")]
pub mod raw;

pub use raw_block::RawBlock;
