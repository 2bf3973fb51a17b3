//! An owned block of zero-initialized native memory.
//!
//! `RawBlock` optionally over-allocates by up to one page so that the usable
//! region can start on a page boundary. The block is freed exactly once: either
//! by an explicit [`RawBlock::release`] or on drop. A null base pointer marks a
//! block that has already been released.

use crate::raw;

pub struct RawBlock {
    /// Base pointer returned by the allocator, null once released.
    base: *mut u8,
    /// Start of the usable region (`base` rounded up to `alignment`).
    ptr: *mut u8,
    /// Usable length in bytes, as requested by the caller.
    len: usize,
    /// Bytes requested from the allocator: `len` plus padding, at least one.
    size: usize,
    /// Alignment of `ptr`.
    alignment: usize,
}

impl RawBlock {
    /// Total number of bytes that [`allocate`](Self::allocate) will request
    /// from the system for a block of `len` usable bytes.
    pub fn allocation_size(len: usize, page_aligned: bool) -> usize {
        let padding = if page_aligned { raw::get_page_size() } else { 0 };
        len.saturating_add(padding).max(1)
    }

    /// Allocates a zeroed block with `len` usable bytes.
    ///
    /// When `page_aligned` is set, up to one page of padding is requested and
    /// the usable region starts at the first page boundary within the block.
    pub fn allocate(len: usize, page_aligned: bool) -> std::io::Result<RawBlock> {
        let size = Self::allocation_size(len, page_aligned);
        let base = raw::allocate_zeroed(size)?;
        let alignment = if page_aligned {
            raw::get_page_size()
        } else {
            raw::MIN_ALIGNMENT
        };
        let misalignment = (base as usize) & (alignment - 1);
        let ptr = if page_aligned && misalignment != 0 {
            unsafe { base.add(alignment - misalignment) }
        } else {
            base
        };
        log::trace!("allocated native block {base:?} ({size} bytes, usable {len} at {ptr:?})");
        Ok(RawBlock {
            base,
            ptr,
            len,
            size,
            alignment,
        })
    }

    /// Start of the usable region.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the pointer is not used after the block is
    /// released and that accesses stay within `0..len`.
    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Usable length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes requested from the system, including padding.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Guaranteed alignment of [`ptr`](Self::ptr).
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Returns `true` once the block has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.base.is_null()
    }

    /// Frees the block.
    ///
    /// Returns `Ok(true)` if this call released the memory and `Ok(false)` if
    /// the block had already been released.
    pub fn release(&mut self) -> std::io::Result<bool> {
        let base = std::mem::replace(&mut self.base, std::ptr::null_mut());
        if base.is_null() {
            return Ok(false);
        }
        self.ptr = std::ptr::null_mut();
        log::trace!("releasing native block {base:?} ({} bytes)", self.size);
        unsafe { raw::free(base, self.size)? };
        Ok(true)
    }
}

impl Drop for RawBlock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release native block: {e}");
        }
    }
}

impl std::fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBlock")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("size", &self.size)
            .field("alignment", &self.alignment)
            .finish()
    }
}
