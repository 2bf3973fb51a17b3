//! Bulk element transfer between buffer storage and slices.
//!
//! Short transfers are performed element by element. Transfers of at least
//! [`CopyPolicy::threshold_bytes`] bytes are performed as raw memory copies,
//! split into chunks of at most [`CopyPolicy::chunk_bytes`] bytes, followed
//! by an in-place byte swap of each chunk when the stored byte order is not
//! native. All routines behave like an element-by-element copy, including
//! when the source and destination regions overlap.

use std::{
    ptr,
    sync::atomic::{AtomicUsize, Ordering},
};

use strata_common::Result;
use strata_endian::ByteOrder;

use crate::element::Element;

/// Default size below which bulk transfers copy element by element.
pub const DEFAULT_THRESHOLD_BYTES: usize = 48;

/// Default upper bound on the bytes moved by a single raw copy.
pub const DEFAULT_CHUNK_BYTES: usize = 1 << 20;

/// Size split between element-wise and raw bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPolicy {
    /// Transfers shorter than this many bytes are copied element by element.
    pub threshold_bytes: usize,
    /// Maximum bytes moved by one raw copy; larger transfers are chunked.
    pub chunk_bytes: usize,
}

impl CopyPolicy {
    pub fn new(threshold_bytes: usize, chunk_bytes: usize) -> Result<CopyPolicy> {
        strata_common::verify_arg!(chunk_bytes, chunk_bytes > 0);
        Ok(CopyPolicy {
            threshold_bytes,
            chunk_bytes,
        })
    }

    #[inline]
    fn is_bulk(&self, bytes: usize) -> bool {
        bytes >= self.threshold_bytes
    }

    /// Elements of width `width` per chunk, at least one.
    #[inline]
    fn chunk_elements(&self, width: usize) -> usize {
        (self.chunk_bytes / width).max(1)
    }
}

impl Default for CopyPolicy {
    fn default() -> Self {
        CopyPolicy {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

static THRESHOLD_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_THRESHOLD_BYTES);
static CHUNK_BYTES: AtomicUsize = AtomicUsize::new(DEFAULT_CHUNK_BYTES);

/// The process-wide policy used by buffer bulk operations.
pub fn copy_policy() -> CopyPolicy {
    CopyPolicy {
        threshold_bytes: THRESHOLD_BYTES.load(Ordering::Relaxed),
        chunk_bytes: CHUNK_BYTES.load(Ordering::Relaxed),
    }
}

/// Replaces the process-wide policy.
pub fn set_copy_policy(policy: CopyPolicy) {
    THRESHOLD_BYTES.store(policy.threshold_bytes, Ordering::Relaxed);
    CHUNK_BYTES.store(policy.chunk_bytes.max(1), Ordering::Relaxed);
}

/// Reads `dst.len()` elements stored in `order` at `src` into `dst`.
///
/// # Safety
///
/// `src` must be valid for reads of `dst.len() * T::WIDTH` bytes and must not
/// overlap `dst`.
pub(crate) unsafe fn read_into<T: Element>(
    src: *const u8,
    order: ByteOrder,
    dst: &mut [T],
    policy: CopyPolicy,
) {
    if !policy.is_bulk(dst.len() * T::WIDTH) {
        for (i, value) in dst.iter_mut().enumerate() {
            *value = unsafe { T::load(src.add(i * T::WIDTH), order) };
        }
        return;
    }

    let step = policy.chunk_elements(T::WIDTH);
    let mut offset = 0;
    for chunk in dst.chunks_mut(step) {
        unsafe {
            ptr::copy_nonoverlapping(
                src.add(offset),
                chunk.as_mut_ptr().cast::<u8>(),
                chunk.len() * T::WIDTH,
            );
        }
        if !order.is_native() {
            for value in chunk.iter_mut() {
                *value = value.swap_bytes();
            }
        }
        offset += chunk.len() * T::WIDTH;
    }
}

/// Writes `src` at `dst` in `order`.
///
/// # Safety
///
/// `dst` must be valid for writes of `src.len() * T::WIDTH` bytes and must
/// not overlap `src`.
pub(crate) unsafe fn write_from<T: Element>(
    src: &[T],
    dst: *mut u8,
    order: ByteOrder,
    policy: CopyPolicy,
) {
    if !policy.is_bulk(std::mem::size_of_val(src)) {
        for (i, value) in src.iter().enumerate() {
            unsafe { value.store(dst.add(i * T::WIDTH), order) };
        }
        return;
    }

    let step = policy.chunk_elements(T::WIDTH);
    let mut offset = 0;
    for chunk in src.chunks(step) {
        let bytes = chunk.len() * T::WIDTH;
        unsafe {
            ptr::copy_nonoverlapping(chunk.as_ptr().cast::<u8>(), dst.add(offset), bytes);
            if !order.is_native() {
                swap_in_place::<T>(dst.add(offset), chunk.len());
            }
        }
        offset += bytes;
    }
}

/// Moves `len` bytes from `src` to `dst` in chunks of at most `chunk_bytes`,
/// with `memmove` semantics.
///
/// # Safety
///
/// Both regions must be valid for `len` bytes.
pub(crate) unsafe fn move_bytes(src: *const u8, dst: *mut u8, len: usize, chunk_bytes: usize) {
    if len == 0 || ptr::eq(src, dst) {
        return;
    }
    let chunk_bytes = chunk_bytes.max(1);
    if (dst as usize) < (src as usize) {
        let mut offset = 0;
        while offset < len {
            let n = chunk_bytes.min(len - offset);
            unsafe { ptr::copy(src.add(offset), dst.add(offset), n) };
            offset += n;
        }
    } else {
        let mut end = len;
        while end > 0 {
            let n = chunk_bytes.min(end);
            let start = end - n;
            unsafe { ptr::copy(src.add(start), dst.add(start), n) };
            end = start;
        }
    }
}

/// Copies `count` elements stored in `src_order` at `src` to `dst`, storing
/// them in `dst_order`. The regions may overlap.
///
/// # Safety
///
/// `src` must be valid for reads and `dst` for writes of `count * T::WIDTH`
/// bytes.
pub(crate) unsafe fn transfer<T: Element>(
    src: *const u8,
    src_order: ByteOrder,
    dst: *mut u8,
    dst_order: ByteOrder,
    count: usize,
    policy: CopyPolicy,
) {
    let bytes = count * T::WIDTH;
    if bytes == 0 {
        return;
    }
    let swap = T::WIDTH > 1 && src_order != dst_order;

    if !policy.is_bulk(bytes) {
        let copy_one = |i: usize| unsafe {
            let value = T::load(src.add(i * T::WIDTH), src_order);
            value.store(dst.add(i * T::WIDTH), dst_order);
        };
        if (dst as usize) <= (src as usize) {
            (0..count).for_each(copy_one);
        } else {
            (0..count).rev().for_each(copy_one);
        }
        return;
    }

    unsafe {
        move_bytes(src, dst, bytes, policy.chunk_bytes);
        if swap {
            let step = policy.chunk_elements(T::WIDTH);
            let mut index = 0;
            while index < count {
                let n = step.min(count - index);
                swap_in_place::<T>(dst.add(index * T::WIDTH), n);
                index += n;
            }
        }
    }
}

/// Reverses the byte order of `count` consecutive elements at `ptr`.
///
/// # Safety
///
/// `ptr` must be valid for reads and writes of `count * T::WIDTH` bytes.
unsafe fn swap_in_place<T: Element>(ptr: *mut u8, count: usize) {
    for i in 0..count {
        unsafe {
            let p = ptr.add(i * T::WIDTH).cast::<T>();
            p.write_unaligned(p.read_unaligned().swap_bytes());
        }
    }
}
