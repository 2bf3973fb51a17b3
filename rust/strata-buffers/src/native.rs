//! Native (off-heap) allocation records.
//!
//! A [`NativeAllocation`] owns one block of native memory together with the
//! action that releases it. Buffers hold it through an `Rc`, so the memory is
//! released exactly once, when the last buffer referencing it is dropped.

use std::{ptr::NonNull, rc::Rc, sync::Arc};

use strata_accountant::MemoryAccountant;
use strata_common::{Result, error::Error};
use strata_native_alloc::RawBlock;

pub struct NativeAllocation {
    address: NonNull<u8>,
    capacity: usize,
    release: Release,
}

enum Release {
    /// Memory allocated by this crate and charged to an accountant.
    Accounted {
        block: RawBlock,
        accountant: Arc<MemoryAccountant>,
    },
    /// Memory supplied by an external owner (e.g. a mapping), with its own
    /// release action.
    External(Option<Box<dyn FnOnce(NonNull<u8>, usize)>>),
}

impl NativeAllocation {
    /// Allocates `capacity` zeroed bytes charged to the process-wide accountant.
    pub fn allocate(capacity: usize, page_aligned: bool) -> Result<Rc<NativeAllocation>> {
        Self::allocate_in(capacity, page_aligned, MemoryAccountant::global())
    }

    /// Allocates `capacity` zeroed bytes charged to `accountant`.
    ///
    /// The reservation is made before the memory is requested from the
    /// system and rolled back if that request fails. With `page_aligned`, up
    /// to one page of padding is reserved and the returned address lies on a
    /// page boundary.
    pub fn allocate_in(
        capacity: usize,
        page_aligned: bool,
        accountant: &Arc<MemoryAccountant>,
    ) -> Result<Rc<NativeAllocation>> {
        strata_common::verify_arg!(capacity, capacity <= isize::MAX as usize);
        let size = RawBlock::allocation_size(capacity, page_aligned);
        accountant
            .reserve(size as u64, capacity as u64)
            .map_err(|e| Error::out_of_memory(e.capacity, e.available(), e.limit))?;

        let block = match RawBlock::allocate(capacity, page_aligned) {
            Ok(block) => block,
            Err(e) => {
                accountant.unreserve(size as u64, capacity as u64);
                return Err(Error::io("native allocation", e));
            }
        };
        let address = NonNull::new(block.ptr())
            .ok_or_else(|| Error::io("native allocation", std::io::Error::other("null block")))?;
        log::trace!(
            "allocated {capacity} native bytes at {address:?} (size {size}, page_aligned {page_aligned})"
        );
        Ok(Rc::new(NativeAllocation {
            address,
            capacity,
            release: Release::Accounted {
                block,
                accountant: accountant.clone(),
            },
        }))
    }

    /// Wraps native memory owned elsewhere. `release` runs once, when the last
    /// buffer referencing the allocation is dropped.
    ///
    /// # Safety
    ///
    /// `address` must be valid for reads and writes of `capacity` bytes until
    /// `release` is called, and must not be accessed through any other path
    /// while buffers over it are alive.
    pub unsafe fn from_raw_parts(
        address: NonNull<u8>,
        capacity: usize,
        release: impl FnOnce(NonNull<u8>, usize) + 'static,
    ) -> Rc<NativeAllocation> {
        Rc::new(NativeAllocation {
            address,
            capacity,
            release: Release::External(Some(Box::new(release))),
        })
    }

    /// Start of the usable memory.
    #[inline]
    pub fn address(&self) -> *mut u8 {
        self.address.as_ptr()
    }

    /// Usable size in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes requested from the system, including alignment padding.
    pub fn size(&self) -> usize {
        match &self.release {
            Release::Accounted { block, .. } => block.size(),
            Release::External(_) => self.capacity,
        }
    }

    /// Guaranteed alignment of [`address`](Self::address), if known.
    pub fn alignment(&self) -> Option<usize> {
        match &self.release {
            Release::Accounted { block, .. } => Some(block.alignment()),
            Release::External(_) => None,
        }
    }
}

impl Drop for NativeAllocation {
    fn drop(&mut self) {
        match &mut self.release {
            Release::Accounted { block, accountant } => {
                log::trace!("releasing {} native bytes at {:?}", self.capacity, self.address);
                let size = block.size() as u64;
                match block.release() {
                    Ok(true) => accountant.unreserve(size, self.capacity as u64),
                    Ok(false) => (),
                    Err(e) => {
                        log::warn!("failed to free native memory at {:?}: {e}", self.address);
                        accountant.unreserve(size, self.capacity as u64);
                    }
                }
            }
            Release::External(release) => {
                if let Some(release) = release.take() {
                    release(self.address, self.capacity);
                }
            }
        }
    }
}

impl std::fmt::Debug for NativeAllocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAllocation")
            .field("address", &self.address)
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}
