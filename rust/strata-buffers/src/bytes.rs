//! Byte buffers: native allocation, typed accessors and typed views.
//!
//! A `Buffer<u8>` indexes bytes. Its typed accessors read and write wider
//! values at byte positions in the buffer's current order, which unlike the
//! order of other buffers can be changed with [`Buffer::set_order`]. Views
//! reinterpret the remaining bytes as a `Buffer<V>` whose order is fixed when
//! the view is created.

use std::{rc::Rc, sync::Arc};

use strata_accountant::MemoryAccountant;
use strata_common::{Result, error::Error, verify_arg};
use strata_endian::ByteOrder;

use crate::{
    buffer::Buffer, cursor::Cursor, element::Element, native::NativeAllocation,
    storage::Storage,
};

impl Buffer<u8> {
    /// Allocates a zeroed native byte buffer charged to the process-wide
    /// memory accountant.
    pub fn allocate_native(capacity: usize) -> Result<Buffer<u8>> {
        Ok(Self::from_native(NativeAllocation::allocate(capacity, false)?))
    }

    /// Allocates a zeroed native byte buffer whose first byte lies on a page
    /// boundary.
    pub fn allocate_native_aligned(capacity: usize) -> Result<Buffer<u8>> {
        Ok(Self::from_native(NativeAllocation::allocate(capacity, true)?))
    }

    /// Allocates a zeroed native byte buffer charged to `accountant`.
    pub fn allocate_native_in(
        capacity: usize,
        accountant: &Arc<MemoryAccountant>,
    ) -> Result<Buffer<u8>> {
        Ok(Self::from_native(NativeAllocation::allocate_in(
            capacity, false, accountant,
        )?))
    }

    /// A byte buffer over the whole of `allocation`, in native order.
    pub fn from_native(allocation: Rc<NativeAllocation>) -> Buffer<u8> {
        let capacity = allocation.capacity();
        Buffer::from_parts(
            Storage::Native(allocation),
            0,
            Cursor::new(capacity),
            ByteOrder::native(),
            false,
        )
    }

    /// Changes the order used by the typed accessors and by views created
    /// afterwards. Existing views keep their order.
    pub fn set_order(&mut self, order: ByteOrder) -> &mut Self {
        self.order = order;
        self
    }

    #[inline]
    fn byte_ptr(&self, offset: usize) -> *mut u8 {
        self.storage.ptr().wrapping_add(self.base + offset)
    }

    /// Reads a `V` at the position and advances the position by `V::WIDTH`.
    pub fn get_value<V: Element>(&mut self) -> Result<V> {
        let offset = self.cursor.next_get_index(V::WIDTH)?;
        Ok(unsafe { V::load(self.byte_ptr(offset), self.order) })
    }

    /// Writes `value` at the position and advances the position by
    /// `V::WIDTH`.
    pub fn put_value<V: Element>(&mut self, value: V) -> Result<&mut Self> {
        if self.read_only {
            return Err(Error::read_only());
        }
        let offset = self.cursor.next_put_index(V::WIDTH)?;
        unsafe { value.store(self.byte_ptr(offset), self.order) };
        Ok(self)
    }

    /// Reads a `V` at byte `index`; all `V::WIDTH` bytes must lie below the
    /// limit.
    pub fn get_value_at<V: Element>(&self, index: usize) -> Result<V> {
        self.cursor.check_index(index, V::WIDTH)?;
        Ok(unsafe { V::load(self.byte_ptr(index), self.order) })
    }

    /// Writes `value` at byte `index`.
    pub fn put_value_at<V: Element>(&mut self, index: usize, value: V) -> Result<&mut Self> {
        if self.read_only {
            return Err(Error::read_only());
        }
        self.cursor.check_index(index, V::WIDTH)?;
        unsafe { value.store(self.byte_ptr(index), self.order) };
        Ok(self)
    }

    /// A `Buffer<V>` over the remaining bytes, in the current order.
    ///
    /// The view's capacity and limit are `remaining() / V::WIDTH`; its element
    /// 0 is the byte at the current position. A view of a read-only buffer is
    /// read-only.
    pub fn view<V: Element>(&self) -> Buffer<V> {
        let capacity = self.remaining() / V::WIDTH;
        Buffer::from_parts(
            self.storage.clone(),
            self.base + self.position(),
            Cursor::new(capacity),
            self.order,
            self.read_only,
        )
    }

    /// Distance from the address of byte `index` to the next lower multiple
    /// of `unit`.
    ///
    /// `unit` must be a power of two. Units above 8 are only supported on
    /// native buffers.
    pub fn alignment_offset(&self, index: usize, unit: usize) -> Result<usize> {
        verify_arg!(unit, unit.is_power_of_two());
        if unit > 8 && !self.is_native() {
            return Err(Error::unsupported(format!(
                "alignment_offset with unit {unit} on a heap buffer"
            )));
        }
        let address = self.byte_ptr(index) as usize;
        Ok(address & (unit - 1))
    }

    /// A slice of the remaining bytes, shrunk at both ends so that its start
    /// and end addresses are multiples of `unit`. Empty if no such region
    /// exists.
    pub fn aligned_slice(&self, unit: usize) -> Result<Buffer<u8>> {
        let position = self.position();
        let limit = self.limit();
        let start_misalignment = self.alignment_offset(position, unit)?;
        let end_misalignment = self.alignment_offset(limit, unit)?;

        let mut start = if start_misalignment == 0 {
            position
        } else {
            position + (unit - start_misalignment)
        };
        let mut end = limit - end_misalignment;
        if start > limit || end < position {
            start = position;
            end = position;
        }
        self.slice_at(start, end - start)
    }
}

macro_rules! typed_accessors {
    ($($ty:ident),*) => {
        paste::paste! {
            impl Buffer<u8> {
                $(
                    #[doc = "Reads a `" $ty "` at the position in the current order."]
                    #[inline]
                    pub fn [<get_ $ty>](&mut self) -> Result<$ty> {
                        self.get_value::<$ty>()
                    }

                    #[doc = "Writes a `" $ty "` at the position in the current order."]
                    #[inline]
                    pub fn [<put_ $ty>](&mut self, value: $ty) -> Result<&mut Self> {
                        self.put_value(value)
                    }

                    #[doc = "Reads a `" $ty "` at byte `index` in the current order."]
                    #[inline]
                    pub fn [<get_ $ty _at>](&self, index: usize) -> Result<$ty> {
                        self.get_value_at::<$ty>(index)
                    }

                    #[doc = "Writes a `" $ty "` at byte `index` in the current order."]
                    #[inline]
                    pub fn [<put_ $ty _at>](&mut self, index: usize, value: $ty) -> Result<&mut Self> {
                        self.put_value_at(index, value)
                    }

                    #[doc = "A `" $ty "` view over the remaining bytes."]
                    #[inline]
                    pub fn [<as_ $ty _buffer>](&self) -> Buffer<$ty> {
                        self.view::<$ty>()
                    }
                )*
            }
        }
    };
}

typed_accessors!(i8, i16, u16, i32, u32, i64, u64, f32, f64);
