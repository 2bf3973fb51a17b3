//! The typed buffer.

use std::{
    cell::Cell,
    cmp::Ordering,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use strata_common::{
    Result,
    error::Error,
    result::verify_range,
    verify_arg,
};
use strata_endian::ByteOrder;

use crate::{
    copy::{self, copy_policy},
    cursor::Cursor,
    element::Element,
    storage::Storage,
};

/// A linear, bounded sequence of `T` elements over heap or native storage.
///
/// A buffer owns its positional state ([`Cursor`]) and shares its storage
/// with every buffer derived from it through [`slice`](Self::slice),
/// [`duplicate`](Self::duplicate), [`as_read_only`](Self::as_read_only) or a
/// typed view. Writes through one alias are visible through all others.
///
/// Elements are stored in the buffer's byte order. Heap buffers created with
/// [`allocate`](Self::allocate) or [`wrap`](Self::wrap) use the native order;
/// views over byte buffers use the order of the byte buffer at the time the
/// view was created.
pub struct Buffer<T: Element> {
    pub(crate) cursor: Cursor,
    pub(crate) storage: Storage,
    /// Byte offset of element 0 within the storage block.
    pub(crate) base: usize,
    pub(crate) order: ByteOrder,
    pub(crate) read_only: bool,
    _marker: PhantomData<T>,
}

impl<T: Element> Buffer<T> {
    pub(crate) fn from_parts(
        storage: Storage,
        base: usize,
        cursor: Cursor,
        order: ByteOrder,
        read_only: bool,
    ) -> Buffer<T> {
        debug_assert!(base + cursor.capacity() * T::WIDTH <= storage.byte_len());
        Buffer {
            cursor,
            storage,
            base,
            order,
            read_only,
            _marker: PhantomData,
        }
    }

    /// Allocates a zero-filled heap buffer of `capacity` elements.
    pub fn allocate(capacity: usize) -> Result<Buffer<T>> {
        verify_arg!(
            capacity,
            capacity
                .checked_mul(T::WIDTH)
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        );
        let storage = Storage::heap(std::iter::repeat_n(T::default(), capacity));
        Ok(Self::from_parts(
            storage,
            0,
            Cursor::new(capacity),
            ByteOrder::native(),
            false,
        ))
    }

    /// Wraps `values` as a heap buffer whose capacity and limit are
    /// `values.len()`.
    pub fn wrap(values: Vec<T>) -> Buffer<T> {
        let capacity = values.len();
        Self::from_parts(
            Storage::heap(values),
            0,
            Cursor::new(capacity),
            ByteOrder::native(),
            false,
        )
    }

    /// Wraps `values` with `position = offset` and `limit = offset + length`.
    /// The capacity is `values.len()`.
    pub fn wrap_range(values: Vec<T>, offset: usize, length: usize) -> Result<Buffer<T>> {
        verify_range(offset, length, values.len())?;
        let cursor = Cursor::with_state(None, offset, offset + length, values.len())?;
        Ok(Self::from_parts(
            Storage::heap(values),
            0,
            cursor,
            ByteOrder::native(),
            false,
        ))
    }

    #[inline]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.cursor.limit()
    }

    #[inline]
    pub fn mark_value(&self) -> Option<usize> {
        self.cursor.mark_value()
    }

    pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
        self.cursor.set_position(position)?;
        Ok(self)
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self> {
        self.cursor.set_limit(limit)?;
        Ok(self)
    }

    pub fn mark(&mut self) -> &mut Self {
        self.cursor.mark();
        self
    }

    pub fn reset(&mut self) -> Result<&mut Self> {
        self.cursor.reset()?;
        Ok(self)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.cursor.clear();
        self
    }

    pub fn flip(&mut self) -> &mut Self {
        self.cursor.flip();
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.cursor.rewind();
        self
    }

    pub fn discard_mark(&mut self) -> &mut Self {
        self.cursor.discard_mark();
        self
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.cursor.has_remaining()
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns `true` if the elements live in native memory.
    #[inline]
    pub fn is_native(&self) -> bool {
        self.storage.is_native()
    }

    /// Byte order in which elements are stored.
    #[inline]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Returns `true` if [`array`](Self::array) would succeed.
    pub fn has_array(&self) -> bool {
        !self.read_only && self.storage.array::<T>().is_some()
    }

    /// The backing heap array. Buffer index `i` corresponds to array index
    /// `i + array_offset()`.
    ///
    /// Fails with `ReadOnly` on read-only buffers and with `Unsupported` on
    /// buffers without an accessible element array (native buffers and views).
    pub fn array(&self) -> Result<&[Cell<T>]> {
        if self.read_only {
            return Err(Error::read_only());
        }
        self.storage
            .array::<T>()
            .ok_or_else(|| Error::unsupported("array"))
    }

    /// Index of this buffer's element 0 within [`array`](Self::array).
    pub fn array_offset(&self) -> Result<usize> {
        self.array()?;
        Ok(self.base / T::WIDTH)
    }

    #[inline]
    fn at(&self, index: usize) -> *mut u8 {
        self.storage.ptr().wrapping_add(self.base + index * T::WIDTH)
    }

    /// Reads the element at a validated index.
    #[inline]
    fn load(&self, index: usize) -> T {
        debug_assert!(index < self.capacity());
        unsafe { T::load(self.at(index), self.order) }
    }

    /// Writes the element at a validated index.
    #[inline]
    fn store(&self, index: usize, value: T) {
        debug_assert!(index < self.capacity());
        unsafe { value.store(self.at(index), self.order) }
    }

    #[inline]
    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::read_only());
        }
        Ok(())
    }

    /// Reads the element at the position and advances the position.
    pub fn get(&mut self) -> Result<T> {
        let index = self.cursor.next_get_index(1)?;
        Ok(self.load(index))
    }

    /// Writes `value` at the position and advances the position.
    pub fn put(&mut self, value: T) -> Result<&mut Self> {
        self.check_writable()?;
        let index = self.cursor.next_put_index(1)?;
        self.store(index, value);
        Ok(self)
    }

    /// Reads the element at `index`, which must be below the limit.
    pub fn get_at(&self, index: usize) -> Result<T> {
        self.cursor.check_index(index, 1)?;
        Ok(self.load(index))
    }

    /// Writes `value` at `index`, which must be below the limit.
    pub fn put_at(&mut self, index: usize, value: T) -> Result<&mut Self> {
        self.check_writable()?;
        self.cursor.check_index(index, 1)?;
        self.store(index, value);
        Ok(self)
    }

    /// Reads `length` elements into `dst[offset..offset + length]` and
    /// advances the position. Nothing is transferred on failure.
    pub fn get_bulk(&mut self, dst: &mut [T], offset: usize, length: usize) -> Result<&mut Self> {
        verify_range(offset, length, dst.len())?;
        let index = self.cursor.next_get_index(length)?;
        unsafe {
            copy::read_into(
                self.at(index),
                self.order,
                &mut dst[offset..offset + length],
                copy_policy(),
            )
        };
        Ok(self)
    }

    /// Fills `dst` from the position.
    pub fn get_slice(&mut self, dst: &mut [T]) -> Result<&mut Self> {
        let length = dst.len();
        self.get_bulk(dst, 0, length)
    }

    /// Writes `src[offset..offset + length]` at the position and advances the
    /// position. Nothing is transferred on failure.
    pub fn put_bulk(&mut self, src: &[T], offset: usize, length: usize) -> Result<&mut Self> {
        self.check_writable()?;
        verify_range(offset, length, src.len())?;
        let index = self.cursor.next_put_index(length)?;
        unsafe {
            copy::write_from(
                &src[offset..offset + length],
                self.at(index),
                self.order,
                copy_policy(),
            )
        };
        Ok(self)
    }

    /// Writes all of `src` at the position.
    pub fn put_slice(&mut self, src: &[T]) -> Result<&mut Self> {
        self.put_bulk(src, 0, src.len())
    }

    /// Fills `dst` from absolute `index`; the position is unchanged.
    pub fn get_bulk_at(&self, index: usize, dst: &mut [T]) -> Result<()> {
        self.cursor.check_range(index, dst.len())?;
        unsafe { copy::read_into(self.at(index), self.order, dst, copy_policy()) };
        Ok(())
    }

    /// Writes `src` at absolute `index`; the position is unchanged.
    pub fn put_bulk_at(&mut self, index: usize, src: &[T]) -> Result<&mut Self> {
        self.check_writable()?;
        self.cursor.check_range(index, src.len())?;
        unsafe { copy::write_from(src, self.at(index), self.order, copy_policy()) };
        Ok(self)
    }

    /// Copies the remaining elements of `src` into this buffer, advancing both
    /// positions.
    ///
    /// The two buffers may share storage; the result is the same as copying
    /// one element at a time from a snapshot of `src`.
    pub fn put_buffer(&mut self, src: &mut Buffer<T>) -> Result<&mut Self> {
        self.check_writable()?;
        let count = src.remaining();
        let dst_index = self.cursor.next_put_index(count)?;
        let src_index = src.cursor.next_get_index(count)?;
        unsafe {
            copy::transfer::<T>(
                src.at(src_index),
                src.order,
                self.at(dst_index),
                self.order,
                count,
                copy_policy(),
            )
        };
        Ok(self)
    }

    /// A buffer over the remaining elements: position zero, capacity and limit
    /// equal to `remaining()`, no mark.
    pub fn slice(&self) -> Buffer<T> {
        let position = self.position();
        Self::from_parts(
            self.storage.clone(),
            self.base + position * T::WIDTH,
            Cursor::new(self.remaining()),
            self.order,
            self.read_only,
        )
    }

    /// A buffer over `length` elements starting at absolute `index`.
    pub fn slice_at(&self, index: usize, length: usize) -> Result<Buffer<T>> {
        self.cursor.check_range(index, length)?;
        Ok(Self::from_parts(
            self.storage.clone(),
            self.base + index * T::WIDTH,
            Cursor::new(length),
            self.order,
            self.read_only,
        ))
    }

    /// A buffer sharing storage and positional state, with independent
    /// positional state from here on.
    pub fn duplicate(&self) -> Buffer<T> {
        Self::from_parts(
            self.storage.clone(),
            self.base,
            self.cursor,
            self.order,
            self.read_only,
        )
    }

    /// Like [`duplicate`](Self::duplicate), but every mutating operation on
    /// the result fails with `ReadOnly`.
    pub fn as_read_only(&self) -> Buffer<T> {
        let mut buffer = self.duplicate();
        buffer.read_only = true;
        buffer
    }

    /// Moves the remaining elements to the start of the buffer, then sets
    /// `position = remaining`, `limit = capacity` and discards the mark.
    pub fn compact(&mut self) -> Result<&mut Self> {
        self.check_writable()?;
        let remaining = self.remaining();
        unsafe {
            copy::move_bytes(
                self.at(self.position()),
                self.at(0),
                remaining * T::WIDTH,
                copy_policy().chunk_bytes,
            )
        };
        self.cursor.compacted(remaining);
        Ok(self)
    }

    /// Relative index of the first remaining element that differs from
    /// `other`, or `None` if the remaining contents are equal.
    pub fn mismatch(&self, other: &Buffer<T>) -> Option<usize> {
        let len = self.remaining().min(other.remaining());
        let first = self
            .iter()
            .zip(other.iter())
            .position(|(a, b)| !a.content_eq(&b));
        match first {
            Some(index) => Some(index),
            None if self.remaining() == other.remaining() => None,
            None => Some(len),
        }
    }

    /// Iterates over the remaining elements without moving the position.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (self.position()..self.limit()).map(move |index| self.load(index))
    }

    /// Copies the remaining elements into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        let mut values = vec![T::default(); self.remaining()];
        unsafe {
            copy::read_into(
                self.at(self.position()),
                self.order,
                &mut values,
                copy_policy(),
            )
        };
        values
    }
}

impl<T: Element> From<Vec<T>> for Buffer<T> {
    fn from(values: Vec<T>) -> Self {
        Buffer::wrap(values)
    }
}

impl<T: Element> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

impl<T: Element> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.remaining() == other.remaining()
            && self.iter().zip(other.iter()).all(|(a, b)| a.content_eq(&b))
    }
}

impl<T: Element> Eq for Buffer<T> {}

impl<T: Element> PartialOrd for Buffer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Element> Ord for Buffer<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.content_cmp(&b))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| self.remaining().cmp(&other.remaining()))
    }
}

impl<T: Element> Hash for Buffer<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.remaining().hash(state);
        for value in self.iter() {
            value.content_hash(state);
        }
    }
}

impl<T: Element> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("type", &T::NAME)
            .field("position", &self.position())
            .field("limit", &self.limit())
            .field("capacity", &self.capacity())
            .field("order", &self.order)
            .field("native", &self.is_native())
            .field("read_only", &self.read_only)
            .finish()
    }
}
