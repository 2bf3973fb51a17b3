//! Reference-counted memory blocks shared by a buffer and all of its aliases.

use std::{any::Any, cell::Cell, rc::Rc};

use crate::{element::Element, native::NativeAllocation};

/// Memory behind a buffer. Cloning shares the block.
#[derive(Clone)]
pub(crate) enum Storage {
    Heap(Rc<dyn HeapMemory>),
    Native(Rc<NativeAllocation>),
}

impl Storage {
    pub(crate) fn heap<T: Element>(values: impl IntoIterator<Item = T>) -> Storage {
        Storage::Heap(Rc::new(HeapArray::<T> {
            cells: values.into_iter().map(Cell::new).collect(),
        }))
    }

    /// Start of the block. Writes through this pointer are permitted: heap
    /// memory lives in `Cell`s and native memory is never borrowed.
    #[inline]
    pub(crate) fn ptr(&self) -> *mut u8 {
        match self {
            Storage::Heap(heap) => heap.as_ptr(),
            Storage::Native(native) => native.address(),
        }
    }

    /// Size of the block in bytes.
    pub(crate) fn byte_len(&self) -> usize {
        match self {
            Storage::Heap(heap) => heap.byte_len(),
            Storage::Native(native) => native.capacity(),
        }
    }

    #[inline]
    pub(crate) fn is_native(&self) -> bool {
        matches!(self, Storage::Native(_))
    }

    /// The element array, if this block is a heap array of `T`.
    pub(crate) fn array<T: Element>(&self) -> Option<&[Cell<T>]> {
        match self {
            Storage::Heap(heap) => heap
                .as_any()
                .downcast_ref::<HeapArray<T>>()
                .map(|array| &array.cells[..]),
            Storage::Native(_) => None,
        }
    }
}

/// Type-erased heap element array.
pub(crate) trait HeapMemory: 'static {
    fn as_ptr(&self) -> *mut u8;

    fn byte_len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct HeapArray<T> {
    cells: Box<[Cell<T>]>,
}

impl<T: Element> HeapMemory for HeapArray<T> {
    #[inline]
    fn as_ptr(&self) -> *mut u8 {
        self.cells.as_ptr() as *mut u8
    }

    fn byte_len(&self) -> usize {
        self.cells.len() * T::WIDTH
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
