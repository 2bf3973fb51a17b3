use std::alloc::{Layout, alloc_zeroed, dealloc};

/// Alignment guaranteed for every block returned by [`allocate_zeroed`].
pub const MIN_ALIGNMENT: usize = 16;

/// Allocates `size` bytes of zero-initialized memory (emulated via the global allocator).
pub fn allocate_zeroed(size: usize) -> std::io::Result<*mut u8> {
    let layout = layout(size)?;
    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            format!("allocation of {size} bytes failed"),
        ));
    }
    Ok(ptr)
}

/// Frees memory returned by [`allocate_zeroed`].
pub unsafe fn free(ptr: *mut u8, size: usize) -> std::io::Result<()> {
    let layout = layout(size)?;
    unsafe { dealloc(ptr, layout) };
    Ok(())
}

/// Returns the "standard page" size in bytes.
pub fn get_page_size() -> usize {
    4 * 1024
}

fn layout(size: usize) -> std::io::Result<Layout> {
    Layout::from_size_align(size.max(1), MIN_ALIGNMENT)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "Invalid layout"))
}
