use std::sync::OnceLock;

/// Alignment guaranteed for every block returned by [`allocate_zeroed`].
pub const MIN_ALIGNMENT: usize = 16;

/// Allocates `size` bytes of zero-initialized native memory via `calloc`.
///
/// A zero `size` is rounded up to one byte so that the returned pointer is
/// always unique and non-null.
///
/// # Safety
///
/// The returned pointer must be released with [`free`], passing the same `size`.
pub fn allocate_zeroed(size: usize) -> std::io::Result<*mut u8> {
    let ptr = unsafe { libc::calloc(1, size.max(1)) };
    if ptr.is_null() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            format!("calloc of {size} bytes failed"),
        ));
    }
    Ok(ptr as *mut u8)
}

/// Frees memory returned by [`allocate_zeroed`].
///
/// # Safety
///
/// - `ptr` was returned by a previous call to [`allocate_zeroed`]
/// - `size` matches the size passed to that call
/// - The memory has not already been freed and is no longer referenced
pub unsafe fn free(ptr: *mut u8, _size: usize) -> std::io::Result<()> {
    unsafe { libc::free(ptr as *mut libc::c_void) };
    Ok(())
}

/// Gets the system's standard page size in bytes.
///
/// The value is cached after the first call. If the page size cannot be
/// determined, returns a default value of 4KB.
pub fn get_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| match read_page_size() {
        Ok(size) => size,
        Err(e) => {
            log::warn!("sysconf(_SC_PAGESIZE) failed: {e}; assuming 4096");
            4 * 1024
        }
    })
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    assert!(res < i32::MAX as _);
    Ok(res as usize)
}
