//! Power-of-two alignment arithmetic on addresses and byte offsets.

/// Aligns `n` up to the next multiple of `alignment`.
///
/// # Examples
///
/// ```
/// use strata_endian::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(4097, 4096), 8192);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a non-zero power of two.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Aligns `n` down to the previous multiple of `alignment`.
///
/// ```
/// use strata_endian::align::align_down;
///
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(9, 8), 8);
/// assert_eq!(align_down(16, 8), 16);
/// ```
#[inline]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Checks if `n` is a multiple of `alignment`.
///
/// ```
/// use strata_endian::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if the pointer is aligned to `alignment` bytes.
#[inline]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

/// Distance in bytes from `n` back to the previous multiple of `alignment`
/// (`n mod alignment`).
#[inline]
pub fn misalignment(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n & (alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up_down() {
        for alignment in [1usize, 2, 4, 8, 4096] {
            for n in 0..10_000usize {
                let up = align_up(n, alignment);
                let down = align_down(n, alignment);
                assert!(is_aligned(up, alignment));
                assert!(is_aligned(down, alignment));
                assert!(down <= n && n <= up);
                assert!(up - down == 0 || up - down == alignment);
                assert_eq!(misalignment(n, alignment), n - down);
            }
        }
    }

    #[test]
    fn test_is_aligned_ptr() {
        let values = [0u64; 4];
        let p = values.as_ptr();
        assert!(is_aligned_ptr(p, 8));
        assert!(!is_aligned_ptr((p as *const u8).wrapping_add(1), 2));
    }
}
