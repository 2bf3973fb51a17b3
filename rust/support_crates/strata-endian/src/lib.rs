//! Byte order selection and the endian codec for fixed-width numeric types.
//!
//! The codec converts between byte sequences and `i8`..`u64`, `f32` and `f64`
//! in both byte orders, either over a byte slice or over a raw address.

pub mod align;
pub mod codec;

pub use codec::FixedWidth;

/// Byte order of a multi-byte value in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// Byte order of the platform the process runs on.
    #[inline]
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    /// Returns `true` if values in this order can be accessed without swapping.
    #[inline]
    pub const fn is_native(self) -> bool {
        matches!(
            (self, ByteOrder::native()),
            (ByteOrder::BigEndian, ByteOrder::BigEndian)
                | (ByteOrder::LittleEndian, ByteOrder::LittleEndian)
        )
    }

    /// The opposite byte order.
    #[inline]
    pub const fn reverse(self) -> ByteOrder {
        match self {
            ByteOrder::BigEndian => ByteOrder::LittleEndian,
            ByteOrder::LittleEndian => ByteOrder::BigEndian,
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::BigEndian => f.write_str("BIG_ENDIAN"),
            ByteOrder::LittleEndian => f.write_str("LITTLE_ENDIAN"),
        }
    }
}
