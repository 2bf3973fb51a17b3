//! Endian codec for fixed-width numeric types.
//!
//! Every type implements two access paths:
//! - slice based ([`FixedWidth::decode`], [`FixedWidth::encode`]), composing the
//!   value byte by byte in the requested order;
//! - address based ([`FixedWidth::load`], [`FixedWidth::store`]), which performs a
//!   single machine access when the platform tolerates unaligned access or the
//!   address happens to be naturally aligned, and falls back to the slice path
//!   otherwise. The value is swapped whenever the requested order is not native.

use byteorder::{BigEndian as BE, ByteOrder as _, LittleEndian as LE};

use crate::{ByteOrder, align::is_aligned_ptr};

/// Whether the target performs unaligned loads and stores at no extra cost.
pub const UNALIGNED_ACCESS: bool = cfg!(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "powerpc64",
    target_arch = "s390x",
));

/// A primitive numeric type with a fixed byte width.
pub trait FixedWidth:
    bytemuck::Pod + PartialEq + PartialOrd + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Size of the encoded value in bytes.
    const WIDTH: usize;

    /// Short type name used in diagnostics (`"i32"`, `"f64"`, ...).
    const NAME: &'static str;

    /// Reverses the byte order of the value's representation.
    fn swap_bytes(self) -> Self;

    /// Reads a value from the first `WIDTH` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() < WIDTH`.
    fn decode(bytes: &[u8], order: ByteOrder) -> Self;

    /// Writes the value into the first `WIDTH` bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes.len() < WIDTH`.
    fn encode(self, bytes: &mut [u8], order: ByteOrder);

    /// Converts between the native representation and `order`.
    #[inline]
    fn convert(self, order: ByteOrder) -> Self {
        if order.is_native() {
            self
        } else {
            self.swap_bytes()
        }
    }

    /// Reads a value stored in `order` at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `WIDTH` bytes.
    #[inline]
    unsafe fn load(ptr: *const u8, order: ByteOrder) -> Self {
        if UNALIGNED_ACCESS || is_aligned_ptr(ptr, std::mem::align_of::<Self>()) {
            let value = unsafe { ptr.cast::<Self>().read_unaligned() };
            value.convert(order)
        } else {
            let bytes = unsafe { std::slice::from_raw_parts(ptr, Self::WIDTH) };
            Self::decode(bytes, order)
        }
    }

    /// Writes the value in `order` at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `WIDTH` bytes and must not be aliased
    /// by a live reference.
    #[inline]
    unsafe fn store(self, ptr: *mut u8, order: ByteOrder) {
        if UNALIGNED_ACCESS || is_aligned_ptr(ptr, std::mem::align_of::<Self>()) {
            unsafe { ptr.cast::<Self>().write_unaligned(self.convert(order)) };
        } else {
            let bytes = unsafe { std::slice::from_raw_parts_mut(ptr, Self::WIDTH) };
            self.encode(bytes, order);
        }
    }
}

impl FixedWidth for u8 {
    const WIDTH: usize = 1;
    const NAME: &'static str = "u8";

    #[inline]
    fn swap_bytes(self) -> Self {
        self
    }

    #[inline]
    fn decode(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    #[inline]
    fn encode(self, bytes: &mut [u8], _order: ByteOrder) {
        bytes[0] = self;
    }
}

impl FixedWidth for i8 {
    const WIDTH: usize = 1;
    const NAME: &'static str = "i8";

    #[inline]
    fn swap_bytes(self) -> Self {
        self
    }

    #[inline]
    fn decode(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0] as i8
    }

    #[inline]
    fn encode(self, bytes: &mut [u8], _order: ByteOrder) {
        bytes[0] = self as u8;
    }
}

macro_rules! impl_fixed_width {
    ($ty:ident, |$v:ident| $swap:expr) => {
        paste::paste! {
            impl FixedWidth for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn swap_bytes(self) -> Self {
                    let $v = self;
                    $swap
                }

                #[inline]
                fn decode(bytes: &[u8], order: ByteOrder) -> Self {
                    match order {
                        ByteOrder::BigEndian => BE::[<read_ $ty>](bytes),
                        ByteOrder::LittleEndian => LE::[<read_ $ty>](bytes),
                    }
                }

                #[inline]
                fn encode(self, bytes: &mut [u8], order: ByteOrder) {
                    match order {
                        ByteOrder::BigEndian => BE::[<write_ $ty>](bytes, self),
                        ByteOrder::LittleEndian => LE::[<write_ $ty>](bytes, self),
                    }
                }
            }
        }
    };
}

impl_fixed_width!(i16, |v| v.swap_bytes());
impl_fixed_width!(u16, |v| v.swap_bytes());
impl_fixed_width!(i32, |v| v.swap_bytes());
impl_fixed_width!(u32, |v| v.swap_bytes());
impl_fixed_width!(i64, |v| v.swap_bytes());
impl_fixed_width!(u64, |v| v.swap_bytes());
impl_fixed_width!(f32, |v| f32::from_bits(v.to_bits().swap_bytes()));
impl_fixed_width!(f64, |v| f64::from_bits(v.to_bits().swap_bytes()));
