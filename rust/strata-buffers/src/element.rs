//! Element types storable in a [`Buffer`](crate::Buffer).

use std::{cmp::Ordering, hash::Hasher};

use strata_endian::FixedWidth;

/// A fixed-width numeric element with buffer content semantics.
///
/// Integer elements compare and hash by value. Floating-point elements treat
/// every NaN as equal to every other NaN and `-0.0` as equal to `0.0`; NaN
/// orders above every other value, including positive infinity.
pub trait Element: FixedWidth {
    fn content_eq(&self, other: &Self) -> bool;

    fn content_cmp(&self, other: &Self) -> Ordering;

    /// Feeds the value to `state` consistently with [`content_eq`](Self::content_eq).
    fn content_hash<H: Hasher>(&self, state: &mut H);
}

macro_rules! impl_int_element {
    ($($ty:ty),*) => {
        $(
            impl Element for $ty {
                #[inline]
                fn content_eq(&self, other: &Self) -> bool {
                    self == other
                }

                #[inline]
                fn content_cmp(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                #[inline]
                fn content_hash<H: Hasher>(&self, state: &mut H) {
                    std::hash::Hash::hash(self, state)
                }
            }
        )*
    };
}

impl_int_element!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! impl_float_element {
    ($($ty:ty),*) => {
        $(
            impl Element for $ty {
                #[inline]
                fn content_eq(&self, other: &Self) -> bool {
                    self == other || (self.is_nan() && other.is_nan())
                }

                #[inline]
                fn content_cmp(&self, other: &Self) -> Ordering {
                    if self.content_eq(other) {
                        return Ordering::Equal;
                    }
                    self.partial_cmp(other).unwrap_or_else(|| {
                        if self.is_nan() {
                            Ordering::Greater
                        } else {
                            Ordering::Less
                        }
                    })
                }

                #[inline]
                fn content_hash<H: Hasher>(&self, state: &mut H) {
                    let bits = if self.is_nan() {
                        <$ty>::NAN.to_bits()
                    } else if *self == 0.0 {
                        0
                    } else {
                        self.to_bits()
                    };
                    std::hash::Hash::hash(&bits, state)
                }
            }
        )*
    };
}

impl_float_element!(f32, f64);
