pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

/// Validates an `(offset, length)` pair against a region of `len` elements.
///
/// Equivalent to requiring that `offset`, `length`, `offset + length` and
/// `len - (offset + length)` are all non-negative, without any of the
/// intermediate values being able to wrap.
#[inline]
pub fn verify_range(offset: usize, length: usize, len: usize) -> Result<()> {
    if offset <= len && length <= len - offset {
        Ok(())
    } else {
        range_error(offset, length, len)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
fn range_error(offset: usize, length: usize, len: usize) -> Result<()> {
    Err(crate::error::Error::index_out_of_range(offset, length, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: usize) -> Result<()> {
        verify_arg!(value, value <= 10);
        Ok(())
    }

    #[test]
    fn test_verify_arg_macro() {
        assert!(check(5).is_ok());
        let err = check(11).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument value: value <= 10");
    }

    #[test]
    fn test_verify_range() {
        assert!(verify_range(0, 0, 0).is_ok());
        assert!(verify_range(2, 3, 5).is_ok());
        assert!(verify_range(5, 0, 5).is_ok());
        assert!(verify_range(6, 0, 5).is_err());
        assert!(verify_range(2, 4, 5).is_err());
        assert!(verify_range(usize::MAX, 2, 5).is_err());
        assert!(verify_range(1, usize::MAX, 5).is_err());
    }
}
