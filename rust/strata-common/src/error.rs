use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn index_out_of_range(index: usize, length: usize, bound: usize) -> Error {
        Error(
            ErrorKind::IndexOutOfRange {
                index,
                length,
                bound,
            }
            .into(),
        )
    }

    pub fn underflow(requested: usize, remaining: usize) -> Error {
        Error(
            ErrorKind::BufferUnderflow {
                requested,
                remaining,
            }
            .into(),
        )
    }

    pub fn overflow(requested: usize, remaining: usize) -> Error {
        Error(
            ErrorKind::BufferOverflow {
                requested,
                remaining,
            }
            .into(),
        )
    }

    pub fn invalid_mark() -> Error {
        Error(ErrorKind::InvalidMark.into())
    }

    pub fn read_only() -> Error {
        Error(ErrorKind::ReadOnly.into())
    }

    pub fn unsupported(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::Unsupported {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn out_of_memory(requested: u64, available: u64, limit: u64) -> Error {
        Error(
            ErrorKind::OutOfMemory {
                requested,
                available,
                limit,
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// Returns `true` for the underflow/overflow kinds raised by relative
    /// transfers that ran out of room.
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::BufferUnderflow { .. } | ErrorKind::BufferOverflow { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("index {index} (length {length}) out of range for bound {bound}")]
    IndexOutOfRange {
        index: usize,
        length: usize,
        bound: usize,
    },

    #[error("buffer underflow: requested {requested}, remaining {remaining}")]
    BufferUnderflow { requested: usize, remaining: usize },

    #[error("buffer overflow: requested {requested}, remaining {remaining}")]
    BufferOverflow { requested: usize, remaining: usize },

    #[error("mark is not set")]
    InvalidMark,

    #[error("buffer is read-only")]
    ReadOnly,

    #[error("unsupported operation {operation}")]
    Unsupported { operation: String },

    #[error(
        "cannot reserve {requested} bytes of native memory \
         (available {available}, limit {limit})"
    )]
    OutOfMemory {
        requested: u64,
        available: u64,
        limit: u64,
    },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        let e = Error::overflow(4, 2);
        assert!(matches!(
            e.kind(),
            ErrorKind::BufferOverflow {
                requested: 4,
                remaining: 2
            }
        ));
        assert!(e.is_capacity_error());
        assert!(!Error::read_only().is_capacity_error());
    }

    #[test]
    fn test_display() {
        let e = Error::index_out_of_range(10, 1, 8);
        assert_eq!(
            e.to_string(),
            "index 10 (length 1) out of range for bound 8"
        );
        assert_eq!(Error::invalid_mark().to_string(), "mark is not set");
    }

    #[test]
    fn test_from_io() {
        let e: Error = std::io::Error::other("boom").into();
        assert!(matches!(e.into_kind(), ErrorKind::Io { .. }));
    }
}
