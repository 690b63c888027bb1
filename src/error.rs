//! Unified error type.

use std::fmt;

/// The error type returned by the crate's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. Access-log write
/// failures are never surfaced either. This type covers infrastructure
/// failures (binding a port, accepting a connection) and configuration
/// mistakes such as an unknown log format name.
#[derive(Debug)]
pub enum Error {
    /// Binding or accepting on the listener failed.
    Io(std::io::Error),
    /// A log format name other than `common` or `combined`.
    UnknownFormat(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::UnknownFormat(name) => {
                write!(f, "unknown access log format `{name}` (expected `common` or `combined`)")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::UnknownFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken"));
        assert_eq!(err.to_string(), "io: taken");
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_format_names_the_input() {
        let err = Error::UnknownFormat("json".to_owned());
        assert!(err.to_string().contains("`json`"));
        assert!(err.source().is_none());
    }
}
