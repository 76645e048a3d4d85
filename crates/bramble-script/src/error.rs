//! Errors raised while compiling or running module code.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by the embedding host.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during compilation or execution.
#[derive(Debug, Error)]
pub enum Error {
    /// Syntax error during parsing
    #[error("SyntaxError: {message} ({line}:{column})")]
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Type error during execution
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A numeric value outside its allowed range
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Reference to an unbound identifier
    #[error("ReferenceError: {0} is not defined")]
    ReferenceError(String),

    /// A snapshot artifact that cannot be turned into a callable unit
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Error raised by the host, e.g. a nested `require` that failed.
    ///
    /// The original error is kept intact so the host can recover it with
    /// `downcast` once control returns from the engine.
    #[error(transparent)]
    Host(HostError),
}

impl Error {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new RangeError
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Wrap a host error so it can travel through script execution.
    pub fn host(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Host(Box::new(err))
    }
}

/// Converts a byte offset into a 1-based (line, column) pair.
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(pos) => before[pos + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let src = "a\nbc\ndef";
        assert_eq!(line_column(src, 0), (1, 1));
        assert_eq!(line_column(src, 3), (2, 2));
        assert_eq!(line_column(src, 7), (3, 3));
        assert_eq!(line_column(src, 100), (3, 4));
    }

    #[test]
    fn test_host_error_downcast() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let Error::Host(inner) = Error::host(io) else {
            panic!("expected host error");
        };
        assert!(inner.downcast::<std::io::Error>().is_ok());
    }
}
