//! Error types for loading and configuring the core.

use std::fmt;
use std::io;

/// Error type for weight blob loading failures.
///
/// Any of these is fatal: a network that fails to load must never be
/// used for evaluation.
#[derive(Debug)]
pub enum NetworkError {
    /// Blob length does not match the declared network shape
    SizeMismatch { expected: usize, found: usize },
    /// Reading the weight file failed
    Io(io::Error),
    /// No weight file configured and no network compiled in
    Missing,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::SizeMismatch { expected, found } => {
                write!(
                    f,
                    "Network blob is {found} bytes, expected exactly {expected}"
                )
            }
            NetworkError::Io(err) => write!(f, "Failed to read network: {err}"),
            NetworkError::Missing => {
                write!(f, "No network path configured and no embedded network available")
            }
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkError::Io(err) => Some(err),
            NetworkError::SizeMismatch { .. } | NetworkError::Missing => None,
        }
    }
}

impl From<io::Error> for NetworkError {
    fn from(err: io::Error) -> Self {
        NetworkError::Io(err)
    }
}

/// Error type for square parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Square index outside 0-63
    OutOfRange { index: usize },
    /// Invalid algebraic notation
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::OutOfRange { index } => {
                write!(f, "Square index {index} out of bounds (must be 0-63)")
            }
            SquareError::InvalidNotation { notation } => {
                write!(f, "Invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}
