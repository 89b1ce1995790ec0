use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    OutOfBounds,
    BudgetExceeded,
    Malformed,
    StopByteCollision,
    LengthMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OutOfBounds, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Malformed, message)
    }

    pub fn budget(what: &str, count: usize, max: usize) -> Self {
        Self::new(
            ErrorCode::BudgetExceeded,
            format!("too many {what}: {count}, maximum is {max}"),
        )
    }

    pub fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        Self::new(
            ErrorCode::LengthMismatch,
            format!("{what}: expected {expected} entries, got {actual}"),
        )
    }

    /// Prefixes the message with where the failure happened, keeping the code.
    pub fn context(self, context: impl fmt::Display) -> Self {
        Self {
            code: self.code,
            message: format!("{context}: {}", self.message),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl StdError for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::malformed(format!("invalid JSON: {e}"))
    }
}
