use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for engine operations
///
/// This enum represents all possible error types that can occur during
/// document store operations. Each error kind describes a specific category
/// of failure, enabling precise error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::errors::{EngineError, ErrorKind, EngineResult};
///
/// fn example() -> EngineResult<()> {
///     Err(EngineError::new("Index not found", ErrorKind::IndexNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Parse-time errors - raised before any document is touched
    /// A query predicate document is malformed or uses an unknown operator
    InvalidPredicate,
    /// An update document is malformed or uses an unknown operator
    InvalidUpdate,
    /// An aggregation pipeline stage is malformed or unknown
    InvalidPipeline,

    // Evaluation errors
    /// An operand has an incompatible type for the requested operation
    TypeMismatch,

    // Identity errors
    /// The provided document id is invalid
    InvalidId,
    /// A write attempted to change the immutable `_id` of a document
    IdentifierMismatch,
    /// A duplicate `_id` or unique index key was encountered
    DuplicateKey,

    // Indexing errors
    /// Index does not exist
    IndexNotFound,
    /// An index with conflicting definition already exists
    IndexConflict,

    // Collection errors
    /// Collection does not exist
    CollectionNotFound,

    // Validation and operation errors
    /// Generic validation error
    ValidationError,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Generic/Internal errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidPredicate => write!(f, "Invalid predicate"),
            ErrorKind::InvalidUpdate => write!(f, "Invalid update"),
            ErrorKind::InvalidPipeline => write!(f, "Invalid pipeline"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::IdentifierMismatch => write!(f, "Identifier mismatch"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::IndexConflict => write!(f, "Index conflict"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom engine error type.
///
/// `EngineError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::errors::{EngineError, ErrorKind};
///
/// // Create a simple error
/// let err = EngineError::new("Index not found", ErrorKind::IndexNotFound);
///
/// // Create an error with a cause
/// let cause = EngineError::new("Bad operand", ErrorKind::TypeMismatch);
/// let err = EngineError::new_with_cause("Update failed", ErrorKind::InvalidUpdate, cause);
/// ```
///
/// # Type alias
///
/// The `EngineResult<T>` type alias is equivalent to `Result<T, EngineError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct EngineError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<EngineError>>,
    backtrace: Atomic<Backtrace>,
}

impl EngineError {
    /// Creates a new `EngineError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    ///
    /// # Returns
    ///
    /// A new `EngineError` instance.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        EngineError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `EngineError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    ///
    /// # Returns
    ///
    /// A new `EngineError` instance with the cause error attached.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: EngineError) -> Self {
        EngineError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<EngineError>> {
        self.cause.as_ref()
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for engine operations.
///
/// `EngineResult<T>` is shorthand for `Result<T, EngineError>`.
/// All fallible engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<String> for EngineError {
    fn from(msg: String) -> Self {
        EngineError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for EngineError {
    fn from(msg: &str) -> Self {
        EngineError::new(msg, ErrorKind::InternalError)
    }
}
