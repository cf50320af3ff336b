// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for query-cache operations.

use std::fmt;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A cache backend `get`, `store` or `invalidate` call failed.
    Backend,
    /// The wrapped execution callback reported a failure.
    Execution,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Returns a stable, lowercase name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Execution => "execution",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error recorded on a query call.
///
/// This is an opaque, cloneable error type that wraps the underlying cause. Errors are
/// cloneable so that a single failed execution can be observed by every call that was
/// coalesced onto it. Use [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use easel_backend::{Error, ErrorKind};
///
/// let error = Error::backend("connection reset");
/// assert_eq!(error.kind(), ErrorKind::Backend);
/// ```
#[ohno::error]
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error for a failed cache backend operation.
    pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Backend, cause)
    }

    /// Creates an error for a failed query or mutation execution.
    pub fn execution(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Execution, cause)
    }

    /// Creates an unclassified error from any type that can be converted to an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use easel_backend::Error;
    ///
    /// let error = Error::from_message("operation failed");
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Other, cause)
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for query-cache operations.
pub type Result<T> = std::result::Result<T, Error>;
