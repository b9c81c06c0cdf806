//! Error kinds shared by every operation in this crate.
//!
//! All fallible operations resolve to one of four kinds, mirroring the failure
//! modes of the hosted backend they front: the remote store is unreachable,
//! user input failed validation, a target document vanished, or the local role
//! check refused the action. Errors are surfaced to the user as notices and are
//! never retried automatically.
//!
//! # Example
//!
//! ```rust
//! use bubbletea_admin::error::Error;
//!
//! let err = Error::validation("Title is required.");
//! assert_eq!(err.to_string(), "Title is required.");
//! assert!(matches!(err, Error::ValidationFailed(_)));
//! ```

use thiserror::Error as ThisError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The four operation-boundary error kinds.
///
/// Messages are written for direct display in a notice line; `Display` output
/// is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// A fetch or subscription setup against the remote store failed.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),
    /// User input was rejected: a missing required field, or an oversized or
    /// wrong-type file. Previously entered form state must stay intact.
    #[error("{0}")]
    ValidationFailed(String),
    /// The target of an edit or delete no longer exists.
    #[error("not found: {0}")]
    NotFound(String),
    /// A local role check refused the action. Advisory only, not a security
    /// boundary.
    #[error("not permitted: {0}")]
    Unauthorized(String),
}

impl Error {
    /// Builds a [`Error::RemoteUnavailable`].
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteUnavailable(msg.into())
    }

    /// Builds a [`Error::ValidationFailed`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    /// Builds a [`Error::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Builds a [`Error::Unauthorized`].
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::remote("connection refused").to_string(),
            "remote unavailable: connection refused"
        );
        assert_eq!(
            Error::validation("Image size must be less than 5MB.").to_string(),
            "Image size must be less than 5MB."
        );
        assert_eq!(
            Error::not_found("publication abc").to_string(),
            "not found: publication abc"
        );
        assert_eq!(
            Error::unauthorized("This account is protected and cannot be deleted.").to_string(),
            "not permitted: This account is protected and cannot be deleted."
        );
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        let errs = [
            Error::remote("a"),
            Error::validation("a"),
            Error::not_found("a"),
            Error::unauthorized("a"),
        ];
        for (i, a) in errs.iter().enumerate() {
            for (j, b) in errs.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}
