//! Errors surfaced by [`crate::LocationStore`] operations.

use thiserror::Error;

use crate::store::PersistenceError;

/// Caller input failed a business rule.
///
/// Always recoverable by correcting the input; the store never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name was absent or blank after trimming.
    #[error("name required")]
    MissingName,
    /// A coordinate was absent or did not parse to a finite number.
    #[error("latitude/longitude required")]
    MissingCoordinates,
    /// A coordinate fell outside the accepted non-negative range.
    #[error("coordinates must be non-negative")]
    NegativeCoordinates,
    /// A proximity query parameter was absent or not a finite number.
    #[error("{field} is required and must be a number")]
    InvalidQueryParameter {
        /// Name of the offending query parameter.
        field: &'static str,
    },
}

/// Errors returned by [`crate::LocationStore`].
///
/// A failed operation never leaves a partially applied mutation behind.
#[derive(Debug, Error)]
pub enum LocationStoreError {
    /// Input was rejected before any state changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No record carries the requested identifier.
    #[error("point of interest {id} not found")]
    NotFound {
        /// Identifier that was looked up.
        id: u64,
    },
    /// The largest identifier in use cannot be incremented.
    #[error("no identifiers remain after {max_id}")]
    IdSpaceExhausted {
        /// Current maximum identifier.
        max_id: u64,
    },
    /// The persistence adapter failed to read or write the collection.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Coarse classification of a [`LocationStoreError`].
///
/// API layers map this to their own status codes without matching on every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationStoreErrorKind {
    /// Input was malformed or broke a business rule.
    Validation,
    /// The referenced record does not exist.
    NotFound,
    /// Storage failed or is exhausted.
    Persistence,
}

impl LocationStoreError {
    /// Classify the error.
    ///
    /// # Examples
    /// ```
    /// use locus_core::{LocationStoreError, LocationStoreErrorKind};
    ///
    /// let err = LocationStoreError::NotFound { id: 4 };
    /// assert_eq!(err.kind(), LocationStoreErrorKind::NotFound);
    /// assert_eq!(err.to_string(), "point of interest 4 not found");
    /// ```
    #[must_use]
    pub const fn kind(&self) -> LocationStoreErrorKind {
        match self {
            Self::Validation(_) => LocationStoreErrorKind::Validation,
            Self::NotFound { .. } => LocationStoreErrorKind::NotFound,
            Self::IdSpaceExhausted { .. } | Self::Persistence(_) => {
                LocationStoreErrorKind::Persistence
            }
        }
    }
}
