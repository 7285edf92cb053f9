//! Persistence boundary for the point of interest collection.
//!
//! The [`PoiRepository`] trait loads and saves the whole collection as one
//! unit. Adapters hold no business rules: validation, identifier allocation
//! and search all live in [`crate::LocationStore`].
//!
//! Mutations run inside a [`WriteSession`], which holds the adapter's
//! exclusive write lock from the read through to the save. Adapters backed by
//! shared storage take a lock that other processes also respect.

use std::sync::Arc;

use log::warn;

use crate::PointOfInterest;

mod error;
#[cfg(feature = "store-json")]
mod json;
mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use error::PersistenceError;
#[cfg(feature = "store-json")]
pub use json::JsonFileRepository;
pub use memory::MemoryRepository;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteRepository;

/// Durable storage for the full collection of points of interest.
///
/// Implementations must make [`save_all`](Self::save_all) atomic: a
/// concurrent reader sees either the previous collection or the new one,
/// never a mixture.
///
/// # Examples
///
/// ```rust
/// use std::sync::Mutex;
/// use locus_core::{PersistenceError, PoiRepository, PointOfInterest};
///
/// #[derive(Default)]
/// struct VecRepository {
///     pois: Mutex<Vec<PointOfInterest>>,
/// }
///
/// impl PoiRepository for VecRepository {
///     fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
///         let pois = self.pois.lock().map_err(|_| PersistenceError::Unavailable {
///             reason: "lock poisoned".into(),
///         })?;
///         Ok(pois.clone())
///     }
///
///     fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
///         let mut stored = self.pois.lock().map_err(|_| PersistenceError::Unavailable {
///             reason: "lock poisoned".into(),
///         })?;
///         *stored = pois.to_vec();
///         Ok(())
///     }
/// }
///
/// let repository = VecRepository::default();
/// let poi = PointOfInterest::from_degrees(1, "Museum", 1.0, 2.0);
/// repository.save_all(std::slice::from_ref(&poi)).expect("save");
/// assert_eq!(repository.load_all(), vec![poi]);
/// ```
pub trait PoiRepository {
    /// Start a read-modify-write cycle holding the exclusive write lock.
    ///
    /// The default session reads through [`try_load_all`](Self::try_load_all)
    /// and saves through [`save_all`](Self::save_all) without locking.
    /// Adapters whose storage can be shared with other handles or processes
    /// override it.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the lock cannot be acquired.
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        Ok(Box::new(DirectSession { repository: self }))
    }

    /// Read the full collection in storage order, reporting failures.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the backing store cannot be read or
    /// decoded.
    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError>;

    /// Replace the stored collection with `pois`.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the collection could not be made
    /// durable. The previous collection stays in place.
    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError>;

    /// Read the full collection, degrading to an empty one on failure.
    ///
    /// Read failures are logged and never reach the caller, so read-only
    /// queries stay available while the backing store is damaged.
    fn load_all(&self) -> Vec<PointOfInterest> {
        self.try_load_all().unwrap_or_else(|err| {
            warn!("failed to load points of interest, continuing with none: {err}");
            Vec::new()
        })
    }
}

/// An exclusive read-modify-write cycle over the collection.
///
/// Dropping a session without committing abandons the change and releases
/// the lock.
pub trait WriteSession {
    /// Read the collection as seen under the lock.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the collection cannot be read.
    fn load(&self) -> Result<Vec<PointOfInterest>, PersistenceError>;

    /// Replace the collection with `pois` and release the lock.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when the collection could not be made
    /// durable. The previous collection stays in place.
    fn commit(self: Box<Self>, pois: &[PointOfInterest]) -> Result<(), PersistenceError>;
}

struct DirectSession<'a, R: ?Sized> {
    repository: &'a R,
}

impl<R: PoiRepository + ?Sized> WriteSession for DirectSession<'_, R> {
    fn load(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        self.repository.try_load_all()
    }

    fn commit(self: Box<Self>, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        self.repository.save_all(pois)
    }
}

impl<R: PoiRepository + ?Sized> PoiRepository for Box<R> {
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        (**self).begin_write()
    }

    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        (**self).try_load_all()
    }

    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        (**self).save_all(pois)
    }

    fn load_all(&self) -> Vec<PointOfInterest> {
        (**self).load_all()
    }
}

impl<R: PoiRepository + ?Sized> PoiRepository for Arc<R> {
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        (**self).begin_write()
    }

    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        (**self).try_load_all()
    }

    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        (**self).save_all(pois)
    }

    fn load_all(&self) -> Vec<PointOfInterest> {
        (**self).load_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingRepository;
    use rstest::rstest;

    #[rstest]
    fn load_all_degrades_to_empty_on_read_failure() {
        let repository = FailingRepository::failing_reads();
        assert!(repository.try_load_all().is_err());
        assert!(repository.load_all().is_empty());
    }

    #[rstest]
    fn default_session_reads_and_saves_through_the_repository() {
        let repository = FailingRepository::failing_writes([PointOfInterest::from_degrees(
            1, "Quay", 1.0, 1.0,
        )]);
        let session = repository.begin_write().expect("begin session");
        let pois = session.load().expect("load under session");
        assert_eq!(pois.len(), 1);
        assert!(matches!(
            session.commit(&pois),
            Err(PersistenceError::Unavailable { .. })
        ));
    }

    #[rstest]
    fn boxed_repositories_forward_calls() {
        let repository: Box<dyn PoiRepository> = Box::new(MemoryRepository::default());
        let poi = PointOfInterest::from_degrees(1, "Quay", 1.0, 1.0);
        repository
            .save_all(std::slice::from_ref(&poi))
            .expect("save through box");
        assert_eq!(repository.load_all(), vec![poi]);
    }

    #[rstest]
    fn shared_repositories_observe_the_same_collection() {
        let repository = Arc::new(MemoryRepository::default());
        let alias = Arc::clone(&repository);
        let poi = PointOfInterest::from_degrees(4, "Bridge", 3.0, 4.0);
        repository
            .save_all(std::slice::from_ref(&poi))
            .expect("save through arc");
        assert_eq!(alias.load_all(), vec![poi]);
    }
}
