use std::sync::{
    PoisonError, RwLock, RwLockWriteGuard,
    atomic::{AtomicUsize, Ordering},
};

use crate::PointOfInterest;

use super::{PersistenceError, PoiRepository, WriteSession};

/// In-process repository holding the collection behind a lock.
///
/// Nothing survives the process. Useful for tests and for embedding the
/// store where durability is handled elsewhere. Each save swaps the whole
/// collection under a single write lock.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    pois: RwLock<Vec<PointOfInterest>>,
    saves: AtomicUsize,
}

impl MemoryRepository {
    /// Create a repository seeded with `pois` in the given order.
    #[must_use]
    pub fn with_pois<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = PointOfInterest>,
    {
        Self {
            pois: RwLock::new(pois.into_iter().collect()),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful [`PoiRepository::save_all`] calls so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

struct MemorySession<'a> {
    pois: RwLockWriteGuard<'a, Vec<PointOfInterest>>,
    saves: &'a AtomicUsize,
}

impl WriteSession for MemorySession<'_> {
    fn load(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        Ok(self.pois.clone())
    }

    fn commit(mut self: Box<Self>, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        *self.pois = pois.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl PoiRepository for MemoryRepository {
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        Ok(Box::new(MemorySession {
            pois: self.pois.write().unwrap_or_else(PoisonError::into_inner),
            saves: &self.saves,
        }))
    }

    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        let pois = self.pois.read().unwrap_or_else(PoisonError::into_inner);
        Ok(pois.clone())
    }

    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        let replacement = pois.to_vec();
        let mut stored = self.pois.write().unwrap_or_else(PoisonError::into_inner);
        *stored = replacement;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
