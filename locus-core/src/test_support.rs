//! Test-only repositories that misbehave on purpose.

use crate::{PersistenceError, PoiRepository, PointOfInterest};

/// Repository whose reads or writes always fail.
///
/// Built with [`FailingRepository::failing_reads`] it behaves like a corrupt
/// backing store; built with [`FailingRepository::failing_writes`] it serves
/// a fixed collection and refuses every save.
#[derive(Debug, Clone, Default)]
pub struct FailingRepository {
    pois: Vec<PointOfInterest>,
    fail_reads: bool,
}

impl FailingRepository {
    /// A repository that cannot be read and cannot be written.
    #[must_use]
    pub const fn failing_reads() -> Self {
        Self {
            pois: Vec::new(),
            fail_reads: true,
        }
    }

    /// A repository that serves `pois` and rejects every save.
    #[must_use]
    pub fn failing_writes<I>(pois: I) -> Self
    where
        I: IntoIterator<Item = PointOfInterest>,
    {
        Self {
            pois: pois.into_iter().collect(),
            fail_reads: false,
        }
    }

    fn refusal(action: &str) -> PersistenceError {
        PersistenceError::Unavailable {
            reason: format!("{action} disabled for this test repository"),
        }
    }
}

impl PoiRepository for FailingRepository {
    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        if self.fail_reads {
            return Err(Self::refusal("reads"));
        }
        Ok(self.pois.clone())
    }

    fn save_all(&self, _pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        Err(Self::refusal("writes"))
    }
}
