//! The location store: CRUD and proximity search over a [`PoiRepository`].
//!
//! Every operation loads the whole collection, works on it in memory and,
//! when mutating, writes the whole collection back. Mutations are serialised
//! through a write gate and a repository write session, so that concurrent
//! callers cannot both allocate the same identifier from one stale snapshot,
//! whether they share this store, another store over the same storage, or
//! another process. Reads never take the gate.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::{
    LocationStoreError, NearbyQuery, PoiInput, PoiRepository, PointOfInterest, haversine_km,
};

/// Owns validation, identifier allocation, CRUD semantics and proximity
/// search for a collection of points of interest.
///
/// The store is `Sync` whenever its repository is, so one instance can be
/// shared behind an [`std::sync::Arc`] by many threads.
///
/// # Examples
///
/// ```
/// use locus_core::{LocationStore, LocationStoreError, MemoryRepository, PoiInput};
///
/// # fn main() -> Result<(), LocationStoreError> {
/// let store = LocationStore::new(MemoryRepository::default());
/// let first = store.create(&PoiInput::new("Museum", 10, 20))?;
/// let second = store.create(&PoiInput::new("Harbour", "30", "40"))?;
/// assert_eq!((first.id, second.id), (1, 2));
///
/// store.delete(second.id)?;
/// assert_eq!(store.list_all(), vec![first]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LocationStore<R> {
    repository: R,
    write_gate: Mutex<()>,
}

impl<R: PoiRepository> LocationStore<R> {
    /// Wrap `repository`. The store takes no other state of its own.
    #[must_use]
    pub const fn new(repository: R) -> Self {
        Self {
            repository,
            write_gate: Mutex::new(()),
        }
    }

    /// Borrow the underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Every record, in storage order.
    ///
    /// Never fails: an unreadable backing store yields an empty collection.
    #[must_use]
    pub fn list_all(&self) -> Vec<PointOfInterest> {
        self.repository.load_all()
    }

    /// The record with identifier `id`.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::NotFound`] when no record has that id.
    pub fn get_by_id(&self, id: u64) -> Result<PointOfInterest, LocationStoreError> {
        self.repository
            .load_all()
            .into_iter()
            .find(|poi| poi.id == id)
            .ok_or(LocationStoreError::NotFound { id })
    }

    /// Validate `input`, assign the next identifier, append and persist.
    ///
    /// The new identifier is one more than the largest identifier present, or
    /// `1` for an empty collection. Deleting the record with the largest
    /// identifier therefore frees that identifier for reuse.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::Validation`] for rejected input,
    /// [`LocationStoreError::IdSpaceExhausted`] when no larger identifier
    /// exists and [`LocationStoreError::Persistence`] when the collection
    /// cannot be read or written.
    pub fn create(&self, input: &PoiInput) -> Result<PointOfInterest, LocationStoreError> {
        let valid = input.validate()?;

        let poi = self.mutate(|pois| {
            let poi = valid.into_poi(next_id(pois)?);
            pois.push(poi.clone());
            Ok(poi)
        })?;

        info!("created point of interest {} ({})", poi.id, poi.name);
        Ok(poi)
    }

    /// Replace the name and position of record `id`, keeping its identifier.
    ///
    /// Existence is checked before the input so that a missing record is
    /// reported as such even when the input is also bad.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::NotFound`] when no record has that id,
    /// [`LocationStoreError::Validation`] for rejected input and
    /// [`LocationStoreError::Persistence`] when the collection cannot be read
    /// or written.
    pub fn update(&self, id: u64, input: &PoiInput) -> Result<PointOfInterest, LocationStoreError> {
        let updated = self.mutate(|pois| {
            let slot = pois
                .iter_mut()
                .find(|poi| poi.id == id)
                .ok_or(LocationStoreError::NotFound { id })?;

            let valid = input.validate()?;
            slot.name = valid.name;
            slot.location = valid.location;
            Ok(slot.clone())
        })?;

        info!("updated point of interest {id}");
        Ok(updated)
    }

    /// Remove record `id`, leaving every other record untouched.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::NotFound`] when no record has that id and
    /// [`LocationStoreError::Persistence`] when the collection cannot be read
    /// or written.
    pub fn delete(&self, id: u64) -> Result<(), LocationStoreError> {
        self.mutate(|pois| {
            let before = pois.len();
            pois.retain(|poi| poi.id != id);
            if pois.len() == before {
                return Err(LocationStoreError::NotFound { id });
            }
            Ok(())
        })?;

        info!("deleted point of interest {id}");
        Ok(())
    }

    /// Records within `max_distance` kilometres of the query point, inclusive,
    /// in storage order.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::Validation`] when a query parameter is
    /// missing or not a number.
    pub fn find_nearby(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<PointOfInterest>, LocationStoreError> {
        Ok(self
            .find_nearby_with_distance(query)?
            .into_iter()
            .map(|(poi, _)| poi)
            .collect())
    }

    /// Like [`find_nearby`](Self::find_nearby), pairing each record with its
    /// distance from the query point in kilometres.
    ///
    /// # Errors
    /// Returns [`LocationStoreError::Validation`] when a query parameter is
    /// missing or not a number.
    pub fn find_nearby_with_distance(
        &self,
        query: &NearbyQuery,
    ) -> Result<Vec<(PointOfInterest, f64)>, LocationStoreError> {
        let params = query.validate()?;
        let matches: Vec<_> = self
            .repository
            .load_all()
            .into_iter()
            .filter_map(|poi| {
                let distance = haversine_km(params.origin, poi.location);
                (distance <= params.max_distance_km).then_some((poi, distance))
            })
            .collect();

        debug!(
            "{} points of interest within {} km of ({}, {})",
            matches.len(),
            params.max_distance_km,
            params.origin.y,
            params.origin.x
        );
        Ok(matches)
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a poisoned lock is still usable.
        self.write_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one load-modify-save cycle inside a repository write session.
    ///
    /// The in-process gate orders callers sharing this store; the session
    /// orders them against other stores and processes using the same
    /// backing storage. An error from `change` abandons the session without
    /// writing.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<PointOfInterest>) -> Result<T, LocationStoreError>,
    ) -> Result<T, LocationStoreError> {
        let _gate = self.lock_writes();
        let session = self.repository.begin_write()?;
        let mut pois = session.load()?;
        let outcome = change(&mut pois)?;
        session.commit(&pois).map_err(|err| {
            warn!("failed to persist points of interest: {err}");
            LocationStoreError::Persistence(err)
        })?;
        Ok(outcome)
    }
}

fn next_id(pois: &[PointOfInterest]) -> Result<u64, LocationStoreError> {
    pois.iter().map(|poi| poi.id).max().map_or(Ok(1), |max_id| {
        max_id
            .checked_add(1)
            .ok_or(LocationStoreError::IdSpaceExhausted { max_id })
    })
}
