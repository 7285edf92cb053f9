//! Facade crate for the locus point of interest store.
//!
//! This crate re-exports the core domain types and exposes the persistence
//! adapters behind feature flags.

#![forbid(unsafe_code)]

pub use locus_core::{
    EARTH_RADIUS_KM, LocationStore, LocationStoreError, LocationStoreErrorKind, LooseNumber,
    MemoryRepository, NearbyQuery, NearbyQueryParams, PersistenceError, PoiInput, PoiRepository,
    PointOfInterest, ValidPoi, ValidationError, WriteSession, haversine_km,
};

#[cfg(feature = "store-json")]
pub use locus_core::JsonFileRepository;

#[cfg(feature = "store-sqlite")]
pub use locus_core::SqliteRepository;

#[cfg(feature = "test-support")]
pub use locus_core::test_support;
