//! Core domain types for the Locus location store.
//!
//! The crate owns the [`PointOfInterest`] record, the parsing and validation
//! of loosely typed caller input, great-circle distance, the
//! [`PoiRepository`] persistence boundary and the [`LocationStore`] that ties
//! them together. Storage backends live under [`store`] and are selected with
//! feature flags.
//!
//! # Examples
//!
//! ```
//! use locus_core::{LocationStore, MemoryRepository, NearbyQuery, PoiInput};
//!
//! # fn main() -> Result<(), locus_core::LocationStoreError> {
//! let store = LocationStore::new(MemoryRepository::default());
//! let museum = store.create(&PoiInput::new("Museum", 10.0, 20.0))?;
//! assert_eq!(museum.id, 1);
//!
//! let nearby = store.find_nearby(&NearbyQuery::new(10.0, 20.0, 5.0))?;
//! assert_eq!(nearby, vec![museum]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod distance;
mod error;
mod input;
mod location_store;
mod poi;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use error::{LocationStoreError, LocationStoreErrorKind, ValidationError};
pub use input::{LooseNumber, NearbyQuery, NearbyQueryParams, PoiInput, ValidPoi};
pub use location_store::LocationStore;
pub use poi::PointOfInterest;
pub use store::{MemoryRepository, PersistenceError, PoiRepository, WriteSession};

#[cfg(feature = "store-json")]
pub use store::JsonFileRepository;
#[cfg(feature = "store-sqlite")]
pub use store::SqliteRepository;
