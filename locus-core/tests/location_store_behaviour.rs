//! Behavioural tests for `LocationStore` over a JSON document using rstest-bdd.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use locus_core::{
    JsonFileRepository, LocationStore, LocationStoreError, NearbyQuery, PoiInput, PointOfInterest,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Shared state for location store scenarios.
struct LocationStoreWorld {
    temp_dir: TempDir,
    store: RefCell<Option<LocationStore<JsonFileRepository>>>,
    created: RefCell<Option<PointOfInterest>>,
    found: RefCell<Vec<PointOfInterest>>,
    error: RefCell<Option<LocationStoreError>>,
}

impl LocationStoreWorld {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
            store: RefCell::new(None),
            created: RefCell::new(None),
            found: RefCell::new(Vec::new()),
            error: RefCell::new(None),
        }
    }

    fn document_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.temp_dir.path().join("data").join("locations.json"))
            .expect("utf8 temp path")
    }

    fn open(&self) {
        let repository = JsonFileRepository::new(self.document_path());
        self.store.replace(Some(LocationStore::new(repository)));
    }

    fn with_store<T>(&self, action: impl FnOnce(&LocationStore<JsonFileRepository>) -> T) -> T {
        let borrowed = self.store.borrow();
        let store = borrowed
            .as_ref()
            .expect("store should be opened before use");
        action(store)
    }

    fn record_error<T>(&self, outcome: Result<T, LocationStoreError>) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.error.replace(None);
                Some(value)
            }
            Err(err) => {
                self.error.replace(Some(err));
                None
            }
        }
    }
}

#[fixture]
fn world() -> LocationStoreWorld {
    LocationStoreWorld::new()
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

#[given("an empty location store backed by a JSON document")]
fn given_empty_store(world: &LocationStoreWorld) {
    world.open();
}

#[given("a location store with records A at 10, 20 and B at 30, 40")]
fn given_seeded_store(world: &LocationStoreWorld) {
    world.open();
    world.with_store(|store| {
        store
            .create(&PoiInput::new("A", 10, 20))
            .expect("create A");
        store
            .create(&PoiInput::new("B", 30, 40))
            .expect("create B");
    });
}

#[when("I create a record named {name} at latitude {latitude} and longitude {longitude}")]
fn when_create(world: &LocationStoreWorld, name: String, latitude: String, longitude: String) {
    let input = PoiInput::new(name, latitude, longitude);
    let outcome = world.with_store(|store| store.create(&input));
    let created = world.record_error(outcome);
    world.created.replace(created);
}

#[when("I search within {radius} km of latitude {latitude} and longitude {longitude}")]
fn when_search(world: &LocationStoreWorld, radius: String, latitude: String, longitude: String) {
    let query = NearbyQuery::new(latitude, longitude, radius);
    let outcome = world.with_store(|store| store.find_nearby(&query));
    let found = world.record_error(outcome).unwrap_or_default();
    world.found.replace(found);
}

#[when("I delete the record with id {id}")]
fn when_delete(world: &LocationStoreWorld, id: u64) {
    let outcome = world.with_store(|store| store.delete(id));
    world.record_error(outcome);
}

#[when("I update record {id} to be named {name} at latitude {latitude} and longitude {longitude}")]
fn when_update(
    world: &LocationStoreWorld,
    id: u64,
    name: String,
    latitude: String,
    longitude: String,
) {
    let input = PoiInput::new(name, latitude, longitude);
    let outcome = world.with_store(|store| store.update(id, &input));
    world.record_error(outcome);
}

#[when("I reopen the store")]
fn when_reopen(world: &LocationStoreWorld) {
    world.open();
}

#[then("the created record has id {id}")]
fn then_created_id(world: &LocationStoreWorld, id: u64) {
    let created = world.created.borrow();
    let poi = created.as_ref().expect("a record should have been created");
    assert_eq!(poi.id, id);
}

#[then("the store lists {count} records")]
fn then_count(world: &LocationStoreWorld, count: usize) {
    let listed = world.with_store(LocationStore::list_all);
    assert_eq!(listed.len(), count);
}

#[then("the search returns ids {ids}")]
fn then_search_ids(world: &LocationStoreWorld, ids: String) {
    let expected: Vec<u64> = unquote(&ids)
        .split(',')
        .map(|id| id.trim().parse().expect("numeric id"))
        .collect();
    let found: Vec<u64> = world.found.borrow().iter().map(|poi| poi.id).collect();
    assert!(world.error.borrow().is_none(), "unexpected store error");
    assert_eq!(found, expected);
}

#[then("the operation fails with a not found error")]
fn then_not_found(world: &LocationStoreWorld) {
    let error = world.error.borrow();
    assert!(matches!(
        error.as_ref(),
        Some(LocationStoreError::NotFound { .. })
    ));
}

#[then("the operation fails with the message {message}")]
fn then_message(world: &LocationStoreWorld, message: String) {
    let error = world.error.borrow();
    let error = error.as_ref().expect("an error should be recorded");
    assert_eq!(error.to_string(), unquote(&message));
}

#[then("record {id} is named {name} at latitude {latitude} and longitude {longitude}")]
fn then_record(world: &LocationStoreWorld, id: u64, name: String, latitude: f64, longitude: f64) {
    assert!(world.error.borrow().is_none(), "unexpected store error");
    let poi = world
        .with_store(|store| store.get_by_id(id))
        .expect("record should exist");
    assert_eq!(
        poi,
        PointOfInterest::from_degrees(id, name, latitude, longitude)
    );
}

#[scenario(path = "tests/features/location_store.feature", index = 0)]
fn first_record_gets_id_one(world: LocationStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/location_store.feature", index = 1)]
fn zero_radius_matches_exact_position(world: LocationStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/location_store.feature", index = 2)]
fn large_radius_matches_everything(world: LocationStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/location_store.feature", index = 3)]
fn deleting_missing_record_fails(world: LocationStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/location_store.feature", index = 4)]
fn negative_coordinates_rejected(world: LocationStoreWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/location_store.feature", index = 5)]
fn records_survive_reopening(world: LocationStoreWorld) {
    let _ = world;
}
