//! JSON document repository.
//!
//! The collection lives in one file as a pretty-printed array of
//! `{id, name, latitude, longitude}` objects, rewritten in full on every save.
//! Writers exclude one another through an advisory lock on a sibling
//! `<document>.lock` file, so separate processes sharing the document
//! serialize their read-modify-write cycles.

use camino::{Utf8Path, Utf8PathBuf};
use locus_fs::FileLock;
use log::debug;

use crate::PointOfInterest;

use super::{PersistenceError, PoiRepository, WriteSession};

/// Repository persisting the collection as a single JSON document.
///
/// Saves stage the document next to the target and rename it into place, so
/// the file on disk is always either the old or the new collection. A missing
/// file reads as an empty collection.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: Utf8PathBuf,
}

impl JsonFileRepository {
    /// Use the document at `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Location of the advisory lock file guarding writes.
    #[must_use]
    pub fn lock_path(&self) -> Utf8PathBuf {
        let mut lock_path = self.path.clone().into_string();
        lock_path.push_str(".lock");
        Utf8PathBuf::from(lock_path)
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

struct JsonSession<'a> {
    repository: &'a JsonFileRepository,
    _lock: FileLock,
}

impl WriteSession for JsonSession<'_> {
    fn load(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        self.repository.try_load_all()
    }

    fn commit(self: Box<Self>, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        self.repository.save_all(pois)
    }
}

impl PoiRepository for JsonFileRepository {
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        let lock_path = self.lock_path();
        let lock = locus_fs::lock_exclusive(&lock_path)
            .map_err(|source| PersistenceError::Lock {
                path: lock_path.clone(),
                source,
            })?;
        debug!("holding write lock {lock_path}");
        Ok(Box::new(JsonSession {
            repository: self,
            _lock: lock,
        }))
    }

    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        let document = match locus_fs::read_to_string(&self.path) {
            Ok(document) => document,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!("no document at {}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&document).map_err(|source| PersistenceError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        let payload =
            serde_json::to_vec_pretty(pois).map_err(|source| PersistenceError::Encode {
                path: self.path.clone(),
                source,
            })?;
        locus_fs::ensure_parent_dir(&self.path).map_err(|source| {
            PersistenceError::CreateParent {
                path: self.path.clone(),
                source,
            }
        })?;
        locus_fs::write_atomic(&self.path, &payload).map_err(|source| self.io_error(source))?;
        debug!("wrote {} points of interest to {}", pois.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn document_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("data").join("locations.json"))
            .expect("utf8 temp path")
    }

    fn sample_pois() -> Vec<PointOfInterest> {
        vec![
            PointOfInterest::from_degrees(2, "Museum", 10.0, 20.0),
            PointOfInterest::from_degrees(1, "Harbour", 30.5, 40.25),
        ]
    }

    #[rstest]
    fn missing_document_reads_as_empty(temp_dir: TempDir) {
        let repository = JsonFileRepository::new(document_path(&temp_dir));
        assert!(repository.try_load_all().expect("load").is_empty());
    }

    #[rstest]
    fn round_trips_in_storage_order(temp_dir: TempDir) {
        let repository = JsonFileRepository::new(document_path(&temp_dir));
        repository.save_all(&sample_pois()).expect("save");
        assert_eq!(repository.try_load_all().expect("load"), sample_pois());
    }

    #[rstest]
    fn writes_the_documented_shape(temp_dir: TempDir) {
        let path = document_path(&temp_dir);
        let repository = JsonFileRepository::new(path.clone());
        repository
            .save_all(&sample_pois()[..1])
            .expect("save single poi");

        let written = std::fs::read_to_string(path.as_std_path()).expect("read document");
        let expected = "[\n  {\n    \"id\": 2,\n    \"name\": \"Museum\",\n    \
                        \"latitude\": 10.0,\n    \"longitude\": 20.0\n  }\n]";
        assert_eq!(written, expected);
    }

    #[rstest]
    fn separate_handles_serialize_their_writes(temp_dir: TempDir) {
        let path = document_path(&temp_dir);
        std::thread::scope(|scope| {
            for n in 0..8_u64 {
                let path = path.clone();
                scope.spawn(move || {
                    let repository = JsonFileRepository::new(path);
                    let session = repository.begin_write().expect("begin session");
                    let mut pois = session.load().expect("load");
                    pois.push(PointOfInterest::from_degrees(n, "p", 0.0, 0.0));
                    session.commit(&pois).expect("commit");
                });
            }
        });
        let stored = JsonFileRepository::new(path).try_load_all().expect("load");
        assert_eq!(stored.len(), 8);
    }

    #[rstest]
    fn lock_file_sits_beside_the_document(temp_dir: TempDir) {
        let repository = JsonFileRepository::new(document_path(&temp_dir));
        assert_eq!(
            repository.lock_path(),
            document_path(&temp_dir).with_file_name("locations.json.lock")
        );
        drop(repository.begin_write().expect("begin session"));
        assert!(repository.lock_path().as_std_path().is_file());
    }

    #[rstest]
    fn corrupt_document_fails_try_load_and_degrades_load(temp_dir: TempDir) {
        let path = document_path(&temp_dir);
        locus_fs::write_atomic(&path, b"{not json").expect("write corrupt document");
        let repository = JsonFileRepository::new(path);

        let err = repository.try_load_all().expect_err("corrupt document");
        assert!(matches!(err, PersistenceError::Decode { .. }));
        assert!(repository.load_all().is_empty());
    }

    #[rstest]
    fn save_into_a_file_parent_reports_the_path(temp_dir: TempDir) {
        let blocker = Utf8PathBuf::from_path_buf(temp_dir.path().join("blocker"))
            .expect("utf8 temp path");
        std::fs::write(blocker.as_std_path(), b"not a directory").expect("write blocker");
        let repository = JsonFileRepository::new(blocker.join("locations.json"));

        let err = repository
            .save_all(&sample_pois())
            .expect_err("parent is a file");
        assert!(matches!(
            err,
            PersistenceError::CreateParent { ref path, .. } | PersistenceError::Io { ref path, .. }
                if path.as_str().ends_with("locations.json")
        ));
    }
}
