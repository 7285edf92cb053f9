//! SQLite-backed repository for the point of interest collection.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rusqlite::{Connection, params};

use crate::PointOfInterest;

use super::{PersistenceError, PoiRepository, WriteSession};

/// `position` aliases the rowid and records insertion order.
const CREATE_POIS_TABLE: &str = "CREATE TABLE IF NOT EXISTS pois (
    position INTEGER PRIMARY KEY,
    id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
)";

/// How long a connection waits for another writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Repository storing the collection in a SQLite `pois` table.
///
/// Every save deletes and reinserts all rows inside one transaction, so a
/// reader on another connection sees the collection either before or after
/// the save. Write sessions run under `BEGIN IMMEDIATE`, which takes the
/// database write lock before the collection is read; connections in other
/// processes queue behind it for up to [`BUSY_TIMEOUT`].
pub struct SqliteRepository {
    path: Utf8PathBuf,
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteRepository {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    ///
    /// # Errors
    /// Returns [`PersistenceError::OpenDatabase`] when the file cannot be
    /// opened and [`PersistenceError::Database`] when the schema cannot be
    /// created.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, PersistenceError> {
        let db_path = path.as_ref();
        let connection = Connection::open(db_path.as_std_path()).map_err(|source| {
            PersistenceError::OpenDatabase {
                path: db_path.to_path_buf(),
                source,
            }
        })?;
        Self::with_connection(db_path.to_path_buf(), connection)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when SQLite cannot allocate the database
    /// or create the schema.
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let path = Utf8PathBuf::from(":memory:");
        let connection =
            Connection::open_in_memory().map_err(|source| PersistenceError::OpenDatabase {
                path: path.clone(),
                source,
            })?;
        Self::with_connection(path, connection)
    }

    fn with_connection(path: Utf8PathBuf, connection: Connection) -> Result<Self, PersistenceError> {
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| PersistenceError::Database {
                operation: "set busy timeout",
                source,
            })?;
        connection
            .execute(CREATE_POIS_TABLE, [])
            .map_err(|source| PersistenceError::Database {
                operation: "create pois table",
                source,
            })?;
        Ok(Self {
            path,
            connection: Mutex::new(connection),
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-save drops the transaction, which rolls it back.
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_error(source: rusqlite::Error) -> PersistenceError {
    PersistenceError::Database {
        operation: "read poi row",
        source,
    }
}

fn to_row_id(id: u64) -> Result<i64, PersistenceError> {
    i64::try_from(id).map_err(|_| PersistenceError::IdOutOfRange {
        id: i128::from(id),
    })
}

fn from_row_id(id: i64) -> Result<u64, PersistenceError> {
    u64::try_from(id).map_err(|_| PersistenceError::IdOutOfRange {
        id: i128::from(id),
    })
}

fn read_pois(connection: &Connection) -> Result<Vec<PointOfInterest>, PersistenceError> {
    let mut statement = connection
        .prepare_cached("SELECT id, name, latitude, longitude FROM pois ORDER BY position")
        .map_err(|source| PersistenceError::Database {
            operation: "prepare poi query",
            source,
        })?;
    let mut rows = statement
        .query([])
        .map_err(|source| PersistenceError::Database {
            operation: "query pois",
            source,
        })?;

    let mut pois = Vec::new();
    while let Some(row) = rows.next().map_err(read_error)? {
        let id: i64 = row.get(0).map_err(read_error)?;
        let name: String = row.get(1).map_err(read_error)?;
        let latitude: f64 = row.get(2).map_err(read_error)?;
        let longitude: f64 = row.get(3).map_err(read_error)?;
        pois.push(PointOfInterest::from_degrees(
            from_row_id(id)?,
            name,
            latitude,
            longitude,
        ));
    }
    Ok(pois)
}

/// Replace every row. Callers own the surrounding transaction.
fn replace_pois(connection: &Connection, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
    connection
        .execute("DELETE FROM pois", [])
        .map_err(|source| PersistenceError::Database {
            operation: "clear pois",
            source,
        })?;
    let mut insert = connection
        .prepare_cached("INSERT INTO pois (id, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)")
        .map_err(|source| PersistenceError::Database {
            operation: "prepare poi insert",
            source,
        })?;
    for poi in pois {
        insert
            .execute(params![
                to_row_id(poi.id)?,
                poi.name,
                poi.latitude(),
                poi.longitude()
            ])
            .map_err(|source| PersistenceError::Database {
                operation: "insert poi",
                source,
            })?;
    }
    Ok(())
}

/// Write session holding the connection inside an immediate transaction.
struct SqliteSession<'a> {
    connection: MutexGuard<'a, Connection>,
    path: &'a Utf8Path,
    finished: bool,
}

impl WriteSession for SqliteSession<'_> {
    fn load(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        read_pois(&self.connection)
    }

    fn commit(mut self: Box<Self>, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        replace_pois(&self.connection, pois)?;
        self.connection
            .execute_batch("COMMIT")
            .map_err(|source| PersistenceError::Database {
                operation: "commit write session",
                source,
            })?;
        self.finished = true;
        debug!("wrote {} points of interest to {}", pois.len(), self.path);
        Ok(())
    }
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.connection.execute_batch("ROLLBACK") {
            debug!("rollback of abandoned write session on {} failed: {err}", self.path);
        }
    }
}

impl PoiRepository for SqliteRepository {
    fn begin_write(&self) -> Result<Box<dyn WriteSession + '_>, PersistenceError> {
        let connection = self.connection();
        connection
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|source| PersistenceError::Database {
                operation: "begin write session",
                source,
            })?;
        Ok(Box::new(SqliteSession {
            connection,
            path: &self.path,
            finished: false,
        }))
    }

    fn try_load_all(&self) -> Result<Vec<PointOfInterest>, PersistenceError> {
        read_pois(&self.connection())
    }

    fn save_all(&self, pois: &[PointOfInterest]) -> Result<(), PersistenceError> {
        let mut connection = self.connection();
        let transaction =
            connection
                .transaction()
                .map_err(|source| PersistenceError::Database {
                    operation: "begin save transaction",
                    source,
                })?;
        replace_pois(&transaction, pois)?;
        transaction
            .commit()
            .map_err(|source| PersistenceError::Database {
                operation: "commit save transaction",
                source,
            })?;
        debug!("wrote {} points of interest to {}", pois.len(), self.path);
        Ok(())
    }
}
