//! Command-line interface for the locus point of interest store.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use locus_core::{
    JsonFileRepository, LocationStore, LooseNumber, NearbyQuery, PoiInput, PoiRepository,
};
use log::debug;
use serde::Serialize;

mod config;
mod error;

pub use error::CliError;

use config::{Backend, StoreArgs, StoreConfig, StoreLayers};

type DynStore = LocationStore<Box<dyn PoiRepository + Send + Sync>>;

/// Run the locus CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// store rejects the operation, or output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let layers = StoreLayers::load_ambient()?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, layers, &mut stdout)
}

fn run_with(cli: Cli, layers: StoreLayers, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = StoreConfig::resolve(cli.store, layers);
    debug!(
        "using {:?} store at {}",
        config.backend, config.data_file
    );
    let store = open_store(&config)?;
    execute(&store, cli.command, writer)
}

#[derive(Debug, Parser)]
#[command(
    name = "locus",
    about = "Manage and search a persistent collection of points of interest",
    version
)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every point of interest in storage order.
    List,
    /// Print one point of interest.
    Get {
        /// Identifier of the record.
        id: u64,
    },
    /// Add a point of interest and print it with its assigned identifier.
    Create(RecordArgs),
    /// Replace the name and position of an existing point of interest.
    Update {
        /// Identifier of the record.
        id: u64,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Remove a point of interest.
    Delete {
        /// Identifier of the record.
        id: u64,
    },
    /// Print points of interest within a radius of a position.
    Nearby(NearbyArgs),
}

/// Fields of a record, passed through to the store unparsed.
#[derive(Debug, Clone, Default, clap::Args)]
struct RecordArgs {
    /// Display name.
    #[arg(long)]
    name: Option<String>,
    /// Latitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<String>,
    /// Longitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<String>,
}

impl From<RecordArgs> for PoiInput {
    fn from(args: RecordArgs) -> Self {
        Self {
            name: args.name,
            latitude: args.latitude.map(LooseNumber::Text),
            longitude: args.longitude.map(LooseNumber::Text),
        }
    }
}

/// Proximity search parameters, passed through to the store unparsed.
#[derive(Debug, Clone, Default, clap::Args)]
struct NearbyArgs {
    /// Latitude of the search centre.
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<String>,
    /// Longitude of the search centre.
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<String>,
    /// Inclusive search radius in kilometres.
    #[arg(long = "max-distance", allow_hyphen_values = true)]
    max_distance: Option<String>,
}

impl From<NearbyArgs> for NearbyQuery {
    fn from(args: NearbyArgs) -> Self {
        Self {
            latitude: args.latitude.map(LooseNumber::Text),
            longitude: args.longitude.map(LooseNumber::Text),
            max_distance: args.max_distance.map(LooseNumber::Text),
        }
    }
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: u64,
}

fn open_store(config: &StoreConfig) -> Result<DynStore, CliError> {
    let repository: Box<dyn PoiRepository + Send + Sync> = match config.backend {
        Backend::Json => Box::new(JsonFileRepository::new(config.data_file.clone())),
        Backend::Sqlite => open_sqlite(config)?,
    };
    Ok(LocationStore::new(repository))
}

#[cfg(feature = "store-sqlite")]
fn open_sqlite(config: &StoreConfig) -> Result<Box<dyn PoiRepository + Send + Sync>, CliError> {
    locus_fs::ensure_parent_dir(&config.data_file)
        .map_err(|source| {
            CliError::OpenStore(locus_core::PersistenceError::CreateParent {
                path: config.data_file.clone(),
                source,
            })
        })?;
    let repository =
        locus_core::SqliteRepository::open(&config.data_file).map_err(CliError::OpenStore)?;
    Ok(Box::new(repository))
}

#[cfg(not(feature = "store-sqlite"))]
fn open_sqlite(_config: &StoreConfig) -> Result<Box<dyn PoiRepository + Send + Sync>, CliError> {
    Err(CliError::MissingFeature {
        feature: "store-sqlite",
        action: "the sqlite backend",
    })
}

fn execute(store: &DynStore, command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::List => write_json(writer, &store.list_all()),
        Command::Get { id } => write_json(writer, &store.get_by_id(id)?),
        Command::Create(record) => write_json(writer, &store.create(&record.into())?),
        Command::Update { id, record } => write_json(writer, &store.update(id, &record.into())?),
        Command::Delete { id } => {
            store.delete(id)?;
            write_json(writer, &Deleted { deleted: id })
        }
        Command::Nearby(args) => write_json(writer, &store.find_nearby(&args.into())?),
    }
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
