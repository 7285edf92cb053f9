//! Layered store configuration for the locus CLI.
//!
//! Values resolve in order of precedence: command-line flags, `LOCUS_*`
//! environment variables, the `.locus.toml` configuration file, then the
//! built-in defaults.

use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::CliError;

pub(crate) const DEFAULT_DATA_FILE: &str = "data/locations.json";

/// Persistence backend holding the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Backend {
    /// A single pretty-printed JSON document.
    #[default]
    Json,
    /// A SQLite database file.
    Sqlite,
}

/// Store options accepted on the command line by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct StoreArgs {
    /// Path to the backing data file.
    #[arg(long = "data-file", value_name = "path", global = true)]
    pub(crate) data_file: Option<Utf8PathBuf>,
    /// Persistence backend for the data file.
    #[arg(long, value_enum, global = true)]
    pub(crate) backend: Option<Backend>,
}

/// Store options read from the configuration file and the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LOCUS")]
pub(crate) struct StoreLayers {
    /// Path to the backing data file.
    pub(crate) data_file: Option<Utf8PathBuf>,
    /// Persistence backend for the data file.
    pub(crate) backend: Option<Backend>,
}

impl StoreLayers {
    /// Load the file and environment layers, ignoring process arguments.
    pub(crate) fn load_ambient() -> Result<Self, CliError> {
        Self::load_from_iter([std::ffi::OsString::from("locus")]).map_err(CliError::Configuration)
    }
}

/// Resolved store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreConfig {
    pub(crate) data_file: Utf8PathBuf,
    pub(crate) backend: Backend,
}

impl StoreConfig {
    /// Overlay command-line values on the ambient layers and fill defaults.
    pub(crate) fn resolve(args: StoreArgs, layers: StoreLayers) -> Self {
        Self {
            data_file: args
                .data_file
                .or(layers.data_file)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_FILE)),
            backend: args.backend.or(layers.backend).unwrap_or_default(),
        }
    }
}
