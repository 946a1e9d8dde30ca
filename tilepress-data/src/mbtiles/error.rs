use std::io;

use camino::Utf8PathBuf;
use rusqlite::Error as SqliteError;
use thiserror::Error;
use tilepress_core::TileCoord;

use crate::ErrorKind;

/// Errors raised while writing an MBTiles container.
#[derive(Debug, Error)]
pub enum PersistTilesError {
    /// The output's parent directory could not be created.
    #[error("failed to create directory for {path}")]
    CreateDirectory {
        /// Output file whose parent was being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// SQLite could not open the output file.
    #[error("failed to open MBTiles database at {path}")]
    Open {
        /// Output file.
        path: Utf8PathBuf,
        /// Underlying SQLite error.
        #[source]
        source: SqliteError,
    },
    /// A statement failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// What was being attempted.
        operation: &'static str,
        /// Underlying SQLite error.
        #[source]
        source: SqliteError,
    },
    /// The `json` metadata row could not be serialized.
    #[error("failed to serialize layer statistics")]
    SerializeMetadata {
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
    /// A tile address lies outside the grid of its zoom level.
    #[error("tile {tile} lies outside the tile grid")]
    CoordinateOutOfRange {
        /// Offending address.
        tile: TileCoord,
    },
}

impl PersistTilesError {
    /// Broad failure class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CoordinateOutOfRange { .. } => ErrorKind::Validation,
            Self::CreateDirectory { .. }
            | Self::Open { .. }
            | Self::Sqlite { .. }
            | Self::SerializeMetadata { .. } => ErrorKind::Persistence,
        }
    }
}
