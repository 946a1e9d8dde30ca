//! Reading and writing tiles in an MBTiles file.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Transaction};
use tilepress_core::TileCoord;

use super::error::PersistTilesError;
use super::metadata::MetadataRow;
use super::schema::initialise_schema;

/// Encoded tile ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTile {
    /// XYZ address of the tile.
    pub coord: TileCoord,
    /// Encoded, possibly compressed, tile bytes.
    pub data: Vec<u8>,
}

/// An MBTiles file opened for writing.
///
/// Rows are upserted, so converting the same input into an existing file
/// replaces its tiles and metadata rather than duplicating them.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use tilepress_core::TileCoord;
/// use tilepress_data::mbtiles::{MetadataRow, OutputTile, TileStore};
///
/// let dir = tempfile::tempdir().expect("create temp dir");
/// let path = Utf8PathBuf::from_path_buf(dir.path().join("out/world.mbtiles"))
///     .expect("utf-8 temp path");
/// let mut store = TileStore::open(&path).expect("open store");
///
/// let mut writer = store.writer().expect("begin writing");
/// writer
///     .put_metadata(&[MetadataRow::new("name", "World")])
///     .expect("write metadata");
/// writer
///     .put_tile(&OutputTile { coord: TileCoord::new(0, 0, 0), data: vec![1, 2, 3] })
///     .expect("write tile");
/// assert_eq!(writer.commit().expect("commit"), 1);
///
/// assert_eq!(store.metadata("name").expect("read row").as_deref(), Some("World"));
/// assert_eq!(store.tile_count().expect("count tiles"), 1);
/// ```
#[derive(Debug)]
pub struct TileStore {
    connection: Connection,
    path: Utf8PathBuf,
}

impl TileStore {
    /// Open or create the file at `path`, creating missing parent
    /// directories and the MBTiles schema.
    pub fn open(path: &Utf8Path) -> Result<Self, PersistTilesError> {
        tilepress_fs::ensure_parent_dir(path).map_err(|source| {
            PersistTilesError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut connection =
            Connection::open(path.as_std_path()).map_err(|source| PersistTilesError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        initialise_schema(&mut connection)?;
        debug!("opened MBTiles store at {path}");
        Ok(Self {
            connection,
            path: path.to_path_buf(),
        })
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Begin a write transaction.
    ///
    /// Nothing is visible to other connections until
    /// [`TileWriter::commit`]; dropping the writer rolls everything back.
    pub fn writer(&mut self) -> Result<TileWriter<'_>, PersistTilesError> {
        let transaction =
            self.connection
                .transaction()
                .map_err(|source| PersistTilesError::Sqlite {
                    operation: "begin tile transaction",
                    source,
                })?;
        Ok(TileWriter {
            transaction,
            tiles_written: 0,
        })
    }

    /// Value of the metadata row called `name`, if present.
    pub fn metadata(&self, name: &str) -> Result<Option<String>, PersistTilesError> {
        self.connection
            .query_row(
                "SELECT value FROM metadata WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "read metadata row",
                source,
            })
    }

    /// Stored bytes of the tile at XYZ address `coord`, if present.
    pub fn tile(&self, coord: TileCoord) -> Result<Option<Vec<u8>>, PersistTilesError> {
        let (zoom, column, row) = tile_key(coord)?;
        self.connection
            .query_row(
                "SELECT tile_data FROM tiles
                    WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                (zoom, column, row),
                |found| found.get(0),
            )
            .optional()
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "read tile",
                source,
            })
    }

    /// Number of stored tiles.
    pub fn tile_count(&self) -> Result<u64, PersistTilesError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "count tiles",
                source,
            })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Open write transaction on a [`TileStore`].
#[derive(Debug)]
pub struct TileWriter<'conn> {
    transaction: Transaction<'conn>,
    tiles_written: u64,
}

impl TileWriter<'_> {
    /// Upsert metadata rows.
    pub fn put_metadata(&mut self, rows: &[MetadataRow]) -> Result<(), PersistTilesError> {
        let mut statement = self
            .transaction
            .prepare_cached("INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)")
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "prepare metadata upsert",
                source,
            })?;
        for row in rows {
            statement
                .execute((row.name.as_str(), row.value.as_str()))
                .map_err(|source| PersistTilesError::Sqlite {
                    operation: "upsert metadata row",
                    source,
                })?;
        }
        Ok(())
    }

    /// Upsert one tile, stored under its TMS row.
    pub fn put_tile(&mut self, tile: &OutputTile) -> Result<(), PersistTilesError> {
        let (zoom, column, row) = tile_key(tile.coord)?;
        let mut statement = self
            .transaction
            .prepare_cached(
                "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data)
                    VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "prepare tile upsert",
                source,
            })?;
        statement
            .execute((zoom, column, row, tile.data.as_slice()))
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "upsert tile",
                source,
            })?;
        self.tiles_written += 1;
        Ok(())
    }

    /// Tiles upserted so far.
    #[must_use]
    pub const fn tiles_written(&self) -> u64 {
        self.tiles_written
    }

    /// Commit every write and return the number of tiles upserted.
    pub fn commit(self) -> Result<u64, PersistTilesError> {
        let Self {
            transaction,
            tiles_written,
        } = self;
        transaction
            .commit()
            .map_err(|source| PersistTilesError::Sqlite {
                operation: "commit tile transaction",
                source,
            })?;
        Ok(tiles_written)
    }
}

/// Primary key of `coord` in the `tiles` table.
fn tile_key(coord: TileCoord) -> Result<(i64, i64, i64), PersistTilesError> {
    if !coord.is_valid() {
        return Err(PersistTilesError::CoordinateOutOfRange { tile: coord });
    }
    Ok((
        i64::from(coord.zoom),
        i64::from(coord.x),
        i64::from(coord.tms_row()),
    ))
}
