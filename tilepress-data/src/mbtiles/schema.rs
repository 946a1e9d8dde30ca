//! Table layout of an MBTiles 1.3 container.

use rusqlite::{Connection, Transaction};

use super::error::PersistTilesError;

/// `application_id` registered for MBTiles files ("MPBX").
pub const MBTILES_APPLICATION_ID: i32 = 0x4d50_4258;

/// Create the `metadata` and `tiles` tables and their unique indexes.
///
/// Safe to run against a file that already holds the schema.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use tilepress_data::mbtiles::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create MBTiles schema");
/// initialise_schema(&mut conn).expect("schema creation is repeatable");
///
/// let tables: i64 = conn
///     .query_row(
///         "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('metadata', 'tiles')",
///         [],
///         |row| row.get(0),
///     )
///     .expect("count tables");
/// assert_eq!(tables, 2);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), PersistTilesError> {
    connection
        .pragma_update(None, "application_id", MBTILES_APPLICATION_ID)
        .map_err(|source| PersistTilesError::Sqlite {
            operation: "set application id",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistTilesError::Sqlite {
            operation: "begin schema transaction",
            source,
        })?;

    run_schema_step(
        &transaction,
        "create metadata table",
        "CREATE TABLE IF NOT EXISTS metadata (name TEXT, value TEXT)",
    )?;
    run_schema_step(
        &transaction,
        "index metadata",
        "CREATE UNIQUE INDEX IF NOT EXISTS name ON metadata (name)",
    )?;
    run_schema_step(
        &transaction,
        "create tiles table",
        "CREATE TABLE IF NOT EXISTS tiles (
            zoom_level INTEGER,
            tile_column INTEGER,
            tile_row INTEGER,
            tile_data BLOB
        )",
    )?;
    run_schema_step(
        &transaction,
        "index tiles",
        "CREATE UNIQUE INDEX IF NOT EXISTS tile_index
            ON tiles (zoom_level, tile_column, tile_row)",
    )?;

    transaction
        .commit()
        .map_err(|source| PersistTilesError::Sqlite {
            operation: "commit schema transaction",
            source,
        })
}

fn run_schema_step(
    transaction: &Transaction<'_>,
    operation: &'static str,
    sql: &str,
) -> Result<(), PersistTilesError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| PersistTilesError::Sqlite { operation, source })
}
