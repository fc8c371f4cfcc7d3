//! Storage layer for taxi.
//!
//! This module provides `SQLite`-based persistent storage for manufacturers,
//! drivers, cars, and the driver-car association. Per-entity operations live
//! in the `manufacturers`, `drivers` and `cars` submodules as `impl Storage`
//! blocks.

mod cars;
mod drivers;
mod manufacturers;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row, ToSql, Transaction};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::FleetCounts;
use crate::query::{contains_ignore_case, Page, PageRequest, SEARCH_FUNCTION};

/// Storage engine for fleet records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - CRUD for manufacturers, drivers and cars
/// - Case-insensitive substring search with pagination
/// - Explicit driver-car association rows
/// - Foreign-key enforcement of car-manufacturer references
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&conn)?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Live record counts for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn counts(&self) -> Result<FleetCounts> {
        Ok(FleetCounts {
            num_drivers: self.count_drivers()?,
            num_cars: self.count_cars()?,
            num_manufacturers: self.count_manufacturers()?,
        })
    }

    /// Begin a transaction on the shared connection.
    fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Count rows of `table` (a trusted, compile-time name).
    fn count_table(&self, table: &str) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    /// Run a filtered count and a filtered page query and assemble a [`Page`].
    ///
    /// `count_sql` binds the optional pattern as `?1`; `select_sql` binds the
    /// pattern as `?1`, the limit as `?2` and the offset as `?3`.
    fn fetch_page<T>(
        &self,
        count_sql: &str,
        select_sql: &str,
        pattern: Option<&str>,
        request: PageRequest,
        map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Page<T>> {
        let total: i64 = self.conn.query_row(count_sql, [&pattern], |row| row.get(0))?;

        let limit = request.limit();
        let offset = request.offset();
        let params: [&dyn ToSql; 3] = [&pattern, &limit, &offset];
        let mut stmt = self.conn.prepare(select_sql)?;
        let items = stmt
            .query_map(params.as_slice(), map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total_count = usize::try_from(total).unwrap_or(0);
        debug!(
            "Fetched page {} ({} of {} records)",
            request.number,
            items.len(),
            total_count
        );
        Ok(Page::new(items, request, total_count))
    }
}

/// Register the SQL functions the list queries filter with.
///
/// `contains_ci(haystack, needle)` is true when `needle` occurs in `haystack`
/// ignoring case, Unicode included. A NULL argument never matches.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        SEARCH_FUNCTION,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: Option<String> = ctx.get(1)?;
            Ok(match (haystack, needle) {
                (Some(haystack), Some(needle)) => contains_ignore_case(&haystack, &needle),
                _ => false,
            })
        },
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Storage;
    use crate::model::{Driver, Manufacturer};

    pub fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    pub fn insert_manufacturer(storage: &Storage, name: &str, country: &str) -> Manufacturer {
        storage
            .insert_manufacturer(name, country)
            .expect("failed to insert manufacturer")
    }

    pub fn insert_driver(storage: &Storage, username: &str, license_number: &str) -> Driver {
        storage
            .insert_driver(
                &crate::forms::DriverForm {
                    username: username.to_string(),
                    first_name: String::new(),
                    last_name: String::new(),
                    license_number: license_number.to_string(),
                },
                "not-a-real-hash",
            )
            .expect("failed to insert driver")
    }
}
