//! Manufacturer persistence.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::Storage;
use crate::error::Result;
use crate::model::Manufacturer;
use crate::query::{ListQuery, Page, PageRequest};

const SELECT_MANUFACTURER: &str = "SELECT id, name, country FROM manufacturers";

impl Storage {
    /// Insert a manufacturer and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_manufacturer(&self, name: &str, country: &str) -> Result<Manufacturer> {
        self.conn.execute(
            "INSERT INTO manufacturers (name, country) VALUES (?1, ?2)",
            params![name, country],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted manufacturer with id {}", id);
        Ok(Manufacturer {
            id,
            name: name.to_string(),
            country: country.to_string(),
        })
    }

    /// Get a manufacturer by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_manufacturer(&self, id: i64) -> Result<Option<Manufacturer>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_MANUFACTURER} WHERE id = ?1"),
                [id],
                Self::row_to_manufacturer,
            )
            .optional()?;
        Ok(result)
    }

    /// Check whether a manufacturer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn manufacturer_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM manufacturers WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Replace a manufacturer's fields.
    ///
    /// Returns the updated record, or `None` if no manufacturer has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_manufacturer(
        &self,
        id: i64,
        name: &str,
        country: &str,
    ) -> Result<Option<Manufacturer>> {
        let affected = self.conn.execute(
            "UPDATE manufacturers SET name = ?1, country = ?2 WHERE id = ?3",
            params![name, country, id],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        debug!("Updated manufacturer {}", id);
        Ok(Some(Manufacturer {
            id,
            name: name.to_string(),
            country: country.to_string(),
        }))
    }

    /// Delete a manufacturer by ID.
    ///
    /// Returns `true` if a manufacturer was deleted, `false` if not found.
    /// Fails with a constraint error while cars still reference it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_manufacturer(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM manufacturers WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count cars that reference a manufacturer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_cars_for_manufacturer(&self, id: i64) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cars WHERE manufacturer_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// List manufacturers ordered by name, filtered by a name substring.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_manufacturers(
        &self,
        query: &ListQuery,
        page_size: usize,
    ) -> Result<Page<Manufacturer>> {
        let term = query.term();
        self.fetch_page(
            r"
            SELECT COUNT(*) FROM manufacturers
            WHERE ?1 IS NULL OR contains_ci(name, ?1)
            ",
            r"
            SELECT id, name, country FROM manufacturers
            WHERE ?1 IS NULL OR contains_ci(name, ?1)
            ORDER BY name ASC, id ASC
            LIMIT ?2 OFFSET ?3
            ",
            term,
            PageRequest::new(query.page_number(), page_size),
            Self::row_to_manufacturer,
        )
    }

    /// Count total manufacturers in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_manufacturers(&self) -> Result<i64> {
        self.count_table("manufacturers")
    }

    pub(super) fn row_to_manufacturer(row: &rusqlite::Row) -> rusqlite::Result<Manufacturer> {
        Ok(Manufacturer {
            id: row.get(0)?,
            name: row.get(1)?,
            country: row.get(2)?,
        })
    }
}
