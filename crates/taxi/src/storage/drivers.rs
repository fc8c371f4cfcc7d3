//! Driver persistence.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use super::Storage;
use crate::error::Result;
use crate::forms::DriverForm;
use crate::model::{Driver, DriverDetail};
use crate::query::{ListQuery, Page, PageRequest};

const SELECT_DRIVER: &str = r"
    SELECT id, username, first_name, last_name, license_number, date_joined
    FROM drivers
";

impl Storage {
    /// Insert a driver with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when the
    /// username is already taken.
    pub fn insert_driver(&self, form: &DriverForm, password_hash: &str) -> Result<Driver> {
        let date_joined = Utc::now();
        self.conn.execute(
            r"
            INSERT INTO drivers
                (username, password_hash, first_name, last_name, license_number, date_joined)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                form.username,
                password_hash,
                form.first_name,
                form.last_name,
                form.license_number,
                date_joined.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted driver with id {}", id);
        Ok(Driver {
            id,
            username: form.username.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            license_number: form.license_number.clone(),
            date_joined,
        })
    }

    /// Get a driver by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_driver(&self, id: i64) -> Result<Option<Driver>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_DRIVER} WHERE id = ?1"),
                [id],
                Self::row_to_driver,
            )
            .optional()?;
        Ok(result)
    }

    /// Get a driver with the cars they drive.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_driver_detail(&self, id: i64) -> Result<Option<DriverDetail>> {
        let Some(driver) = self.get_driver(id)? else {
            return Ok(None);
        };
        let cars = self.cars_for_driver(id)?;
        Ok(Some(DriverDetail { driver, cars }))
    }

    /// Look up a driver together with their password hash, by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn driver_credentials(&self, username: &str) -> Result<Option<(Driver, String)>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, username, first_name, last_name, license_number, date_joined,
                       password_hash
                FROM drivers WHERE username = ?1
                ",
                [username],
                |row| Ok((Self::row_to_driver(row)?, row.get::<_, String>(6)?)),
            )
            .optional()?;
        Ok(result)
    }

    /// Check whether a username is taken by a driver other than `except_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn username_taken(&self, username: &str, except_id: Option<i64>) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM drivers WHERE username = ?1 AND (?2 IS NULL OR id != ?2)",
            params![username, except_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Return the ids from `ids` that do not belong to any driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn missing_driver_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM drivers WHERE id = ?1")?;
        let mut missing = Vec::new();
        for &id in ids {
            let count: i64 = stmt.query_row([id], |row| row.get(0))?;
            if count == 0 {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    /// Replace a driver's profile fields. The password is left unchanged.
    ///
    /// Returns the updated record, or `None` if no driver has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_driver(&self, id: i64, form: &DriverForm) -> Result<Option<Driver>> {
        let affected = self.conn.execute(
            r"
            UPDATE drivers
            SET username = ?1, first_name = ?2, last_name = ?3, license_number = ?4
            WHERE id = ?5
            ",
            params![
                form.username,
                form.first_name,
                form.last_name,
                form.license_number,
                id
            ],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        debug!("Updated driver {}", id);
        self.get_driver(id)
    }

    /// Change only a driver's license number.
    ///
    /// Returns the updated record, or `None` if no driver has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_license_number(&self, id: i64, license_number: &str) -> Result<Option<Driver>> {
        let affected = self.conn.execute(
            "UPDATE drivers SET license_number = ?1 WHERE id = ?2",
            params![license_number, id],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        debug!("Updated license number for driver {}", id);
        self.get_driver(id)
    }

    /// Delete a driver and their association rows. Cars are kept.
    ///
    /// Returns `true` if a driver was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_driver(&self, id: i64) -> Result<bool> {
        let tx = self.transaction()?;
        let unassigned = tx.execute("DELETE FROM cars_drivers WHERE driver_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM drivers WHERE id = ?1", [id])?;
        tx.commit()?;
        if affected > 0 {
            debug!("Deleted driver {} and {} car assignment(s)", id, unassigned);
        }
        Ok(affected > 0)
    }

    /// List drivers in creation order, filtered by a username substring.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_drivers(&self, query: &ListQuery, page_size: usize) -> Result<Page<Driver>> {
        let term = query.term();
        self.fetch_page(
            r"
            SELECT COUNT(*) FROM drivers
            WHERE ?1 IS NULL OR contains_ci(username, ?1)
            ",
            r"
            SELECT id, username, first_name, last_name, license_number, date_joined
            FROM drivers
            WHERE ?1 IS NULL OR contains_ci(username, ?1)
            ORDER BY id ASC
            LIMIT ?2 OFFSET ?3
            ",
            term,
            PageRequest::new(query.page_number(), page_size),
            Self::row_to_driver,
        )
    }

    /// Drivers assigned to a car, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn drivers_for_car(&self, car_id: i64) -> Result<Vec<Driver>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT d.id, d.username, d.first_name, d.last_name, d.license_number, d.date_joined
            FROM drivers d
            JOIN cars_drivers cd ON cd.driver_id = d.id
            WHERE cd.car_id = ?1
            ORDER BY d.id ASC
            ",
        )?;
        let drivers = stmt
            .query_map([car_id], Self::row_to_driver)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(drivers)
    }

    /// Count total drivers in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_drivers(&self) -> Result<i64> {
        self.count_table("drivers")
    }

    fn row_to_driver(row: &rusqlite::Row) -> rusqlite::Result<Driver> {
        let date_joined_str: String = row.get(5)?;
        let date_joined = DateTime::parse_from_rfc3339(&date_joined_str).map_or_else(
            |_| {
                warn!(
                    "Unparseable date_joined: {}, defaulting to now",
                    date_joined_str
                );
                Utc::now()
            },
            |dt| dt.with_timezone(&Utc),
        );

        Ok(Driver {
            id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            license_number: row.get(4)?,
            date_joined,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::forms::DriverForm;
    use crate::query::ListQuery;
    use crate::storage::test_support::*;

    fn usernames(page: &crate::query::Page<crate::model::Driver>) -> Vec<&str> {
        page.iter().map(|d| d.username.as_str()).collect()
    }

    fn seed_search_drivers(storage: &crate::storage::Storage) {
        insert_driver(storage, "driver_one", "AAA12345");
        insert_driver(storage, "driver_two", "AAB12345");
        insert_driver(storage, "another_driver", "ABB12345");
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let created = insert_driver(&storage, "test_driver", "AA123456");

        let fetched = storage.get_driver(created.id).unwrap().unwrap();
        assert_eq!(fetched.username, "test_driver");
        assert_eq!(fetched.license_number, "AA123456");
        assert_eq!(
            fetched.date_joined.timestamp(),
            created.date_joined.timestamp()
        );
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_driver(99999).unwrap().is_none());
        assert!(storage.get_driver_detail(99999).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let storage = create_test_storage();
        insert_driver(&storage, "driver_one", "AAA12345");
        let form = DriverForm {
            username: "driver_one".to_string(),
            license_number: "BBB12345".to_string(),
            ..DriverForm::default()
        };
        assert!(storage.insert_driver(&form, "hash").is_err());
    }

    #[test]
    fn test_username_taken() {
        let storage = create_test_storage();
        let driver = insert_driver(&storage, "driver_one", "AAA12345");

        assert!(storage.username_taken("driver_one", None).unwrap());
        assert!(!storage.username_taken("driver_one", Some(driver.id)).unwrap());
        assert!(!storage.username_taken("driver_two", None).unwrap());
    }

    #[test]
    fn test_credentials() {
        let storage = create_test_storage();
        insert_driver(&storage, "driver_one", "AAA12345");

        let (driver, hash) = storage.driver_credentials("driver_one").unwrap().unwrap();
        assert_eq!(driver.username, "driver_one");
        assert_eq!(hash, "not-a-real-hash");
        assert!(storage.driver_credentials("nobody").unwrap().is_none());
    }

    #[test]
    fn test_missing_driver_ids() {
        let storage = create_test_storage();
        let one = insert_driver(&storage, "driver_one", "AAA12345");

        assert!(storage.missing_driver_ids(&[one.id]).unwrap().is_empty());
        assert_eq!(
            storage.missing_driver_ids(&[one.id, 404, 405]).unwrap(),
            vec![404, 405]
        );
    }

    #[test]
    fn test_update_driver() {
        let storage = create_test_storage();
        let created = insert_driver(&storage, "driver_one", "AAA12345");
        let form = DriverForm {
            username: "renamed".to_string(),
            first_name: "Re".to_string(),
            last_name: "Named".to_string(),
            license_number: "ZZZ99999".to_string(),
        };

        let updated = storage.update_driver(created.id, &form).unwrap().unwrap();
        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.full_name(), "Re Named");
        assert_eq!(updated.license_number, "ZZZ99999");
        assert!(storage
            .update_driver(99999, &form)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_update_license_number() {
        let storage = create_test_storage();
        let created = insert_driver(&storage, "driver_one", "AAA12345");

        let updated = storage
            .update_license_number(created.id, "TES12345")
            .unwrap()
            .unwrap();
        assert_eq!(updated.license_number, "TES12345");
        assert_eq!(updated.username, "driver_one");
        assert!(storage
            .update_license_number(99999, "TES12345")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_driver_keeps_cars() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let one = insert_driver(&storage, "driver_one", "AAA12345");
        let two = insert_driver(&storage, "driver_two", "AAB12345");
        let car = storage
            .insert_car("Camry", toyota.id, &[one.id, two.id])
            .unwrap();

        assert!(storage.delete_driver(one.id).unwrap());
        assert!(storage.get_driver(one.id).unwrap().is_none());

        let drivers = storage.drivers_for_car(car.id).unwrap();
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].id, two.id);
        assert!(storage.get_car(car.id).unwrap().is_some());
        assert!(!storage.delete_driver(one.id).unwrap());
    }

    #[test]
    fn test_list_search_no_query() {
        let storage = create_test_storage();
        seed_search_drivers(&storage);

        let page = storage.list_drivers(&ListQuery::all(), 5).unwrap();
        assert_eq!(usernames(&page), ["driver_one", "driver_two", "another_driver"]);
    }

    #[test]
    fn test_list_search_substring() {
        let storage = create_test_storage();
        seed_search_drivers(&storage);

        let page = storage
            .list_drivers(&ListQuery::search("one"), 5)
            .unwrap();
        assert_eq!(usernames(&page), ["driver_one"]);
    }

    #[test]
    fn test_list_search_exact_match() {
        let storage = create_test_storage();
        seed_search_drivers(&storage);

        let page = storage
            .list_drivers(&ListQuery::search("another_driver"), 5)
            .unwrap();
        assert_eq!(usernames(&page), ["another_driver"]);

        let page = storage
            .list_drivers(&ListQuery::search("nonexistent"), 5)
            .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_list_search_non_ascii_username() {
        let storage = create_test_storage();
        insert_driver(&storage, "Łukasz", "AAA12345");
        insert_driver(&storage, "lukas", "BBB12345");

        let page = storage.list_drivers(&ListQuery::search("łuk"), 5).unwrap();
        assert_eq!(usernames(&page), ["Łukasz"]);
    }

    #[test]
    fn test_list_pagination_creation_order() {
        let storage = create_test_storage();
        for i in 0..6 {
            insert_driver(&storage, &format!("driver.user{i}"), &format!("AAA1234{i}"));
        }

        let page = storage.list_drivers(&ListQuery::all(), 5).unwrap();
        assert_eq!(
            usernames(&page),
            [
                "driver.user0",
                "driver.user1",
                "driver.user2",
                "driver.user3",
                "driver.user4"
            ]
        );
        assert!(page.has_next());
    }

    #[test]
    fn test_driver_detail_lists_cars() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let driver = insert_driver(&storage, "driver_one", "AAA12345");
        storage.insert_car("Camry", toyota.id, &[driver.id]).unwrap();
        storage.insert_car("Corolla", toyota.id, &[]).unwrap();

        let detail = storage.get_driver_detail(driver.id).unwrap().unwrap();
        assert_eq!(detail.cars.len(), 1);
        assert_eq!(detail.cars[0].model, "Camry");
        assert_eq!(detail.cars[0].manufacturer.name, "Toyota");
    }
}
