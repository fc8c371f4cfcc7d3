//! Car persistence and the driver-car association.

use rusqlite::{params, OptionalExtension, Transaction};
use tracing::debug;

use super::Storage;
use crate::error::{Error, Result};
use crate::model::{Car, CarDetail, Manufacturer};
use crate::query::{ListQuery, Page, PageRequest};

const SELECT_CAR: &str = r"
    SELECT c.id, c.model, m.id, m.name, m.country
    FROM cars c
    JOIN manufacturers m ON m.id = c.manufacturer_id
";

impl Storage {
    /// Insert a car with its initial set of drivers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including when the
    /// manufacturer or any driver does not exist.
    pub fn insert_car(
        &self,
        model: &str,
        manufacturer_id: i64,
        driver_ids: &[i64],
    ) -> Result<Car> {
        let tx = self.transaction()?;
        tx.execute(
            "INSERT INTO cars (model, manufacturer_id) VALUES (?1, ?2)",
            params![model, manufacturer_id],
        )?;
        let id = tx.last_insert_rowid();
        insert_assignments(&tx, id, driver_ids)?;
        tx.commit()?;
        debug!("Inserted car with id {} ({} driver(s))", id, driver_ids.len());

        self.get_car(id)?
            .ok_or_else(|| Error::internal(format!("car {id} missing after insert")))
    }

    /// Get a car with its manufacturer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_car(&self, id: i64) -> Result<Option<Car>> {
        let result = self
            .conn
            .query_row(
                &format!("{SELECT_CAR} WHERE c.id = ?1"),
                [id],
                Self::row_to_car,
            )
            .optional()?;
        Ok(result)
    }

    /// Get a car with its manufacturer and drivers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_car_detail(&self, id: i64) -> Result<Option<CarDetail>> {
        let Some(car) = self.get_car(id)? else {
            return Ok(None);
        };
        let drivers = self.drivers_for_car(id)?;
        Ok(Some(CarDetail { car, drivers }))
    }

    /// Replace a car's model, manufacturer and complete driver set.
    ///
    /// Returns the updated record, or `None` if no car has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_car(
        &self,
        id: i64,
        model: &str,
        manufacturer_id: i64,
        driver_ids: &[i64],
    ) -> Result<Option<Car>> {
        let tx = self.transaction()?;
        let affected = tx.execute(
            "UPDATE cars SET model = ?1, manufacturer_id = ?2 WHERE id = ?3",
            params![model, manufacturer_id, id],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        tx.execute("DELETE FROM cars_drivers WHERE car_id = ?1", [id])?;
        insert_assignments(&tx, id, driver_ids)?;
        tx.commit()?;
        debug!("Updated car {} ({} driver(s))", id, driver_ids.len());
        self.get_car(id)
    }

    /// Delete a car and its association rows. Drivers are kept.
    ///
    /// Returns `true` if a car was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_car(&self, id: i64) -> Result<bool> {
        let tx = self.transaction()?;
        tx.execute("DELETE FROM cars_drivers WHERE car_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM cars WHERE id = ?1", [id])?;
        tx.commit()?;
        if affected > 0 {
            debug!("Deleted car {}", id);
        }
        Ok(affected > 0)
    }

    /// List cars in creation order, filtered by a model substring.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_cars(&self, query: &ListQuery, page_size: usize) -> Result<Page<Car>> {
        let term = query.term();
        self.fetch_page(
            r"
            SELECT COUNT(*) FROM cars
            WHERE ?1 IS NULL OR contains_ci(model, ?1)
            ",
            r"
            SELECT c.id, c.model, m.id, m.name, m.country
            FROM cars c
            JOIN manufacturers m ON m.id = c.manufacturer_id
            WHERE ?1 IS NULL OR contains_ci(c.model, ?1)
            ORDER BY c.id ASC
            LIMIT ?2 OFFSET ?3
            ",
            term,
            PageRequest::new(query.page_number(), page_size),
            Self::row_to_car,
        )
    }

    /// Cars a driver is assigned to, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cars_for_driver(&self, driver_id: i64) -> Result<Vec<Car>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT c.id, c.model, m.id, m.name, m.country
            FROM cars c
            JOIN manufacturers m ON m.id = c.manufacturer_id
            JOIN cars_drivers cd ON cd.car_id = c.id
            WHERE cd.driver_id = ?1
            ORDER BY c.id ASC
            ",
        )?;
        let cars = stmt
            .query_map([driver_id], Self::row_to_car)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cars)
    }

    /// Check whether a driver is assigned to a car.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn is_assigned(&self, car_id: i64, driver_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cars_drivers WHERE car_id = ?1 AND driver_id = ?2",
            params![car_id, driver_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Add a driver to a car. Adding an existing assignment is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn assign_driver(&self, car_id: i64, driver_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO cars_drivers (car_id, driver_id) VALUES (?1, ?2)",
            params![car_id, driver_id],
        )?;
        debug!("Assigned driver {} to car {}", driver_id, car_id);
        Ok(())
    }

    /// Remove a driver from a car. Removing a missing assignment is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn unassign_driver(&self, car_id: i64, driver_id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM cars_drivers WHERE car_id = ?1 AND driver_id = ?2",
            params![car_id, driver_id],
        )?;
        debug!("Unassigned driver {} from car {}", driver_id, car_id);
        Ok(())
    }

    /// Count total cars in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_cars(&self) -> Result<i64> {
        self.count_table("cars")
    }

    fn row_to_car(row: &rusqlite::Row) -> rusqlite::Result<Car> {
        Ok(Car {
            id: row.get(0)?,
            model: row.get(1)?,
            manufacturer: Manufacturer {
                id: row.get(2)?,
                name: row.get(3)?,
                country: row.get(4)?,
            },
        })
    }
}

fn insert_assignments(tx: &Transaction<'_>, car_id: i64, driver_ids: &[i64]) -> Result<()> {
    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO cars_drivers (car_id, driver_id) VALUES (?1, ?2)")?;
    for driver_id in driver_ids {
        stmt.execute(params![car_id, driver_id])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::query::ListQuery;
    use crate::storage::test_support::*;

    fn models(page: &crate::query::Page<crate::model::Car>) -> Vec<&str> {
        page.iter().map(|c| c.model.as_str()).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");

        let car = storage.insert_car("Camry", toyota.id, &[]).unwrap();
        assert_eq!(car.model, "Camry");
        assert_eq!(car.manufacturer, toyota);
        assert_eq!(storage.get_car(car.id).unwrap().unwrap(), car);
    }

    #[test]
    fn test_insert_unknown_manufacturer_fails() {
        let storage = create_test_storage();
        assert!(storage.insert_car("Ghost", 999, &[]).is_err());
        assert_eq!(storage.count_cars().unwrap(), 0);
    }

    #[test]
    fn test_insert_unknown_driver_rolls_back() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");

        assert!(storage.insert_car("Camry", toyota.id, &[404]).is_err());
        assert_eq!(storage.count_cars().unwrap(), 0);
    }

    #[test]
    fn test_detail_lists_drivers() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let one = insert_driver(&storage, "driver_one", "AAA12345");
        let two = insert_driver(&storage, "driver_two", "AAB12345");
        let car = storage
            .insert_car("Camry", toyota.id, &[two.id, one.id, one.id])
            .unwrap();

        let detail = storage.get_car_detail(car.id).unwrap().unwrap();
        let ids: Vec<i64> = detail.drivers.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![one.id, two.id]);
        assert!(detail.is_driven_by(one.id));
        assert!(storage.get_car_detail(99999).unwrap().is_none());
    }

    #[test]
    fn test_update_replaces_drivers() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let honda = insert_manufacturer(&storage, "Honda", "Japan");
        let one = insert_driver(&storage, "driver_one", "AAA12345");
        let two = insert_driver(&storage, "driver_two", "AAB12345");
        let car = storage.insert_car("Camry", toyota.id, &[one.id]).unwrap();

        let updated = storage
            .update_car(car.id, "Civic", honda.id, &[two.id])
            .unwrap()
            .unwrap();
        assert_eq!(updated.model, "Civic");
        assert_eq!(updated.manufacturer.name, "Honda");
        assert!(!storage.is_assigned(car.id, one.id).unwrap());
        assert!(storage.is_assigned(car.id, two.id).unwrap());
    }

    #[test]
    fn test_update_nonexistent() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        assert!(storage
            .update_car(99999, "Camry", toyota.id, &[])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_keeps_drivers() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let driver = insert_driver(&storage, "driver_one", "AAA12345");
        let car = storage.insert_car("Camry", toyota.id, &[driver.id]).unwrap();

        assert!(storage.delete_car(car.id).unwrap());
        assert!(storage.get_car(car.id).unwrap().is_none());
        assert!(storage.get_driver(driver.id).unwrap().is_some());
        assert!(storage.cars_for_driver(driver.id).unwrap().is_empty());
        assert!(!storage.delete_car(car.id).unwrap());
    }

    #[test]
    fn test_assign_and_unassign() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let driver = insert_driver(&storage, "driver_one", "AAA12345");
        let car = storage.insert_car("Camry", toyota.id, &[]).unwrap();

        storage.assign_driver(car.id, driver.id).unwrap();
        storage.assign_driver(car.id, driver.id).unwrap();
        assert!(storage.is_assigned(car.id, driver.id).unwrap());
        assert_eq!(storage.drivers_for_car(car.id).unwrap().len(), 1);

        storage.unassign_driver(car.id, driver.id).unwrap();
        storage.unassign_driver(car.id, driver.id).unwrap();
        assert!(!storage.is_assigned(car.id, driver.id).unwrap());
    }

    #[test]
    fn test_list_search_non_ascii_model() {
        let storage = create_test_storage();
        let maker = insert_manufacturer(&storage, "Oldsmobile", "USA");
        storage.insert_car("Ölmobil", maker.id, &[]).unwrap();
        storage.insert_car("Omega", maker.id, &[]).unwrap();

        let page = storage.list_cars(&ListQuery::search("ölmobil"), 5).unwrap();
        assert_eq!(models(&page), ["Ölmobil"]);
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_list_search_by_model() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        let honda = insert_manufacturer(&storage, "Honda", "Japan");
        storage.insert_car("Camry", toyota.id, &[]).unwrap();
        storage.insert_car("Corolla", toyota.id, &[]).unwrap();
        storage.insert_car("Civic", honda.id, &[]).unwrap();

        let page = storage.list_cars(&ListQuery::all(), 5).unwrap();
        assert_eq!(models(&page), ["Camry", "Corolla", "Civic"]);

        let page = storage.list_cars(&ListQuery::search("camry"), 5).unwrap();
        assert_eq!(models(&page), ["Camry"]);
        assert_eq!(page.items[0].manufacturer.name, "Toyota");

        let page = storage.list_cars(&ListQuery::search("C"), 5).unwrap();
        assert_eq!(page.len(), 3);

        let page = storage
            .list_cars(&ListQuery::search("nonexistent"), 5)
            .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_list_pagination() {
        let storage = create_test_storage();
        let toyota = insert_manufacturer(&storage, "Toyota", "Japan");
        for i in 0..7 {
            storage
                .insert_car(&format!("Model {i}"), toyota.id, &[])
                .unwrap();
        }

        let second = storage.list_cars(&ListQuery::all().page(2), 5).unwrap();
        assert_eq!(models(&second), ["Model 5", "Model 6"]);
        assert_eq!(second.num_pages(), 2);
        assert!(second.has_previous());
    }
}
