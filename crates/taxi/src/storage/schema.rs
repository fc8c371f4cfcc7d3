//! `SQLite` schema definitions for taxi.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the manufacturers table.
pub const CREATE_MANUFACTURERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS manufacturers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    country TEXT NOT NULL
)
";

/// SQL statement to create an index on manufacturer name for ordered lists.
pub const CREATE_MANUFACTURER_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_manufacturers_name ON manufacturers(name)
";

/// SQL statement to create the drivers table.
pub const CREATE_DRIVERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS drivers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    license_number TEXT NOT NULL,
    date_joined TEXT NOT NULL
)
";

/// SQL statement to create the cars table.
///
/// Deleting a manufacturer that still has cars is refused by the foreign key.
pub const CREATE_CARS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    manufacturer_id INTEGER NOT NULL REFERENCES manufacturers(id) ON DELETE RESTRICT
)
";

/// SQL statement to create an index on `manufacturer_id` for reference checks.
pub const CREATE_CAR_MANUFACTURER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_cars_manufacturer ON cars(manufacturer_id)
";

/// SQL statement to create the driver-car association table.
pub const CREATE_CARS_DRIVERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cars_drivers (
    car_id INTEGER NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
    driver_id INTEGER NOT NULL REFERENCES drivers(id) ON DELETE CASCADE,
    PRIMARY KEY (car_id, driver_id)
)
";

/// SQL statement to create an index on `driver_id` for driver detail lookups.
pub const CREATE_CARS_DRIVERS_DRIVER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_cars_drivers_driver ON cars_drivers(driver_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MANUFACTURERS_TABLE,
    CREATE_MANUFACTURER_NAME_INDEX,
    CREATE_DRIVERS_TABLE,
    CREATE_CARS_TABLE,
    CREATE_CAR_MANUFACTURER_INDEX,
    CREATE_CARS_DRIVERS_TABLE,
    CREATE_CARS_DRIVERS_DRIVER_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_drivers_table_username_unique() {
        assert!(CREATE_DRIVERS_TABLE.contains("username TEXT NOT NULL UNIQUE"));
        assert!(CREATE_DRIVERS_TABLE.contains("license_number TEXT NOT NULL"));
    }

    #[test]
    fn test_cars_reference_manufacturers() {
        assert!(CREATE_CARS_TABLE.contains("REFERENCES manufacturers(id) ON DELETE RESTRICT"));
    }

    #[test]
    fn test_association_has_composite_key() {
        assert!(CREATE_CARS_DRIVERS_TABLE.contains("PRIMARY KEY (car_id, driver_id)"));
    }

    #[test]
    fn test_tables_created_before_references() {
        let position = |stmt: &str| SCHEMA_STATEMENTS.iter().position(|s| *s == stmt);
        assert!(position(CREATE_MANUFACTURERS_TABLE) < position(CREATE_CARS_TABLE));
        assert!(position(CREATE_DRIVERS_TABLE) < position(CREATE_CARS_DRIVERS_TABLE));
        assert!(position(CREATE_CARS_TABLE) < position(CREATE_CARS_DRIVERS_TABLE));
    }
}
