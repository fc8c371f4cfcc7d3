//! Core record types for taxi.
//!
//! Records are plain values loaded eagerly from storage: a [`Car`] carries its
//! [`Manufacturer`], and the detail types carry the other side of the
//! driver-car association.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A car manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    /// Surrogate id assigned by storage.
    pub id: i64,
    /// Manufacturer name.
    pub name: String,
    /// Country of origin.
    pub country: String,
}

impl Manufacturer {
    /// Entity kind name used in errors and logs.
    pub const KIND: &'static str = "manufacturer";
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

/// A driver. Drivers are also the principals that sign in.
///
/// The password hash is loaded only for credential checks and is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Surrogate id assigned by storage.
    pub id: i64,
    /// Unique sign-in name.
    pub username: String,
    /// Given name, may be empty.
    pub first_name: String,
    /// Family name, may be empty.
    pub last_name: String,
    /// License number in `AAA12345` form.
    pub license_number: String,
    /// When the driver record was created.
    pub date_joined: DateTime<Utc>,
}

impl Driver {
    /// Entity kind name used in errors and logs.
    pub const KIND: &'static str = "driver";

    /// First and last name joined by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.username, self.first_name, self.last_name
        )
    }
}

/// A car, with its manufacturer resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Surrogate id assigned by storage.
    pub id: i64,
    /// Model name.
    pub model: String,
    /// The manufacturer this car references.
    pub manufacturer: Manufacturer,
}

impl Car {
    /// Entity kind name used in errors and logs.
    pub const KIND: &'static str = "car";
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)
    }
}

/// A car together with everyone who drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDetail {
    /// The car itself.
    #[serde(flatten)]
    pub car: Car,
    /// Drivers assigned to the car, ordered by id.
    pub drivers: Vec<Driver>,
}

impl CarDetail {
    /// Whether the given driver is assigned to this car.
    #[must_use]
    pub fn is_driven_by(&self, driver_id: i64) -> bool {
        self.drivers.iter().any(|d| d.id == driver_id)
    }
}

/// A driver together with the cars they drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverDetail {
    /// The driver itself.
    #[serde(flatten)]
    pub driver: Driver,
    /// Cars the driver is assigned to, ordered by id.
    pub cars: Vec<Car>,
}

/// Aggregate counts shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCounts {
    /// Number of drivers.
    pub num_drivers: i64,
    /// Number of cars.
    pub num_cars: i64,
    /// Number of manufacturers.
    pub num_manufacturers: i64,
}
