//! `taxi` - Record keeping for a taxi fleet
//!
//! This library provides the manufacturer, driver and car records of a taxi
//! service, their validation rules, `SQLite` storage, and the authenticated
//! operations the `taxi` binary exposes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod logging;
pub mod model;
pub mod query;
pub mod storage;
pub mod validation;
pub mod views;

pub use auth::Principal;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Car, CarDetail, Driver, DriverDetail, FleetCounts, Manufacturer};
pub use query::{ListQuery, Page};
pub use storage::Storage;
pub use views::{Outcome, Route, Views};
