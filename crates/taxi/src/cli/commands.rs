//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands and converts
//! their arguments into the forms the handlers accept.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::forms::{
    CarForm, DriverCreationForm, DriverForm, DriverLicenseUpdateForm, ManufacturerForm,
};
use crate::model::{CarDetail, Driver, Manufacturer};
use crate::query::ListQuery;

/// Arguments shared by every list command.
#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
}

/// Manufacturer commands.
#[derive(Debug, Subcommand)]
pub enum ManufacturerCommand {
    /// List manufacturers by name
    List {
        /// Only manufacturers whose name contains this text
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one manufacturer
    Show {
        /// Manufacturer id
        id: i64,
    },

    /// Add a manufacturer
    Create {
        /// Manufacturer name
        #[arg(long)]
        name: String,

        /// Country of origin
        #[arg(long)]
        country: String,
    },

    /// Change a manufacturer; omitted fields keep their values
    Update {
        /// Manufacturer id
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New country
        #[arg(long)]
        country: Option<String>,
    },

    /// Delete a manufacturer that no car references
    Delete {
        /// Manufacturer id
        id: i64,
    },
}

/// Profile and password arguments for a new driver.
#[derive(Clone, Args)]
pub struct NewDriverArgs {
    /// Sign-in name
    #[arg(long)]
    pub username: String,

    /// Password for the new driver
    #[arg(long, env = "TAXI_NEW_PASSWORD", hide_env_values = true)]
    pub new_password: String,

    /// Repeat of the password
    #[arg(long, env = "TAXI_CONFIRM_PASSWORD", hide_env_values = true)]
    pub confirm_password: String,

    /// Given name
    #[arg(long, default_value = "")]
    pub first_name: String,

    /// Family name
    #[arg(long, default_value = "")]
    pub last_name: String,

    /// License number, three capital letters then five digits
    #[arg(long)]
    pub license_number: String,
}

impl std::fmt::Debug for NewDriverArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewDriverArgs")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("license_number", &self.license_number)
            .finish_non_exhaustive()
    }
}

impl NewDriverArgs {
    /// The driver creation form these arguments describe.
    #[must_use]
    pub fn to_form(&self) -> DriverCreationForm {
        DriverCreationForm {
            username: self.username.clone(),
            password1: self.new_password.clone(),
            password2: self.confirm_password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            license_number: self.license_number.clone(),
        }
    }
}

/// Driver commands.
#[derive(Debug, Subcommand)]
pub enum DriverCommand {
    /// List drivers in the order they joined
    List {
        /// Only drivers whose username contains this text
        #[arg(long)]
        username: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a driver and the cars they drive
    Show {
        /// Driver id
        id: i64,
    },

    /// Add a driver account
    Create(NewDriverArgs),

    /// Sign up as a new driver (no login needed)
    Register(NewDriverArgs),

    /// Change a driver's profile; omitted fields keep their values
    Update {
        /// Driver id
        id: i64,

        /// New username
        #[arg(long)]
        username: Option<String>,

        /// New given name
        #[arg(long)]
        first_name: Option<String>,

        /// New family name
        #[arg(long)]
        last_name: Option<String>,

        /// New license number
        #[arg(long)]
        license_number: Option<String>,
    },

    /// Change only a driver's license number
    License {
        /// Driver id
        id: i64,

        /// New license number
        license_number: String,
    },

    /// Delete a driver; their cars stay
    Delete {
        /// Driver id
        id: i64,
    },
}

/// Car commands.
#[derive(Debug, Subcommand)]
pub enum CarCommand {
    /// List cars in the order they were added
    List {
        /// Only cars whose model contains this text
        #[arg(short, long)]
        model: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show a car with its manufacturer and drivers
    Show {
        /// Car id
        id: i64,
    },

    /// Add a car
    Create {
        /// Model name
        #[arg(long)]
        model: String,

        /// Manufacturer id
        #[arg(long)]
        manufacturer: i64,

        /// Driver id; repeat for several drivers
        #[arg(long = "driver")]
        drivers: Vec<i64>,
    },

    /// Change a car; omitted fields keep their values
    Update {
        /// Car id
        id: i64,

        /// New model name
        #[arg(long)]
        model: Option<String>,

        /// New manufacturer id
        #[arg(long)]
        manufacturer: Option<i64>,

        /// Driver id; replaces the current drivers when given
        #[arg(long = "driver", conflicts_with = "no_drivers")]
        drivers: Vec<i64>,

        /// Remove every driver from the car
        #[arg(long)]
        no_drivers: bool,
    },

    /// Delete a car; its drivers stay
    Delete {
        /// Car id
        id: i64,
    },

    /// Join the car as the signed-in driver, or leave it if already assigned
    Assign {
        /// Car id
        id: i64,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

/// Build a list query from an optional search flag and page arguments.
#[must_use]
pub fn list_query(search: Option<&str>, page: &PageArgs) -> ListQuery {
    let query = match search {
        Some(term) => ListQuery::search(term),
        None => ListQuery::all(),
    };
    query.page(page.page)
}

/// Merge optional new values over a stored manufacturer.
#[must_use]
pub fn manufacturer_update(
    current: &Manufacturer,
    name: Option<&str>,
    country: Option<&str>,
) -> ManufacturerForm {
    ManufacturerForm {
        name: name.unwrap_or(&current.name).to_string(),
        country: country.unwrap_or(&current.country).to_string(),
    }
}

/// Merge optional new values over a stored driver.
#[must_use]
pub fn driver_update(
    current: &Driver,
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    license_number: Option<&str>,
) -> DriverForm {
    DriverForm {
        username: username.unwrap_or(&current.username).to_string(),
        first_name: first_name.unwrap_or(&current.first_name).to_string(),
        last_name: last_name.unwrap_or(&current.last_name).to_string(),
        license_number: license_number
            .unwrap_or(&current.license_number)
            .to_string(),
    }
}

/// Merge optional new values over a stored car.
///
/// Given driver ids replace the current drivers; `no_drivers` clears them.
#[must_use]
pub fn car_update(
    current: &CarDetail,
    model: Option<&str>,
    manufacturer: Option<i64>,
    drivers: &[i64],
    no_drivers: bool,
) -> CarForm {
    let drivers = if no_drivers {
        Vec::new()
    } else if drivers.is_empty() {
        current.drivers.iter().map(|d| d.id).collect()
    } else {
        drivers.to_vec()
    };
    CarForm {
        model: model.unwrap_or(&current.car.model).to_string(),
        manufacturer: Some(manufacturer.unwrap_or(current.car.manufacturer.id)),
        drivers,
    }
}

/// The license-only form for `driver license`.
#[must_use]
pub fn license_update(license_number: &str) -> DriverLicenseUpdateForm {
    DriverLicenseUpdateForm::new(license_number)
}
