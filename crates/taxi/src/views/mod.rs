//! Operation handlers for taxi.
//!
//! [`Views`] is the single entry point for every fleet operation. Each handler
//! takes the caller's `Option<&Principal>` explicitly, checks it before touching
//! storage, validates input through the forms, runs the referential checks that
//! need the store, and reports every failure as an [`Error`] value. The
//! [`outcome`] module turns those results into what a routing layer returns.

mod cars;
mod drivers;
mod manufacturers;
pub mod outcome;

pub use outcome::{Outcome, Route};

use tracing::{debug, info};

use crate::auth::{require_principal, verify_password, Principal};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::FleetCounts;
use crate::storage::Storage;
use crate::validation::FieldErrors;

/// Fleet operation handlers over one storage connection.
#[derive(Debug)]
pub struct Views {
    storage: Storage,
    page_size: usize,
    min_password_length: usize,
}

impl Views {
    /// Create handlers with explicit list and password settings.
    #[must_use]
    pub fn new(storage: Storage, page_size: usize, min_password_length: usize) -> Self {
        Self {
            storage,
            page_size: page_size.max(1),
            min_password_length,
        }
    }

    /// Create handlers using the list and auth sections of `config`.
    #[must_use]
    pub fn from_config(storage: Storage, config: &Config) -> Self {
        Self::new(
            storage,
            config.list.page_size,
            config.auth.min_password_length,
        )
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Records per list page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Live counts of drivers, cars and manufacturers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a principal, or a storage error.
    pub fn home(&self, principal: Option<&Principal>) -> Result<FleetCounts> {
        require_principal(principal)?;
        self.storage.counts()
    }

    /// Check a username and password and return the matching principal.
    ///
    /// An unknown username and a wrong password fail the same way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on mismatch, or a storage or
    /// hashing error.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal> {
        let Some((driver, hash)) = self.storage.driver_credentials(username.trim())? else {
            debug!("Login attempt for unknown username");
            return Err(Error::InvalidCredentials);
        };
        if !verify_password(password, &hash)? {
            debug!("Wrong password for driver {}", driver.id);
            return Err(Error::InvalidCredentials);
        }
        info!("Driver {} authenticated", driver.username);
        Ok(Principal::from(&driver))
    }
}

/// Combine a form's own result with errors found against the store.
fn merge_errors<T>(
    cleaned: std::result::Result<T, FieldErrors>,
    errors: &mut FieldErrors,
) -> Result<T> {
    match cleaned {
        Ok(value) if errors.is_empty() => Ok(value),
        Ok(_) => Err(Error::Validation(std::mem::take(errors))),
        Err(form_errors) => {
            errors.extend(form_errors);
            Err(Error::Validation(std::mem::take(errors)))
        }
    }
}
