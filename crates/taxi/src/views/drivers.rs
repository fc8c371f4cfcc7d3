//! Driver handlers, including self-registration and the license update.

use tracing::info;

use super::{merge_errors, Views};
use crate::auth::{hash_password, require_principal, Principal};
use crate::error::{Error, Result};
use crate::forms::{DriverCreationForm, DriverForm, DriverLicenseUpdateForm};
use crate::model::{Driver, DriverDetail};
use crate::query::{ListQuery, Page};
use crate::validation::FieldErrors;

const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";

impl Views {
    /// List drivers in creation order, filtered on `query`'s search term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a principal, or a storage error.
    pub fn list_drivers(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery,
    ) -> Result<Page<Driver>> {
        require_principal(principal)?;
        self.storage.list_drivers(query, self.page_size)
    }

    /// Fetch one driver with the cars they drive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::NotFound`].
    pub fn driver_detail(&self, principal: Option<&Principal>, id: i64) -> Result<DriverDetail> {
        require_principal(principal)?;
        self.storage
            .get_driver_detail(id)?
            .ok_or_else(|| Error::not_found(Driver::KIND, id))
    }

    /// Create a driver account on behalf of a signed-in driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::Validation`].
    pub fn create_driver(
        &self,
        principal: Option<&Principal>,
        form: &DriverCreationForm,
    ) -> Result<Driver> {
        require_principal(principal)?;
        self.insert_driver(form)
    }

    /// Create a driver account without a principal (self sign-up).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or a storage or hashing error.
    pub fn register(&self, form: &DriverCreationForm) -> Result<Driver> {
        self.insert_driver(form)
    }

    /// Validate and replace a driver's profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::NotFound`] or
    /// [`Error::Validation`]. On validation failure nothing changes.
    pub fn update_driver(
        &self,
        principal: Option<&Principal>,
        id: i64,
        form: &DriverForm,
    ) -> Result<Driver> {
        require_principal(principal)?;
        self.get_driver(id)?;

        let mut errors = self.username_errors(&form.username, Some(id))?;
        let cleaned = merge_errors(form.clean(), &mut errors)?;

        let driver = self
            .storage
            .update_driver(id, &cleaned)?
            .ok_or_else(|| Error::not_found(Driver::KIND, id))?;
        info!("Updated driver {}", id);
        Ok(driver)
    }

    /// Validate and change only a driver's license number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::NotFound`] or
    /// [`Error::Validation`]. On validation failure nothing changes.
    pub fn update_license(
        &self,
        principal: Option<&Principal>,
        id: i64,
        form: &DriverLicenseUpdateForm,
    ) -> Result<Driver> {
        require_principal(principal)?;
        self.get_driver(id)?;
        let cleaned = form.clean()?;

        let driver = self
            .storage
            .update_license_number(id, &cleaned.license_number)?
            .ok_or_else(|| Error::not_found(Driver::KIND, id))?;
        info!("Updated license number for driver {}", id);
        Ok(driver)
    }

    /// Delete a driver. Their cars remain; only the assignments go.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::NotFound`].
    pub fn delete_driver(&self, principal: Option<&Principal>, id: i64) -> Result<()> {
        require_principal(principal)?;
        if !self.storage.delete_driver(id)? {
            return Err(Error::not_found(Driver::KIND, id));
        }
        info!("Deleted driver {}", id);
        Ok(())
    }

    fn get_driver(&self, id: i64) -> Result<Driver> {
        self.storage
            .get_driver(id)?
            .ok_or_else(|| Error::not_found(Driver::KIND, id))
    }

    fn insert_driver(&self, form: &DriverCreationForm) -> Result<Driver> {
        let mut errors = self.username_errors(&form.username, None)?;
        let cleaned = merge_errors(form.clean(self.min_password_length), &mut errors)?;

        let password_hash = hash_password(&cleaned.password1)?;
        let driver = self
            .storage
            .insert_driver(&cleaned.profile(), &password_hash)?;
        info!("Created driver {} ({})", driver.id, driver.username);
        Ok(driver)
    }

    /// Field errors for a username already used by another driver.
    fn username_errors(&self, username: &str, except_id: Option<i64>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = username.trim();
        if !username.is_empty() && self.storage.username_taken(username, except_id)? {
            errors.add("username", USERNAME_TAKEN_MESSAGE);
        }
        Ok(errors)
    }
}
