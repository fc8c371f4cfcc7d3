//! Manufacturer handlers.

use tracing::{info, warn};

use super::Views;
use crate::auth::{require_principal, Principal};
use crate::error::{Error, Result};
use crate::forms::ManufacturerForm;
use crate::model::Manufacturer;
use crate::query::{ListQuery, Page};

impl Views {
    /// List manufacturers by name, filtered on `query`'s search term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a principal, or a storage error.
    pub fn list_manufacturers(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery,
    ) -> Result<Page<Manufacturer>> {
        require_principal(principal)?;
        self.storage.list_manufacturers(query, self.page_size)
    }

    /// Fetch one manufacturer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::NotFound`].
    pub fn manufacturer_detail(
        &self,
        principal: Option<&Principal>,
        id: i64,
    ) -> Result<Manufacturer> {
        require_principal(principal)?;
        self.storage
            .get_manufacturer(id)?
            .ok_or_else(|| Error::not_found(Manufacturer::KIND, id))
    }

    /// Validate and store a new manufacturer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::Validation`].
    pub fn create_manufacturer(
        &self,
        principal: Option<&Principal>,
        form: &ManufacturerForm,
    ) -> Result<Manufacturer> {
        require_principal(principal)?;
        let cleaned = form.clean()?;
        let manufacturer = self
            .storage
            .insert_manufacturer(&cleaned.name, &cleaned.country)?;
        info!("Created manufacturer {} ({})", manufacturer.id, manufacturer);
        Ok(manufacturer)
    }

    /// Validate and replace a manufacturer's fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::NotFound`] or
    /// [`Error::Validation`]. On validation failure nothing changes.
    pub fn update_manufacturer(
        &self,
        principal: Option<&Principal>,
        id: i64,
        form: &ManufacturerForm,
    ) -> Result<Manufacturer> {
        require_principal(principal)?;
        if !self.storage.manufacturer_exists(id)? {
            return Err(Error::not_found(Manufacturer::KIND, id));
        }
        let cleaned = form.clean()?;
        let manufacturer = self
            .storage
            .update_manufacturer(id, &cleaned.name, &cleaned.country)?
            .ok_or_else(|| Error::not_found(Manufacturer::KIND, id))?;
        info!("Updated manufacturer {}", id);
        Ok(manufacturer)
    }

    /// Delete a manufacturer that no car references.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::NotFound`], or
    /// [`Error::Protected`] while cars still reference it.
    pub fn delete_manufacturer(&self, principal: Option<&Principal>, id: i64) -> Result<()> {
        require_principal(principal)?;
        if !self.storage.manufacturer_exists(id)? {
            return Err(Error::not_found(Manufacturer::KIND, id));
        }
        let dependents = self.storage.count_cars_for_manufacturer(id)?;
        if dependents > 0 {
            warn!(
                "Refusing to delete manufacturer {} with {} car(s)",
                id, dependents
            );
            return Err(Error::Protected {
                kind: Manufacturer::KIND,
                id,
                dependents,
            });
        }
        if !self.storage.delete_manufacturer(id)? {
            return Err(Error::not_found(Manufacturer::KIND, id));
        }
        info!("Deleted manufacturer {}", id);
        Ok(())
    }
}
