//! Car handlers and the driver-car assignment toggle.

use tracing::info;

use super::{merge_errors, Views};
use crate::auth::{require_principal, Principal};
use crate::error::{Error, Result};
use crate::forms::CarForm;
use crate::model::{Car, CarDetail};
use crate::query::{ListQuery, Page};
use crate::validation::FieldErrors;

const INVALID_MANUFACTURER_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

impl Views {
    /// List cars in creation order, filtered on `query`'s search term.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a principal, or a storage error.
    pub fn list_cars(&self, principal: Option<&Principal>, query: &ListQuery) -> Result<Page<Car>> {
        require_principal(principal)?;
        self.storage.list_cars(query, self.page_size)
    }

    /// Fetch one car with its manufacturer and drivers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::NotFound`].
    pub fn car_detail(&self, principal: Option<&Principal>, id: i64) -> Result<CarDetail> {
        require_principal(principal)?;
        self.storage
            .get_car_detail(id)?
            .ok_or_else(|| Error::not_found(Car::KIND, id))
    }

    /// Validate and store a new car with its drivers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::Validation`], including
    /// for an unknown manufacturer or driver id.
    pub fn create_car(&self, principal: Option<&Principal>, form: &CarForm) -> Result<Car> {
        require_principal(principal)?;
        let (cleaned, manufacturer_id) = self.clean_car(form)?;
        let car = self
            .storage
            .insert_car(&cleaned.model, manufacturer_id, &cleaned.drivers)?;
        info!("Created car {} ({})", car.id, car);
        Ok(car)
    }

    /// Validate and replace a car's model, manufacturer and drivers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::NotFound`] or
    /// [`Error::Validation`]. On validation failure nothing changes.
    pub fn update_car(&self, principal: Option<&Principal>, id: i64, form: &CarForm) -> Result<Car> {
        require_principal(principal)?;
        if self.storage.get_car(id)?.is_none() {
            return Err(Error::not_found(Car::KIND, id));
        }
        let (cleaned, manufacturer_id) = self.clean_car(form)?;
        let car = self
            .storage
            .update_car(id, &cleaned.model, manufacturer_id, &cleaned.drivers)?
            .ok_or_else(|| Error::not_found(Car::KIND, id))?;
        info!("Updated car {}", id);
        Ok(car)
    }

    /// Delete a car. Its drivers remain; only the assignments go.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] or [`Error::NotFound`].
    pub fn delete_car(&self, principal: Option<&Principal>, id: i64) -> Result<()> {
        require_principal(principal)?;
        if !self.storage.delete_car(id)? {
            return Err(Error::not_found(Car::KIND, id));
        }
        info!("Deleted car {}", id);
        Ok(())
    }

    /// Add the principal to the car's drivers, or remove them if already there.
    ///
    /// Returns whether the principal drives the car afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] without a principal or when the
    /// principal's driver no longer exists, and [`Error::NotFound`] for an
    /// unknown car.
    pub fn toggle_assignment(&self, principal: Option<&Principal>, car_id: i64) -> Result<bool> {
        let principal = require_principal(principal)?;
        if self.storage.get_driver(principal.driver_id)?.is_none() {
            return Err(Error::Unauthenticated);
        }
        if self.storage.get_car(car_id)?.is_none() {
            return Err(Error::not_found(Car::KIND, car_id));
        }

        if self.storage.is_assigned(car_id, principal.driver_id)? {
            self.storage.unassign_driver(car_id, principal.driver_id)?;
            info!("Driver {} left car {}", principal.driver_id, car_id);
            Ok(false)
        } else {
            self.storage.assign_driver(car_id, principal.driver_id)?;
            info!("Driver {} joined car {}", principal.driver_id, car_id);
            Ok(true)
        }
    }

    /// Run the form rules and check the referenced ids exist.
    fn clean_car(&self, form: &CarForm) -> Result<(CarForm, i64)> {
        let mut errors = FieldErrors::new();
        if let Some(id) = form.manufacturer {
            if !self.storage.manufacturer_exists(id)? {
                errors.add("manufacturer", INVALID_MANUFACTURER_MESSAGE);
            }
        }
        for id in self.storage.missing_driver_ids(&form.driver_ids())? {
            errors.add(
                "drivers",
                format!("Select a valid choice. {id} is not one of the available choices."),
            );
        }

        let cleaned = merge_errors(form.clean(), &mut errors)?;
        let manufacturer_id = cleaned
            .manufacturer
            .ok_or_else(|| Error::internal("cleaned car form without a manufacturer"))?;
        Ok((cleaned, manufacturer_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Principal;
    use crate::forms::{CarForm, ManufacturerForm};
    use crate::model::Manufacturer;
    use crate::query::ListQuery;
    use crate::views::test_support::*;
    use crate::views::Views;

    fn toyota(views: &Views, principal: &Principal) -> Manufacturer {
        views
            .create_manufacturer(
                Some(principal),
                &ManufacturerForm {
                    name: "Toyota".to_string(),
                    country: "Japan".to_string(),
                },
            )
            .unwrap()
    }

    fn car_form(model: &str, manufacturer: i64, drivers: Vec<i64>) -> CarForm {
        CarForm {
            model: model.to_string(),
            manufacturer: Some(manufacturer),
            drivers,
        }
    }

    #[test]
    fn test_login_required() {
        let views = create_test_views();
        let form = car_form("Camry", 1, vec![]);

        assert!(views
            .list_cars(None, &ListQuery::all())
            .unwrap_err()
            .is_unauthenticated());
        assert!(views.car_detail(None, 1).unwrap_err().is_unauthenticated());
        assert!(views.create_car(None, &form).unwrap_err().is_unauthenticated());
        assert!(views
            .update_car(None, 1, &form)
            .unwrap_err()
            .is_unauthenticated());
        assert!(views.delete_car(None, 1).unwrap_err().is_unauthenticated());
        assert!(views
            .toggle_assignment(None, 1)
            .unwrap_err()
            .is_unauthenticated());
    }

    #[test]
    fn test_create_car() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);

        let car = views
            .create_car(
                Some(&admin),
                &car_form("Camry", manufacturer.id, vec![admin.driver_id]),
            )
            .unwrap();
        assert_eq!(car.model, "Camry");
        assert_eq!(car.manufacturer, manufacturer);

        let detail = views.car_detail(Some(&admin), car.id).unwrap();
        assert!(detail.is_driven_by(admin.driver_id));
    }

    #[test]
    fn test_create_rejects_unknown_references() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");

        let err = views
            .create_car(Some(&admin), &car_form("Camry", 404, vec![admin.driver_id, 405]))
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("manufacturer"), [super::INVALID_MANUFACTURER_MESSAGE]);
        assert_eq!(
            errors.get("drivers"),
            ["Select a valid choice. 405 is not one of the available choices."]
        );
        assert_eq!(views.storage().count_cars().unwrap(), 0);
    }

    #[test]
    fn test_repeated_unknown_driver_reported_once() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);

        let err = views
            .create_car(
                Some(&admin),
                &car_form("Camry", manufacturer.id, vec![405, admin.driver_id, 405]),
            )
            .unwrap_err();
        assert_eq!(
            err.field_errors().unwrap().get("drivers"),
            ["Select a valid choice. 405 is not one of the available choices."]
        );
    }

    #[test]
    fn test_create_requires_model_and_manufacturer() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");

        let err = views
            .create_car(Some(&admin), &CarForm::default())
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.has("model"));
        assert!(errors.has("manufacturer"));
    }

    #[test]
    fn test_list_search() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);
        for model in ["Camry", "Mustang", "Corolla"] {
            views
                .create_car(Some(&admin), &car_form(model, manufacturer.id, vec![]))
                .unwrap();
        }

        let models = |search: &str| -> Vec<String> {
            views
                .list_cars(Some(&admin), &ListQuery::search(search))
                .unwrap()
                .items
                .into_iter()
                .map(|c| c.model)
                .collect()
        };
        assert_eq!(models("camry"), ["Camry"]);
        assert_eq!(models("rol"), ["Corolla"]);
        assert!(models("nonexistent").is_empty());
        assert_eq!(models(""), ["Camry", "Mustang", "Corolla"]);
    }

    #[test]
    fn test_update_car() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);
        let car = views
            .create_car(
                Some(&admin),
                &car_form("Test Model", manufacturer.id, vec![admin.driver_id]),
            )
            .unwrap();

        let updated = views
            .update_car(
                Some(&admin),
                car.id,
                &car_form("Updated Model", manufacturer.id, vec![]),
            )
            .unwrap();
        assert_eq!(updated.model, "Updated Model");
        let detail = views.car_detail(Some(&admin), car.id).unwrap();
        assert!(detail.drivers.is_empty());
    }

    #[test]
    fn test_update_invalid_leaves_record() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);
        let car = views
            .create_car(Some(&admin), &car_form("Camry", manufacturer.id, vec![]))
            .unwrap();

        let err = views
            .update_car(Some(&admin), car.id, &car_form("", manufacturer.id, vec![]))
            .unwrap_err();
        assert!(err.field_errors().unwrap().has("model"));
        assert_eq!(views.car_detail(Some(&admin), car.id).unwrap().car, car);
        assert!(views
            .update_car(Some(&admin), 99999, &car_form("X", manufacturer.id, vec![]))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_car() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);
        let car = views
            .create_car(
                Some(&admin),
                &car_form("Test Delete", manufacturer.id, vec![admin.driver_id]),
            )
            .unwrap();

        views.delete_car(Some(&admin), car.id).unwrap();
        assert!(views
            .car_detail(Some(&admin), car.id)
            .unwrap_err()
            .is_not_found());
        assert!(views
            .driver_detail(Some(&admin), admin.driver_id)
            .unwrap()
            .cars
            .is_empty());
        assert!(views
            .delete_car(Some(&admin), car.id)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_toggle_assignment() {
        let views = create_test_views();
        let admin = login(&views, "admin.user");
        let manufacturer = toyota(&views, &admin);
        let car = views
            .create_car(Some(&admin), &car_form("Camry", manufacturer.id, vec![]))
            .unwrap();

        assert!(views.toggle_assignment(Some(&admin), car.id).unwrap());
        assert!(views
            .car_detail(Some(&admin), car.id)
            .unwrap()
            .is_driven_by(admin.driver_id));

        assert!(!views.toggle_assignment(Some(&admin), car.id).unwrap());
        assert!(!views
            .car_detail(Some(&admin), car.id)
            .unwrap()
            .is_driven_by(admin.driver_id));

        assert!(views
            .toggle_assignment(Some(&admin), 99999)
            .unwrap_err()
            .is_not_found());
    }
}
