//! Input forms for creating and updating records.
//!
//! Each form's `clean` method trims the submitted text, runs the field rule
//! table, and returns either the cleaned form or every field error at once.
//! Checks that need the store (unique usernames, existing manufacturers and
//! drivers) happen in the view handlers.

use serde::{Deserialize, Serialize};

use crate::validation::{validate_fields, FieldErrors, Rule};

/// Longest name or model accepted for manufacturers and cars.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Longest username or personal name accepted for drivers.
pub const MAX_NAME_LENGTH: usize = 150;

const TEXT_RULES: &[Rule] = &[Rule::Required, Rule::MaxLength(MAX_TEXT_LENGTH)];
const USERNAME_RULES: &[Rule] = &[
    Rule::Required,
    Rule::MaxLength(MAX_NAME_LENGTH),
    Rule::Username,
];
const NAME_RULES: &[Rule] = &[Rule::MaxLength(MAX_NAME_LENGTH)];
const LICENSE_RULES: &[Rule] = &[Rule::Required, Rule::LicenseNumber];
const PASSWORD_RULES: &[Rule] = &[Rule::Required];

/// Manufacturer create/update fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerForm {
    /// Manufacturer name.
    pub name: String,
    /// Country of origin.
    pub country: String,
}

impl ManufacturerForm {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns the accumulated field errors if any rule fails.
    pub fn clean(&self) -> Result<Self, FieldErrors> {
        let cleaned = Self {
            name: self.name.trim().to_string(),
            country: self.country.trim().to_string(),
        };
        validate_fields(&[
            ("name", cleaned.name.as_str(), TEXT_RULES),
            ("country", cleaned.country.as_str(), TEXT_RULES),
        ])
        .into_result()?;
        Ok(cleaned)
    }
}

/// Driver sign-up fields, including the password and its confirmation.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCreationForm {
    /// Unique sign-in name.
    pub username: String,
    /// Password.
    pub password1: String,
    /// Password confirmation; must equal `password1`.
    pub password2: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// License number in `AAA12345` form.
    pub license_number: String,
}

impl std::fmt::Debug for DriverCreationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverCreationForm")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("license_number", &self.license_number)
            .finish_non_exhaustive()
    }
}

impl DriverCreationForm {
    /// Trim and validate, requiring passwords of at least `min_password_length`.
    ///
    /// Passwords are compared and stored exactly as submitted.
    ///
    /// # Errors
    ///
    /// Returns the accumulated field errors if any rule fails.
    pub fn clean(&self, min_password_length: usize) -> Result<Self, FieldErrors> {
        let cleaned = Self {
            username: self.username.trim().to_string(),
            password1: self.password1.clone(),
            password2: self.password2.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
        };

        let mut errors = validate_fields(&[
            ("username", cleaned.username.as_str(), USERNAME_RULES),
            ("password1", cleaned.password1.as_str(), PASSWORD_RULES),
            ("password2", cleaned.password2.as_str(), PASSWORD_RULES),
            ("first_name", cleaned.first_name.as_str(), NAME_RULES),
            ("last_name", cleaned.last_name.as_str(), NAME_RULES),
            ("license_number", cleaned.license_number.as_str(), LICENSE_RULES),
        ]);

        if !errors.has("password1") && !errors.has("password2") {
            errors.extend(check_password(
                &cleaned.password1,
                &cleaned.password2,
                min_password_length,
            ));
        }

        errors.into_result()?;
        Ok(cleaned)
    }

    /// The profile part of the form, without passwords.
    #[must_use]
    pub fn profile(&self) -> DriverForm {
        DriverForm {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            license_number: self.license_number.clone(),
        }
    }
}

/// Confirmation and strength checks; failures land on `password2`.
fn check_password(password1: &str, password2: &str, min_length: usize) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if password1 != password2 {
        errors.add("password2", "The two password fields didn't match.");
        return errors;
    }
    if password2.chars().count() < min_length {
        errors.add(
            "password2",
            format!(
                "This password is too short. It must contain at least {min_length} characters."
            ),
        );
    }
    if password2.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password2", "This password is entirely numeric.");
    }
    errors
}

/// Full driver update fields (everything but the password).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverForm {
    /// Unique sign-in name.
    pub username: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// License number in `AAA12345` form.
    pub license_number: String,
}

impl DriverForm {
    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns the accumulated field errors if any rule fails.
    pub fn clean(&self) -> Result<Self, FieldErrors> {
        let cleaned = Self {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
        };
        validate_fields(&[
            ("username", cleaned.username.as_str(), USERNAME_RULES),
            ("first_name", cleaned.first_name.as_str(), NAME_RULES),
            ("last_name", cleaned.last_name.as_str(), NAME_RULES),
            ("license_number", cleaned.license_number.as_str(), LICENSE_RULES),
        ])
        .into_result()?;
        Ok(cleaned)
    }
}

/// The narrow license-only driver update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverLicenseUpdateForm {
    /// New license number in `AAA12345` form.
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    /// Build a form from a raw license number.
    #[must_use]
    pub fn new(license_number: impl Into<String>) -> Self {
        Self {
            license_number: license_number.into(),
        }
    }

    /// Trim and validate.
    ///
    /// # Errors
    ///
    /// Returns the field error if the license number is malformed.
    pub fn clean(&self) -> Result<Self, FieldErrors> {
        let cleaned = Self::new(self.license_number.trim());
        validate_fields(&[("license_number", cleaned.license_number.as_str(), LICENSE_RULES)])
            .into_result()?;
        Ok(cleaned)
    }
}

/// Car create/update fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarForm {
    /// Model name.
    pub model: String,
    /// Id of the manufacturer; required.
    pub manufacturer: Option<i64>,
    /// Ids of the drivers assigned to the car; may be empty.
    #[serde(default)]
    pub drivers: Vec<i64>,
}

impl CarForm {
    /// Driver ids in submitted order with repeats removed.
    #[must_use]
    pub fn driver_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.drivers.len());
        for id in &self.drivers {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Trim and validate, dropping duplicate driver ids.
    ///
    /// Whether the referenced ids exist is checked by the handler.
    ///
    /// # Errors
    ///
    /// Returns the accumulated field errors if any rule fails.
    pub fn clean(&self) -> Result<Self, FieldErrors> {
        let cleaned = Self {
            model: self.model.trim().to_string(),
            manufacturer: self.manufacturer,
            drivers: self.driver_ids(),
        };

        let mut errors = validate_fields(&[("model", cleaned.model.as_str(), TEXT_RULES)]);
        if cleaned.manufacturer.is_none() {
            errors.add("manufacturer", crate::validation::REQUIRED_MESSAGE);
        }
        errors.into_result()?;
        Ok(cleaned)
    }
}
