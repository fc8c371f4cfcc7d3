//! Mapping handler results to routing responses.
//!
//! A [`Route`] names one endpoint of the application: its URL path and the
//! template it renders. [`Outcome`] is what the routing layer does with a
//! handler result on that route: render a template with a JSON context,
//! redirect, send the visitor to the login page, or answer not found.
//!
//! The `taxi` binary reports handler results directly and does not go through
//! this module. An HTTP front end serves each request by calling a [`Views`]
//! handler and answering with [`Outcome::read`] or [`Outcome::write`] on the
//! matching [`Route`]. The status code and `Location` header come from
//! [`Outcome::status_code`] and [`Outcome::location`].
//!
//! [`Views`]: crate::views::Views

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/accounts/login/";

/// Field key for errors that belong to the whole form.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// An endpoint of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Home page with record counts.
    Index,
    /// Sign-in page.
    Login,
    /// Driver self-registration.
    Register,
    /// Manufacturer list.
    ManufacturerList,
    /// New manufacturer.
    ManufacturerCreate,
    /// Edit a manufacturer.
    ManufacturerUpdate(i64),
    /// Confirm and delete a manufacturer.
    ManufacturerDelete(i64),
    /// Driver list.
    DriverList,
    /// Driver detail.
    DriverDetail(i64),
    /// New driver.
    DriverCreate,
    /// Edit a driver.
    DriverUpdate(i64),
    /// Edit only a driver's license number.
    DriverLicenseUpdate(i64),
    /// Confirm and delete a driver.
    DriverDelete(i64),
    /// Car list.
    CarList,
    /// Car detail.
    CarDetail(i64),
    /// New car.
    CarCreate,
    /// Edit a car.
    CarUpdate(i64),
    /// Confirm and delete a car.
    CarDelete(i64),
    /// Join or leave a car as the signed-in driver.
    CarToggleAssignment(i64),
}

impl Route {
    /// URL path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Index => "/".to_string(),
            Self::Login => LOGIN_PATH.to_string(),
            Self::Register => "/accounts/register/".to_string(),
            Self::ManufacturerList => "/manufacturers/".to_string(),
            Self::ManufacturerCreate => "/manufacturers/create/".to_string(),
            Self::ManufacturerUpdate(id) => format!("/manufacturers/{id}/update/"),
            Self::ManufacturerDelete(id) => format!("/manufacturers/{id}/delete/"),
            Self::DriverList => "/drivers/".to_string(),
            Self::DriverDetail(id) => format!("/drivers/{id}/"),
            Self::DriverCreate => "/drivers/create/".to_string(),
            Self::DriverUpdate(id) => format!("/drivers/{id}/update/"),
            Self::DriverLicenseUpdate(id) => format!("/drivers/{id}/license/"),
            Self::DriverDelete(id) => format!("/drivers/{id}/delete/"),
            Self::CarList => "/cars/".to_string(),
            Self::CarDetail(id) => format!("/cars/{id}/"),
            Self::CarCreate => "/cars/create/".to_string(),
            Self::CarUpdate(id) => format!("/cars/{id}/update/"),
            Self::CarDelete(id) => format!("/cars/{id}/delete/"),
            Self::CarToggleAssignment(id) => format!("/cars/{id}/toggle-assign/"),
        }
    }

    /// Template the route renders.
    #[must_use]
    pub fn template(&self) -> &'static str {
        match self {
            Self::Index => "taxi/index.html",
            Self::Login => "registration/login.html",
            Self::Register => "registration/register.html",
            Self::ManufacturerList => "taxi/manufacturer_list.html",
            Self::ManufacturerCreate | Self::ManufacturerUpdate(_) => "taxi/manufacturer_form.html",
            Self::ManufacturerDelete(_) => "taxi/manufacturer_confirm_delete.html",
            Self::DriverList => "taxi/driver_list.html",
            Self::DriverDetail(_) => "taxi/driver_detail.html",
            Self::DriverCreate | Self::DriverUpdate(_) | Self::DriverLicenseUpdate(_) => {
                "taxi/driver_form.html"
            }
            Self::DriverDelete(_) => "taxi/driver_confirm_delete.html",
            Self::CarList => "taxi/car_list.html",
            Self::CarDetail(_) | Self::CarToggleAssignment(_) => "taxi/car_detail.html",
            Self::CarCreate | Self::CarUpdate(_) => "taxi/car_form.html",
            Self::CarDelete(_) => "taxi/car_confirm_delete.html",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What the routing layer should answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Render a template with a JSON context.
    Render {
        /// Template name.
        template: &'static str,
        /// Template context.
        context: Value,
    },
    /// Redirect after a successful write.
    Redirect {
        /// Target path.
        location: String,
    },
    /// Send an anonymous visitor to the login page.
    RedirectToLogin {
        /// Path to return to after signing in.
        next: String,
    },
    /// The record does not exist.
    NotFound,
    /// An unexpected failure.
    Error {
        /// Description for the error page.
        message: String,
    },
}

impl Outcome {
    /// Render `template` with `context` serialized to JSON.
    pub fn render<T: Serialize>(template: &'static str, context: &T) -> Self {
        match serde_json::to_value(context) {
            Ok(context) => Self::Render { template, context },
            Err(e) => Self::from_error(Route::Index, Error::from(e)),
        }
    }

    /// Outcome of a read on `route`: render its template on success.
    pub fn read<T: Serialize>(route: Route, result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::render(route.template(), &value),
            Err(e) => Self::from_error(route, e),
        }
    }

    /// Outcome of a write on `route`: redirect to `success(&value)` on success.
    pub fn write<T>(route: Route, result: Result<T>, success: impl FnOnce(&T) -> Route) -> Self {
        match result {
            Ok(value) => Self::Redirect {
                location: success(&value).path(),
            },
            Err(e) => Self::from_error(route, e),
        }
    }

    /// Outcome of a failed handler on `route`.
    #[must_use]
    pub fn from_error(route: Route, error: Error) -> Self {
        match error {
            Error::Unauthenticated => Self::RedirectToLogin { next: route.path() },
            Error::NotFound { .. } => Self::NotFound,
            Error::Validation(errors) => Self::Render {
                template: route.template(),
                context: json!({ "errors": errors }),
            },
            refused @ (Error::InvalidCredentials | Error::Protected { .. }) => Self::Render {
                template: route.template(),
                context: json!({ "errors": { NON_FIELD_ERRORS: [refused.to_string()] } }),
            },
            other => Self::Error {
                message: other.to_string(),
            },
        }
    }

    /// HTTP status code for the outcome.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Render { .. } => 200,
            Self::Redirect { .. } | Self::RedirectToLogin { .. } => 302,
            Self::NotFound => 404,
            Self::Error { .. } => 500,
        }
    }

    /// The `Location` header for redirects.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Redirect { location } => Some(location.clone()),
            Self::RedirectToLogin { next } => Some(format!("{LOGIN_PATH}?next={next}")),
            _ => None,
        }
    }
}
