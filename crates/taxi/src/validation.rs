//! Field validation rules.
//!
//! Forms describe their fields as a table of `(field, value, rules)` entries
//! and [`validate_fields`] runs the table, accumulating every failure into a
//! [`FieldErrors`] map instead of stopping at the first one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Length of a driver license number.
pub const LICENSE_NUMBER_LENGTH: usize = 8;

/// Number of leading uppercase letters in a license number.
const LICENSE_LETTERS: usize = 3;

/// Message used when a required field is blank.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// A single rule applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The value must not be blank.
    Required,
    /// The value must have at most this many characters.
    MaxLength(usize),
    /// The value must be a well-formed license number.
    LicenseNumber,
    /// The value may only contain letters, digits and `@.+-_`.
    Username,
}

impl Rule {
    /// Check `value` against this rule, returning the failure message.
    #[must_use]
    pub fn check(self, value: &str) -> Option<String> {
        match self {
            Self::Required => value
                .trim()
                .is_empty()
                .then(|| REQUIRED_MESSAGE.to_string()),
            Self::MaxLength(max) => {
                let len = value.chars().count();
                (len > max).then(|| {
                    format!("Ensure this value has at most {max} characters (it has {len}).")
                })
            }
            Self::LicenseNumber => validate_license_number(value).err(),
            Self::Username => (!USERNAME_RE.is_match(value)).then(|| {
                "Enter a valid username. This value may contain only letters, \
                 numbers, and @/./+/-/_ characters."
                    .to_string()
            }),
        }
    }
}

/// Validate a driver license number.
///
/// A valid number is exactly 8 characters: 3 uppercase ASCII letters followed
/// by 5 ASCII digits, e.g. `AAA12345`.
///
/// # Errors
///
/// Returns a message describing the first violated part of the format.
pub fn validate_license_number(license_number: &str) -> Result<(), String> {
    if license_number.chars().count() != LICENSE_NUMBER_LENGTH {
        return Err(format!(
            "License number should consist of {LICENSE_NUMBER_LENGTH} characters"
        ));
    }

    let mut chars = license_number.chars();
    if !chars
        .by_ref()
        .take(LICENSE_LETTERS)
        .all(|c| c.is_ascii_uppercase())
    {
        return Err("First 3 characters should be uppercase letters".to_string());
    }
    if !chars.all(|c| c.is_ascii_digit()) {
        return Err("Last 5 characters should be digits".to_string());
    }
    Ok(())
}

/// Accumulated validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded for a field (empty if none).
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether a field has at least one message.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, messages)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Merge another error set into this one.
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when empty, otherwise the errors themselves.
    ///
    /// # Errors
    ///
    /// Returns `self` if any field failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Run a table of field rules and collect every failure.
///
/// A blank value that fails [`Rule::Required`] is not checked against the
/// remaining rules for that field. Blank optional values skip all rules.
#[must_use]
pub fn validate_fields(fields: &[(&str, &str, &[Rule])]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for &(field, value, rules) in fields {
        let blank = value.trim().is_empty();
        if blank && !rules.contains(&Rule::Required) {
            continue;
        }
        for rule in rules {
            if let Some(message) = rule.check(value) {
                errors.add(field, message);
                if *rule == Rule::Required {
                    break;
                }
            }
        }
    }
    errors
}
