//! Field constraints shared by create, full update and patch.

use std::collections::BTreeMap;

use entity::employees::EmployeeFields;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

pub const NAME_MIN_CHARS: usize = 2;

/// A single violated constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Violations grouped per field, serialized as `{ field: [messages] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        let mut grouped = Self::default();
        for FieldError { field, message } in errors {
            grouped.add(field, message);
        }
        grouped
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self::from(vec![error])
    }
}

pub fn check_name(name: Option<&str>) -> Option<FieldError> {
    match name {
        None => Some(FieldError::new("name", "Name is required.")),
        Some(value) if value.trim().is_empty() => {
            Some(FieldError::new("name", "Name is required."))
        }
        Some(value) if value.chars().count() < NAME_MIN_CHARS => Some(FieldError::new(
            "name",
            format!("Name must be at least {NAME_MIN_CHARS} characters."),
        )),
        Some(_) => None,
    }
}

pub fn check_email(email: Option<&str>) -> Option<FieldError> {
    match email {
        None => Some(FieldError::new("email", "Email is required.")),
        Some(value) if value.trim().is_empty() => {
            Some(FieldError::new("email", "Email is required."))
        }
        Some(value) if !value.validate_email() => {
            Some(FieldError::new("email", "Invalid email address format."))
        }
        Some(_) => None,
    }
}

pub fn check_salary(salary: f64) -> Option<FieldError> {
    if salary.is_finite() && salary >= 0.0 {
        None
    } else {
        Some(FieldError::new("salary", "Salary must be a positive value."))
    }
}

/// Run every constraint and list the failures in field order.
pub fn check_all(name: Option<&str>, email: Option<&str>, salary: f64) -> Vec<FieldError> {
    [check_name(name), check_email(email), check_salary(salary)]
        .into_iter()
        .flatten()
        .collect()
}

/// Validate raw input and, when every constraint holds, produce the columns to persist.
pub fn validate_fields(
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    salary: f64,
) -> Result<EmployeeFields, ValidationErrors> {
    let errors = check_all(name.as_deref(), email.as_deref(), salary);
    match (name, email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(EmployeeFields {
            name,
            email,
            phone,
            salary,
        }),
        _ => Err(ValidationErrors::from(errors)),
    }
}
