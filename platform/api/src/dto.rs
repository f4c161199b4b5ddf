use entity::employees::{self, EmployeeFields};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationErrors, validate_fields};

/// Body of `POST /employees`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEmployeeDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub salary: f64,
}

impl AddEmployeeDto {
    pub fn validate(self) -> Result<EmployeeFields, ValidationErrors> {
        validate_fields(self.name, self.email, self.phone, self.salary)
    }
}

/// Body of `PUT /employees/{id}` and the working copy a patch is applied to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub salary: f64,
}

impl UpdateEmployeeDto {
    pub fn validate(self) -> Result<EmployeeFields, ValidationErrors> {
        validate_fields(self.name, self.email, self.phone, self.salary)
    }
}

impl From<&employees::Model> for UpdateEmployeeDto {
    fn from(model: &employees::Model) -> Self {
        Self {
            name: Some(model.name.clone()),
            email: Some(model.email.clone()),
            phone: model.phone.clone(),
            salary: model.salary,
        }
    }
}
