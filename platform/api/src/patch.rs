//! JSON Patch operations over the mutable employee fields.
//!
//! Only `add`, `replace` and `remove` are meaningful for a flat record, and
//! only the four mutable fields may be targeted. Each operation is applied as
//! a pure `(copy, op) -> copy'` step; the caller validates the final copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    dto::UpdateEmployeeDto,
    validation::{FieldError, ValidationErrors},
};

pub type PatchDocument = Vec<PatchOperation>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn replace(path: &str, value: Value) -> Self {
        Self {
            op: "replace".into(),
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: &str) -> Self {
        Self {
            op: "remove".into(),
            path: path.into(),
            value: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Name,
    Email,
    Phone,
    Salary,
}

impl Field {
    fn from_path(path: &str) -> Option<Self> {
        let segment = path.strip_prefix('/').unwrap_or(path);
        match segment.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "salary" => Some(Self::Salary),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Set,
    Remove,
}

impl Action {
    fn parse(op: &str) -> Option<Self> {
        match op.to_ascii_lowercase().as_str() {
            "add" | "replace" => Some(Self::Set),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Apply a single operation, returning the updated copy.
pub fn apply_operation(
    mut copy: UpdateEmployeeDto,
    operation: &PatchOperation,
) -> Result<UpdateEmployeeDto, FieldError> {
    let action = Action::parse(&operation.op).ok_or_else(|| {
        FieldError::new(
            &operation.path,
            format!("Invalid JsonPatch operation '{}'.", operation.op),
        )
    })?;
    let field = Field::from_path(&operation.path).ok_or_else(|| {
        FieldError::new(
            &operation.path,
            format!(
                "The target location specified by path '{}' was not found.",
                operation.path
            ),
        )
    })?;
    let value = match action {
        Action::Set => operation.value.clone().unwrap_or(Value::Null),
        Action::Remove => Value::Null,
    };
    let invalid = || {
        FieldError::new(
            &operation.path,
            format!("The value '{value}' is invalid for target location."),
        )
    };

    match field {
        Field::Name => copy.name = string_value(&value).ok_or_else(invalid)?,
        Field::Email => copy.email = string_value(&value).ok_or_else(invalid)?,
        Field::Phone => copy.phone = string_value(&value).ok_or_else(invalid)?,
        Field::Salary => {
            copy.salary = match (action, &value) {
                (Action::Remove, _) => 0.0,
                (Action::Set, value) => number_value(value).ok_or_else(invalid)?,
            }
        }
    }
    Ok(copy)
}

/// Fold a whole document over the working copy, stopping at the first bad operation.
pub fn apply_patch(
    copy: UpdateEmployeeDto,
    document: &[PatchOperation],
) -> Result<UpdateEmployeeDto, ValidationErrors> {
    document
        .iter()
        .try_fold(copy, apply_operation)
        .map_err(ValidationErrors::from)
}

// `Some(None)` clears the field, `None` means the value has the wrong type.
fn string_value(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(text) => Some(Some(text.clone())),
        _ => None,
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
