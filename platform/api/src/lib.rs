//! Shared HTTP surface primitives for the employee directory.
//!
//! Everything the server hands back to a client goes through [`ApiResponse`],
//! and every failure is an [`ApiError`]. Input DTOs and the JSON Patch engine
//! live here so they can be exercised without a database.

pub mod dto;
pub mod error;
pub mod patch;
pub mod response;
pub mod validation;

pub use dto::{AddEmployeeDto, UpdateEmployeeDto};
pub use error::{ApiError, ApiResult, internal_error};
pub use patch::{PatchDocument, PatchOperation, apply_patch};
pub use response::{ApiJson, ApiResponse, Created};
pub use validation::{FieldError, ValidationErrors};
