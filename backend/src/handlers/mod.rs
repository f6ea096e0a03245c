//! HTTP request handlers
//!
//! Handlers stay thin: validate input at the boundary, delegate to a
//! service, wrap the result in the response envelope.

pub mod audit;
pub mod auth;
pub mod business;
pub mod health;
pub mod order;
pub mod product;
pub mod users;

use crate::error::{AppError, AppResult};

/// Lift a field-level validation result into an application error
pub(crate) fn check(field: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|message| AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    })
}
