//! Shared types and models for the Mercado Express delivery platform
//!
//! This crate contains types shared between the backend and any future
//! companion components (admin panel, reporting jobs).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
