//! Domain models for the Mercado Express platform

pub mod business;
pub mod order;
pub mod product;
pub mod user;

pub use business::*;
pub use order::*;
pub use product::*;
pub use user::*;
