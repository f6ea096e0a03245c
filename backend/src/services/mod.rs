//! Business logic services

pub mod audit;
pub mod auth;
pub mod business;
pub mod order;
pub mod product;
pub mod tokens;
pub mod users;
pub mod verification;
