//! Integrations with external services

pub mod whatsapp;

pub use whatsapp::{VerificationSender, WhatsAppClient};
