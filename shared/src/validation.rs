//! Validation utilities for the Mercado Express platform
//!
//! A single validation boundary lives at the HTTP layer; these helpers are
//! what that boundary calls. Services receive already-validated input.

use rust_decimal::Decimal;

/// Validate a phone number in international format: `+` followed by
/// 10-15 digits, first digit 1-9 (e.g. +51987654321).
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let Some(rest) = phone.strip_prefix('+') else {
        return Err("Phone must start with '+'");
    };
    if !(10..=15).contains(&rest.len()) {
        return Err("Phone must have 10-15 digits after '+'");
    }
    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone must contain only digits after '+'");
    }
    if rest.starts_with('0') {
        return Err("Phone country code cannot start with 0");
    }
    Ok(())
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || domain.len() < 3 || !domain.contains('.') {
        return Err("Invalid email format");
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a customer name (2-100 chars, not blank)
pub fn validate_customer_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.len() < 2 {
        return Err("Name must be at least 2 characters");
    }
    if trimmed.len() > 100 {
        return Err("Name is too long");
    }
    Ok(())
}

/// Validate an address / origin / destination field
pub fn validate_address(address: &str) -> Result<(), &'static str> {
    let trimmed = address.trim();
    if trimmed.len() < 10 {
        return Err("Address must be more specific (at least 10 characters)");
    }
    if trimmed.len() > 300 {
        return Err("Address is too long");
    }
    Ok(())
}

/// Validate a free-form description (custom orders, transport requests)
pub fn validate_description(description: &str) -> Result<(), &'static str> {
    let trimmed = description.trim();
    if trimmed.len() < 10 {
        return Err("Description must be more detailed (at least 10 characters)");
    }
    if trimmed.len() > 1000 {
        return Err("Description is too long");
    }
    Ok(())
}

/// Validate latitude/longitude ranges
pub fn validate_coordinates(lat: Decimal, lng: Decimal) -> Result<(), &'static str> {
    if lat < Decimal::from(-90) || lat > Decimal::from(90) {
        return Err("Latitude out of range");
    }
    if lng < Decimal::from(-180) || lng > Decimal::from(180) {
        return Err("Longitude out of range");
    }
    Ok(())
}

/// Validate product price: positive, at most two decimal places
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be positive");
    }
    if price.normalize().scale() > 2 {
        return Err("Price precision is limited to cents");
    }
    Ok(())
}

/// Validate preparation time estimate in minutes (1-120)
pub fn validate_preparation_time(minutes: i32) -> Result<(), &'static str> {
    if !(1..=120).contains(&minutes) {
        return Err("Preparation time must be between 1 and 120 minutes");
    }
    Ok(())
}

/// Validate an "HH:MM" schedule time string
pub fn validate_schedule_time(value: &str) -> Result<(), &'static str> {
    let Some((h, m)) = value.split_once(':') else {
        return Err("Time must be in HH:MM format");
    };
    let (Ok(h), Ok(m)) = (h.parse::<u32>(), m.parse::<u32>()) else {
        return Err("Time must be in HH:MM format");
    };
    if h > 23 || m > 59 {
        return Err("Time out of range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_phone_valid() {
        assert!(validate_phone("+51987654321").is_ok());
        assert!(validate_phone("+5198765432").is_ok()); // 10 digits
        assert!(validate_phone("+519876543210987").is_ok()); // 15 digits
    }

    #[test]
    fn test_validate_phone_invalid() {
        assert!(validate_phone("51987654321").is_err()); // no plus
        assert!(validate_phone("+519876543").is_err()); // 9 digits
        assert!(validate_phone("+5198765432109876").is_err()); // 16 digits
        assert!(validate_phone("+0198765432").is_err()); // leading zero
        assert!(validate_phone("+51 987654321").is_err()); // space
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cliente@example.com").is_ok());
        assert!(validate_email("a.b@dominio.pe").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@x.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secreto123").is_ok());
        assert!(validate_password("corta").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::from_str("10.50").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("0.01").unwrap()).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("1.999").unwrap()).is_err());
    }

    #[test]
    fn test_validate_preparation_time() {
        assert!(validate_preparation_time(1).is_ok());
        assert!(validate_preparation_time(120).is_ok());
        assert!(validate_preparation_time(0).is_err());
        assert!(validate_preparation_time(121).is_err());
    }

    #[test]
    fn test_validate_schedule_time() {
        assert!(validate_schedule_time("08:00").is_ok());
        assert!(validate_schedule_time("23:59").is_ok());
        assert!(validate_schedule_time("24:00").is_err());
        assert!(validate_schedule_time("8am").is_err());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("Av. Los Incas 742, Cusco").is_ok());
        assert!(validate_address("corta").is_err());
    }
}
