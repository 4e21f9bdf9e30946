//! Field checks shared by the customer and product mutations.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::{CoreError, CoreResult};

/// Longest address accepted (RFC 5321).
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Column widths of `customers.name`, `customers.nickname` and `products.name`.
pub const NAME_MAX_LENGTH: usize = 255;
pub const NICKNAME_MAX_LENGTH: usize = 100;

/// Prices are stored as `NUMERIC(10,2)`.
pub const PRICE_SCALE: u32 = 2;
pub const PRICE_MAX: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);

static EMAIL_LOCAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[-!#$%&'*+/=?^_`{}|~0-9A-Z]+(\.[-!#$%&'*+/=?^_`{}|~0-9A-Z]+)*$")
        .expect("Invalid regex")
});

static EMAIL_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z0-9-]{1,62}[A-Z0-9]$")
        .expect("Invalid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+[0-9]{10,15}|[0-9]{3}-[0-9]{3}-[0-9]{4})$").expect("Invalid regex"));

pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > EMAIL_MAX_LENGTH {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if !EMAIL_LOCAL_RE.is_match(local) {
        return false;
    }

    domain.eq_ignore_ascii_case("localhost") || EMAIL_DOMAIN_RE.is_match(domain)
}

/// Accepts `+` followed by 10-15 digits, or `NNN-NNN-NNNN`.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn validate_email(email: &str) -> CoreResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(CoreError::ValidationError("Invalid email format.".to_string()))
    }
}

/// An absent or empty phone is valid; the field is optional.
pub fn validate_phone(phone: Option<&str>) -> CoreResult<()> {
    match phone {
        Some(p) if !p.is_empty() && !is_valid_phone(p) => {
            Err(CoreError::ValidationError("Invalid phone format.".to_string()))
        }
        _ => Ok(()),
    }
}

/// Lengths count characters, as `VARCHAR(n)` does.
pub fn is_too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

pub fn length_message(field: &str, max: usize) -> String {
    format!("{} must be at most {} characters", field, max)
}

pub fn validate_length(field: &str, value: &str, max: usize) -> CoreResult<()> {
    if is_too_long(value, max) {
        return Err(CoreError::ValidationError(format!("{}.", length_message(field, max))));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> CoreResult<()> {
    if price <= Decimal::ZERO {
        return Err(CoreError::ValidationError("Price must be positive.".to_string()));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(CoreError::ValidationError(format!(
            "Price must have at most {} decimal places.",
            PRICE_SCALE
        )));
    }
    if price > PRICE_MAX {
        return Err(CoreError::ValidationError(format!("Price must not exceed {}.", PRICE_MAX)));
    }
    Ok(())
}

pub fn validate_stock(stock: i32) -> CoreResult<()> {
    if stock < 0 {
        return Err(CoreError::ValidationError("Stock cannot be negative.".to_string()));
    }
    Ok(())
}

/// Blank optional text collapses to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("user.name+tag@domain.co.uk"));
        assert!(is_valid_email("admin@localhost"));
        assert!(is_valid_email("A.B@EXAMPLE.ORG"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-symbol"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@domain"));
        assert!(!is_valid_email("user@domain.c-"));
        assert!(!is_valid_email("user..name@example.com"));
        assert!(!is_valid_email(".user@example.com"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "a".repeat(250))));
    }

    #[test]
    fn test_phone_patterns() {
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("+123456789012345"));
        assert!(is_valid_phone("123-456-7890"));

        assert!(!is_valid_phone("+123456789"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("1234567890"));
        assert!(!is_valid_phone("123-4567-890"));
        assert!(!is_valid_phone("(123) 456-7890"));
        assert!(!is_valid_phone("+١٢٣٤٥٦٧٨٩٠"));
    }

    #[test]
    fn test_optional_phone() {
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("")).is_ok());
        let err = validate_phone(Some("abc")).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Invalid phone format.");
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(validate_length("Name", &"a".repeat(NAME_MAX_LENGTH), NAME_MAX_LENGTH).is_ok());
        assert!(validate_length("Name", &"é".repeat(NAME_MAX_LENGTH), NAME_MAX_LENGTH).is_ok());

        let err = validate_length("Nickname", &"a".repeat(150), NICKNAME_MAX_LENGTH).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Nickname must be at most 100 characters.");
    }

    #[test]
    fn test_price_rules() {
        assert!(validate_price(Decimal::from_str("999.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("5.50").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("5.500").unwrap()).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("1.999").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("100000000").unwrap()).is_err());
    }

    #[test]
    fn test_stock_rules() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(100).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(Some(" Al ".to_string())), Some("Al".to_string()));
        assert_eq!(normalize_optional(None), None);
    }
}
