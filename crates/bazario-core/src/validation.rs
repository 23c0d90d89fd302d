//! # Validation Module
//!
//! Input validation for Bazario requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: axum extractors (Rust)                                       │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: business rule validation in the services             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (voucher code, username)                       │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: both layers catch different errors                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Account Fields
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - Must not be empty, 3–40 characters
/// - Letters, digits, `.`, `-`, `_` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.len() > 40 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 40,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a password: at least 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

// =============================================================================
// Voucher Fields
// =============================================================================

/// Validates a voucher discount value in percent. Must be non-negative.
pub fn validate_voucher_value(value_pct: f64) -> ValidationResult<()> {
    if !value_pct.is_finite() || value_pct < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "value".to_string(),
        });
    }
    Ok(())
}

/// Validates an expiry window: a positive whole number of days.
pub fn validate_expiry_days(days: i64) -> ValidationResult<()> {
    if days < 1 {
        return Err(ValidationError::MustBePositive {
            field: "expiry_days".to_string(),
        });
    }
    Ok(())
}

/// Validates a minimum purchase amount in paise.
pub fn validate_min_purchase(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "min_purchase_amount".to_string(),
        });
    }
    Ok(())
}

/// Validates a discount cap in paise, when supplied.
pub fn validate_max_discount(cents: Option<i64>) -> ValidationResult<()> {
    if let Some(cents) = cents {
        if cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "max_discount_amount".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Product & Cart Fields
// =============================================================================

/// Validates a product name: non-empty, at most 120 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 120,
        });
    }
    Ok(())
}

/// Validates a product price in paise.
pub fn validate_price(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a cart snapshot: bounded size, positive quantities,
/// non-negative unit prices.
pub fn validate_cart(items: &[crate::types::CartItem]) -> ValidationResult<()> {
    if items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::TooLong {
            field: "cart_items".to_string(),
            max: MAX_CART_ITEMS,
        });
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cart_items.product_id".to_string(),
            });
        }
        if item.quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "cart_items.quantity".to_string(),
            });
        }
        if item.unit_price_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "cart_items.unit_price".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CartItem;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("ravi_kumar").is_ok());
        assert!(validate_username("a.b-c_9").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(41)).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("abc").is_err());
    }

    #[test]
    fn test_voucher_value_rules() {
        assert!(validate_voucher_value(0.0).is_ok());
        assert!(validate_voucher_value(20.0).is_ok());
        assert!(validate_voucher_value(-1.0).is_err());
        assert!(validate_voucher_value(f64::NAN).is_err());
    }

    #[test]
    fn test_expiry_days_rules() {
        assert!(validate_expiry_days(1).is_ok());
        assert!(validate_expiry_days(30).is_ok());
        assert!(validate_expiry_days(0).is_err());
        assert!(validate_expiry_days(-5).is_err());
    }

    #[test]
    fn test_cart_rules() {
        let good = vec![CartItem {
            product_id: "p1".to_string(),
            quantity: 1,
            unit_price_cents: 100,
        }];
        assert!(validate_cart(&good).is_ok());

        let zero_qty = vec![CartItem {
            product_id: "p1".to_string(),
            quantity: 0,
            unit_price_cents: 100,
        }];
        assert!(validate_cart(&zero_qty).is_err());

        let oversized: Vec<CartItem> = (0..=MAX_CART_ITEMS)
            .map(|i| CartItem {
                product_id: format!("p{i}"),
                quantity: 1,
                unit_price_cents: 100,
            })
            .collect();
        assert!(validate_cart(&oversized).is_err());
    }
}
