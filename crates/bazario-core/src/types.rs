//! # Domain Types
//!
//! Core domain types used throughout Bazario.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Voucher      │   │    Product      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (business)│   │  name           │   │  username       │       │
//! │  │  status         │   │  price_cents    │   │  role           │       │
//! │  │  value_bps      │   │  stock          │   │  password_hash  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  VoucherStatus  │   │   ShareEntry    │   │    CartItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Unused         │   │  from_user_id   │   │  product_id     │       │
//! │  │  Used           │   │  to_user_id     │   │  quantity       │       │
//! │  │  (monotonic)    │   │  shared_at      │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A voucher has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: human-readable business identifier (`XXX-XXX-XXX`), the key
//!   customers and merchants actually exchange

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::discount::DiscountTerms;
use crate::money::{DiscountRate, Money};

// =============================================================================
// Roles
// =============================================================================

/// Caller role, resolved from the bearer token before any operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Receives, holds, shares and lists vouchers.
    Customer,
    /// Validates and redeems vouchers at the terminal.
    Merchant,
    /// Issues vouchers and manages the catalog.
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

impl Role {
    /// Stable lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Merchant => "merchant",
            Role::Admin => "admin",
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account: customer, merchant or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name, unique across the system.
    pub username: String,

    /// Argon2 hash of the password. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,

    /// Merchant-only display details.
    pub store_name: Option<String>,
    pub store_location: Option<String>,

    /// Soft-delete / suspension flag.
    pub is_active: bool,

    /// Currently valid refresh token, if the user is logged in.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product a voucher can be scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price in paise.
    pub price_cents: i64,
    pub category: String,
    pub stock: i64,
    /// Soft-delete flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Voucher Status
// =============================================================================

/// Lifecycle state of a voucher.
///
/// The transition is monotonic: `Unused → Used`, never back. A used voucher
/// stays in the store forever as an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Live; may be validated, shared or redeemed (subject to expiry).
    Unused,
    /// Redeemed exactly once; immutable from here on.
    Used,
}

impl Default for VoucherStatus {
    fn default() -> Self {
        VoucherStatus::Unused
    }
}

// =============================================================================
// Voucher
// =============================================================================

/// A redeemable discount code with a value, owner and lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Voucher {
    pub id: String,

    /// Uppercase business code (`XXX-XXX-XXX`). Immutable after creation.
    pub code: String,

    /// The user currently entitled to redeem or share. Mutates on sharing.
    pub current_owner_id: String,

    /// The user the voucher was first issued to. Immutable.
    pub original_owner_id: String,

    /// Discount value in basis points (2000 = 20%).
    pub value_bps: u32,

    pub status: VoucherStatus,

    /// Unusable at or after this instant. Stored as a UTC instant;
    /// localized only at the response boundary.
    pub expiry_date: DateTime<Utc>,

    /// Set exactly once, atomically with the `Used` transition.
    pub redeemed_at: Option<DateTime<Utc>>,
    pub redeemed_by: Option<String>,

    pub description: String,

    /// Denormalized: true once the share history is non-empty. Written only
    /// inside the transfer transaction that appends the history entry.
    pub is_shared: bool,

    /// Capability flag; false permanently disallows sharing.
    pub can_be_shared: bool,

    /// Product ids the discount is scoped to. Empty = whole cart.
    /// Lives in its own table; the repository fills it in after row decode.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub applicable_products: Vec<String>,

    /// Floor on cart value (paise) required to redeem.
    pub min_purchase_cents: i64,

    /// Optional cap on the absolute discount (paise). None = uncapped.
    pub max_discount_cents: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Voucher {
    /// Returns the discount rate.
    #[inline]
    pub fn rate(&self) -> DiscountRate {
        DiscountRate::from_bps(self.value_bps)
    }

    /// True when `now` is at or past the expiry instant.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_date
    }

    /// True when the voucher can still be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == VoucherStatus::Unused && !self.is_expired(now)
    }

    /// The cart-applicability terms for the discount calculator.
    pub fn discount_terms(&self) -> DiscountTerms {
        DiscountTerms {
            rate: self.rate(),
            applicable_products: self.applicable_products.clone(),
            min_purchase: Money::from_cents(self.min_purchase_cents),
            max_discount: self.max_discount_cents.map(Money::from_cents),
        }
    }

    /// Checks the redemption-state invariant:
    /// `status == Used` ⟺ both redemption fields are set.
    pub fn redemption_state_consistent(&self) -> bool {
        match self.status {
            VoucherStatus::Used => self.redeemed_at.is_some() && self.redeemed_by.is_some(),
            VoucherStatus::Unused => self.redeemed_at.is_none() && self.redeemed_by.is_none(),
        }
    }
}

// =============================================================================
// Share Entry
// =============================================================================

/// One transfer in a voucher's sharing history. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShareEntry {
    pub id: String,
    pub voucher_id: String,
    /// Owner who gave the voucher away.
    pub from_user_id: String,
    /// Recipient, who became the current owner at `shared_at`.
    pub to_user_id: String,
    pub shared_at: DateTime<Utc>,
}

// =============================================================================
// Cart Item
// =============================================================================

/// One line of a caller-supplied cart snapshot. Carts are not persisted;
/// the merchant terminal sends the snapshot with each validation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in paise at the terminal.
    pub unit_price_cents: i64,
}

impl CartItem {
    /// Line total (quantity × unit price).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.quantity * self.unit_price_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_voucher() -> Voucher {
        let now = Utc::now();
        Voucher {
            id: "v-1".to_string(),
            code: "ABC-DEF-GHJ".to_string(),
            current_owner_id: "u-1".to_string(),
            original_owner_id: "u-1".to_string(),
            value_bps: 2000,
            status: VoucherStatus::Unused,
            expiry_date: now + Duration::days(7),
            redeemed_at: None,
            redeemed_by: None,
            description: "20% voucher".to_string(),
            is_shared: false,
            can_be_shared: true,
            applicable_products: vec![],
            min_purchase_cents: 0,
            max_discount_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_voucher_expiry_boundary() {
        let v = sample_voucher();
        // Strictly before expiry: redeemable
        assert!(!v.is_expired(v.expiry_date - Duration::seconds(1)));
        // At the expiry instant: expired
        assert!(v.is_expired(v.expiry_date));
        assert!(v.is_expired(v.expiry_date + Duration::seconds(1)));
    }

    #[test]
    fn test_redemption_state_invariant() {
        let mut v = sample_voucher();
        assert!(v.redemption_state_consistent());

        // Used with both fields set: consistent
        v.status = VoucherStatus::Used;
        v.redeemed_at = Some(Utc::now());
        v.redeemed_by = Some("m-1".to_string());
        assert!(v.redemption_state_consistent());

        // Used with a missing field: inconsistent
        v.redeemed_by = None;
        assert!(!v.redemption_state_consistent());
    }

    #[test]
    fn test_cart_item_line_total() {
        let item = CartItem {
            product_id: "p-1".to_string(),
            quantity: 3,
            unit_price_cents: 1099,
        };
        assert_eq!(item.line_total().cents(), 3297);
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::default(), Role::Customer);
    }
}
