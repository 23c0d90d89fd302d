//! # bazario-core: Pure Business Logic for Bazario
//!
//! This crate is the **heart** of the Bazario voucher platform. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazario Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    REST Clients                                 │   │
//! │  │    Admin panel ──► Customer app ──► Merchant terminal           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum handlers + services)          │   │
//! │  │    generate, validate, redeem, share, my-vouchers, ...          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazario-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  discount │  │  codegen  │  │   │
//! │  │   │  Voucher  │  │   Money   │  │ Breakdown │  │ XXX-XXX-  │  │   │
//! │  │   │  Product  │  │ Discount  │  │   rules   │  │    XXX    │  │   │
//! │  │   │   User    │  │   Rate    │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazario-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Voucher, Product, User, CartItem, etc.)
//! - [`money`] - Money and DiscountRate types with integer arithmetic
//! - [`codegen`] - Human-readable voucher code generation
//! - [`discount`] - Cart-aware discount computation (pure)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Deterministic except for the RNG inside [`codegen`]
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paise/cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codegen;
pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use codegen::{generate_voucher_code, normalize_code, MAX_CODE_ATTEMPTS};
pub use discount::{compute_discount, DiscountBreakdown, DiscountTerms};
pub use error::{DiscountError, ValidationError};
pub use money::{DiscountRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in a single cart snapshot.
///
/// Carts are supplied by the caller per request and never persisted, so this
/// is the only place the size can be bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Category assigned to products created without one.
pub const DEFAULT_PRODUCT_CATEGORY: &str = "General";
