//! # bazario-db: Database Layer for Bazario
//!
//! This crate provides database access for the Bazario voucher platform.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazario Data Flow                                │
//! │                                                                         │
//! │  axum handler (POST /api/vouchers/merchant/redeem)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazario-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (voucher.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ VoucherRepo   │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ UserRepo      │    │              │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (./bazario.db)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The One Correctness-Critical Section
//!
//! Redemption must be a single atomic match-and-mutate:
//! `UPDATE vouchers SET status='used', ... WHERE code=? AND status='unused'
//! AND expiry_date > ?`. Two merchants racing on the same code produce
//! exactly one row update; the loser reads the voucher afterwards only to
//! produce a precise error. [`repository::voucher::VoucherRepository`] owns
//! this primitive, and the analogous owner-conditioned transfer.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
pub use repository::voucher::VoucherRepository;
