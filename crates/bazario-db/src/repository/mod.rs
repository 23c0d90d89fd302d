//! # Repository Module
//!
//! Database repository implementations for Bazario.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service layer (apps/api)                                              │
//! │       │                                                                 │
//! │       │  db.vouchers().redeem_atomic(code, merchant, now)              │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  VoucherRepository                                                     │
//! │  ├── find_by_code(&self, code)                                         │
//! │  ├── insert(&self, voucher)                                            │
//! │  ├── redeem_atomic(&self, code, merchant_id, now)                      │
//! │  └── transfer_atomic(&self, code, from, to, now)                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The atomicity-critical statements live next to each other           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`] - Accounts and credential storage
//! - [`product::ProductRepository`] - Product catalog CRUD
//! - [`voucher::VoucherRepository`] - Voucher lifecycle storage, including
//!   the atomic conditional updates

pub mod product;
pub mod user;
pub mod voucher;
