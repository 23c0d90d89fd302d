//! Service layer: request orchestration between handlers and storage.
//!
//! Services own request validation, role-independent business sequencing
//! and response shaping. Role checks stay in the handlers; state
//! transitions stay in the repositories.

pub mod auth_service;
pub mod product_service;
pub mod voucher_service;

pub use auth_service::AuthService;
pub use product_service::ProductService;
pub use voucher_service::VoucherService;
