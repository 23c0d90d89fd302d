//! Voucher lifecycle service.
//!
//! Sequences the voucher operations: issue, validate, redeem, share, list
//! and history. The ordering of failure checks is part of the API contract:
//! a used voucher reports "already redeemed" even when it has also expired,
//! because the redemption is the more specific fact.
//!
//! ## Race Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The service pre-checks state to produce precise diagnostics, but       │
//! │  NEVER trusts those checks for the transition itself:                   │
//! │                                                                         │
//! │    pre-check (diagnostics only)                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    conditional UPDATE in bazario-db  ◄── the only decision point        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    0 rows? re-read and diagnose again (someone else won the race)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use bazario_core::codegen::is_valid_code_format;
use bazario_core::validation::{
    validate_cart, validate_expiry_days, validate_max_discount, validate_min_purchase,
    validate_voucher_value,
};
use bazario_core::{
    compute_discount, generate_voucher_code, normalize_code, CartItem, DiscountBreakdown,
    DiscountRate, Role, Voucher, VoucherStatus, MAX_CODE_ATTEMPTS,
};

use crate::auth::AuthContext;
use crate::display::format_ist;
use crate::error::ApiError;
use crate::AppState;

/// Voucher lifecycle service.
pub struct VoucherService {
    state: AppState,
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateVoucherRequest {
    /// Username of the customer the voucher is issued to.
    pub username: String,
    /// Discount value in percent (e.g. `20.0`).
    pub value: f64,
    /// Calendar days until expiry, counted from issue time.
    pub expiry_days: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub can_be_shared: Option<bool>,
    /// Product ids the discount is scoped to. Empty or absent = whole cart.
    #[serde(default)]
    pub applicable_products: Option<Vec<String>>,
    #[serde(default)]
    pub min_purchase_cents: Option<i64>,
    #[serde(default)]
    pub max_discount_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ShareVoucherRequest {
    pub code: String,
    /// Username of the receiving customer.
    pub to_username: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateWithCartRequest {
    pub code: String,
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
    /// Optional cart snapshot; when present the discount is computed and
    /// the voucher's cart conditions are enforced before redemption.
    #[serde(default)]
    pub cart_items: Option<Vec<CartItem>>,
}

/// Client-facing voucher representation. Timestamps are IST strings;
/// user ids are resolved to usernames.
#[derive(Debug, Serialize)]
pub struct VoucherView {
    pub code: String,
    /// Discount value in percent.
    pub value: f64,
    pub status: VoucherStatus,
    pub owner: String,
    pub original_owner: String,
    pub description: String,
    pub is_shared: bool,
    pub can_be_shared: bool,
    /// Transfer count; populated for the `available` partition of a
    /// customer's voucher list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times_shared: Option<i64>,
    pub applicable_products: Vec<String>,
    pub min_purchase_cents: i64,
    pub max_discount_cents: Option<i64>,
    pub expiry_date: String,
    pub redeemed_at: Option<String>,
    pub redeemed_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ShareView {
    pub from: String,
    pub to: String,
    pub shared_at: String,
}

#[derive(Debug, Serialize)]
pub struct SharingHistoryView {
    pub code: String,
    pub original_owner: String,
    pub current_owner: String,
    pub share_count: usize,
    pub history: Vec<ShareView>,
}

/// Customer voucher list, partitioned by usability.
#[derive(Debug, Serialize)]
pub struct MyVouchersView {
    pub available: Vec<VoucherView>,
    pub expired: Vec<VoucherView>,
    pub used: Vec<VoucherView>,
}

// =============================================================================
// Implementation
// =============================================================================

impl VoucherService {
    pub fn new(state: &AppState) -> Self {
        VoucherService {
            state: state.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Issue
    // -------------------------------------------------------------------------

    /// Issues a new voucher to a customer (admin operation).
    ///
    /// Codes are generated randomly and inserted under the UNIQUE index;
    /// a collision is retried with a fresh code, up to [`MAX_CODE_ATTEMPTS`].
    pub async fn create(&self, req: CreateVoucherRequest) -> Result<VoucherView, ApiError> {
        validate_voucher_value(req.value)?;
        validate_expiry_days(req.expiry_days)?;
        validate_min_purchase(req.min_purchase_cents.unwrap_or(0))?;
        validate_max_discount(req.max_discount_cents)?;

        let owner = self
            .state
            .db
            .users()
            .find_by_username(req.username.trim())
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User not found: {}", req.username)))?;

        if owner.role != Role::Customer {
            return Err(ApiError::InvalidArgument(
                "Vouchers can only be issued to customers".to_string(),
            ));
        }
        if !owner.is_active {
            return Err(ApiError::InvalidArgument(
                "Cannot issue a voucher to a disabled account".to_string(),
            ));
        }

        let applicable_products = self
            .checked_product_scope(req.applicable_products.unwrap_or_default())
            .await?;

        let rate = DiscountRate::from_percentage(req.value);
        let description = req
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{rate} voucher"));

        let now = Utc::now();
        // Calendar days, not 86400-second multiples: a "30 day" voucher
        // issued at 10:05 expires at 10:05 on the 30th day even across DST
        // shifts of any display timezone.
        let expiry_date = now
            .checked_add_days(Days::new(req.expiry_days as u64))
            .ok_or_else(|| ApiError::InvalidArgument("expiry_days is too large".to_string()))?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let voucher = Voucher {
                id: Uuid::new_v4().to_string(),
                code: generate_voucher_code(),
                current_owner_id: owner.id.clone(),
                original_owner_id: owner.id.clone(),
                value_bps: rate.bps(),
                status: VoucherStatus::Unused,
                expiry_date,
                redeemed_at: None,
                redeemed_by: None,
                description: description.clone(),
                is_shared: false,
                can_be_shared: req.can_be_shared.unwrap_or(true),
                applicable_products: applicable_products.clone(),
                min_purchase_cents: req.min_purchase_cents.unwrap_or(0),
                max_discount_cents: req.max_discount_cents,
                created_at: now,
                updated_at: now,
            };

            match self.state.db.vouchers().insert(&voucher).await {
                Ok(()) => {
                    info!(code = %voucher.code, owner = %owner.username, "Voucher issued");
                    return self.view(&voucher).await;
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(attempt, "Voucher code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::Internal(
            "Could not allocate a unique voucher code".to_string(),
        ))
    }

    // -------------------------------------------------------------------------
    // Validate
    // -------------------------------------------------------------------------

    /// Checks whether a voucher is currently redeemable (merchant operation).
    pub async fn validate(&self, code: &str) -> Result<VoucherView, ApiError> {
        let voucher = self.lookup_valid(code, Utc::now()).await?;
        self.view(&voucher).await
    }

    /// Validates a voucher against a cart snapshot and computes the discount
    /// it would yield, without redeeming anything.
    pub async fn validate_with_cart(
        &self,
        code: &str,
        cart: &[CartItem],
    ) -> Result<(VoucherView, DiscountBreakdown), ApiError> {
        let voucher = self.lookup_valid(code, Utc::now()).await?;
        validate_cart(cart)?;
        let breakdown = compute_discount(&voucher.discount_terms(), cart)?;
        Ok((self.view(&voucher).await?, breakdown))
    }

    // -------------------------------------------------------------------------
    // Redeem
    // -------------------------------------------------------------------------

    /// Redeems a voucher exactly once (merchant operation).
    ///
    /// When a cart is supplied, the discount is computed (and the voucher's
    /// cart conditions enforced) before the state transition, so a cart that
    /// fails the minimum-purchase rule never consumes the voucher.
    pub async fn redeem(
        &self,
        merchant_id: &str,
        code: &str,
        cart: Option<&[CartItem]>,
    ) -> Result<(VoucherView, Option<DiscountBreakdown>), ApiError> {
        let now = Utc::now();
        let code = self.checked_code(code)?;
        let voucher = self.lookup_valid(&code, now).await?;

        let breakdown = match cart {
            Some(items) => {
                validate_cart(items)?;
                Some(compute_discount(&voucher.discount_terms(), items)?)
            }
            None => None,
        };

        match self
            .state
            .db
            .vouchers()
            .redeem_atomic(&code, merchant_id, now)
            .await?
        {
            Some(redeemed) => Ok((self.view(&redeemed).await?, breakdown)),
            // Lost a race between the pre-check and the update
            None => Err(self.diagnose(&code).await?),
        }
    }

    // -------------------------------------------------------------------------
    // Share
    // -------------------------------------------------------------------------

    /// Transfers a voucher to another customer (customer operation).
    pub async fn share(
        &self,
        user_id: &str,
        req: ShareVoucherRequest,
    ) -> Result<VoucherView, ApiError> {
        let now = Utc::now();
        let code = self.checked_code(&req.code)?;

        let voucher = self
            .state
            .db
            .vouchers()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Voucher not found".to_string()))?;

        if voucher.current_owner_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the current owner can share this voucher".to_string(),
            ));
        }
        // A redeemed or expired voucher reports that fact even when it is
        // also non-shareable; the lifecycle state is the more specific one.
        if voucher.status == VoucherStatus::Used {
            return Err(ApiError::AlreadyRedeemed {
                redeemed_at: voucher.redeemed_at,
            });
        }
        if voucher.is_expired(now) {
            return Err(ApiError::Expired {
                expiry_date: voucher.expiry_date,
            });
        }
        if !voucher.can_be_shared {
            return Err(ApiError::Conflict(
                "This voucher cannot be shared".to_string(),
            ));
        }

        let recipient = self
            .state
            .db
            .users()
            .find_by_username(req.to_username.trim())
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Recipient not found: {}", req.to_username))
            })?;

        if recipient.id == user_id {
            return Err(ApiError::Conflict(
                "Cannot share a voucher with yourself".to_string(),
            ));
        }
        if recipient.role != Role::Customer {
            return Err(ApiError::InvalidArgument(
                "Vouchers can only be shared with customers".to_string(),
            ));
        }
        if !recipient.is_active {
            return Err(ApiError::InvalidArgument(
                "Cannot share a voucher with a disabled account".to_string(),
            ));
        }
        if self
            .state
            .db
            .vouchers()
            .has_prior_share(&voucher.id, user_id, &recipient.id)
            .await?
        {
            return Err(ApiError::Conflict(format!(
                "Voucher was already shared with {}",
                recipient.username
            )));
        }

        let transferred = self
            .state
            .db
            .vouchers()
            .transfer_atomic(&code, user_id, &recipient.id, now)
            .await?;

        if !transferred {
            // Ownership (or state) changed between the checks and the update
            return Err(self.diagnose_share(&code, user_id).await?);
        }

        info!(code = %code, to = %recipient.username, "Voucher shared");

        let voucher = self
            .state
            .db
            .vouchers()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::Internal("Voucher vanished after transfer".to_string()))?;
        self.view(&voucher).await
    }

    // -------------------------------------------------------------------------
    // History & Listing
    // -------------------------------------------------------------------------

    /// Returns a voucher's transfer log.
    ///
    /// Visible to admins and to anyone who held the voucher at some point:
    /// the original owner, the current owner, and every share participant.
    pub async fn sharing_history(
        &self,
        ctx: &AuthContext,
        code: &str,
    ) -> Result<SharingHistoryView, ApiError> {
        let code = self.checked_code(code)?;

        let voucher = self
            .state
            .db
            .vouchers()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Voucher not found".to_string()))?;

        let allowed = ctx.role == Role::Admin
            || voucher.current_owner_id == ctx.user_id
            || voucher.original_owner_id == ctx.user_id
            || self
                .state
                .db
                .vouchers()
                .is_share_participant(&voucher.id, &ctx.user_id)
                .await?;

        if !allowed {
            return Err(ApiError::Forbidden(
                "You are not a participant in this voucher's history".to_string(),
            ));
        }

        let shares = self.state.db.vouchers().shares_for(&voucher.id).await?;

        let mut names = HashMap::new();
        let mut history = Vec::with_capacity(shares.len());
        for share in &shares {
            history.push(ShareView {
                from: self.username_of(&mut names, &share.from_user_id).await?,
                to: self.username_of(&mut names, &share.to_user_id).await?,
                shared_at: format_ist(share.shared_at),
            });
        }

        Ok(SharingHistoryView {
            code: voucher.code.clone(),
            original_owner: self
                .username_of(&mut names, &voucher.original_owner_id)
                .await?,
            current_owner: self
                .username_of(&mut names, &voucher.current_owner_id)
                .await?,
            share_count: shares.len(),
            history,
        })
    }

    /// Lists the caller's vouchers, partitioned into available / expired /
    /// used (customer operation). The status filter is applied before
    /// partitioning; available vouchers carry their share count.
    pub async fn my_vouchers(
        &self,
        user_id: &str,
        status: Option<VoucherStatus>,
    ) -> Result<MyVouchersView, ApiError> {
        let now = Utc::now();
        let vouchers = self
            .state
            .db
            .vouchers()
            .list_for_owner(user_id, status)
            .await?;

        let mut names = HashMap::new();
        let mut view = MyVouchersView {
            available: Vec::new(),
            expired: Vec::new(),
            used: Vec::new(),
        };

        for voucher in &vouchers {
            let mut v = self.view_cached(voucher, &mut names).await?;
            match voucher.status {
                VoucherStatus::Used => view.used.push(v),
                VoucherStatus::Unused if voucher.is_expired(now) => view.expired.push(v),
                VoucherStatus::Unused => {
                    v.times_shared =
                        Some(self.state.db.vouchers().count_shares(&voucher.id).await?);
                    view.available.push(v);
                }
            }
        }

        Ok(view)
    }

    /// Lists every voucher in the system with optional status and owner
    /// filters (admin operation).
    pub async fn list_all(
        &self,
        status: Option<VoucherStatus>,
        owner_id: Option<&str>,
    ) -> Result<Vec<VoucherView>, ApiError> {
        if let Some(id) = owner_id {
            self.state
                .db
                .users()
                .find_by_id(id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("User not found: {id}")))?;
        }

        let vouchers = self.state.db.vouchers().list_all(status, owner_id).await?;

        let mut names = HashMap::new();
        let mut views = Vec::with_capacity(vouchers.len());
        for voucher in &vouchers {
            views.push(self.view_cached(voucher, &mut names).await?);
        }
        Ok(views)
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    /// Normalizes and shape-checks a caller-supplied code.
    fn checked_code(&self, code: &str) -> Result<String, ApiError> {
        let code = normalize_code(code);
        if !is_valid_code_format(&code) {
            return Err(ApiError::InvalidArgument(
                "Invalid voucher code format".to_string(),
            ));
        }
        Ok(code)
    }

    /// Looks a voucher up and applies the ordered failure checks:
    /// unknown → already redeemed → expired.
    async fn lookup_valid(&self, code: &str, now: DateTime<Utc>) -> Result<Voucher, ApiError> {
        let code = self.checked_code(code)?;

        let voucher = self
            .state
            .db
            .vouchers()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Voucher not found".to_string()))?;

        if voucher.status == VoucherStatus::Used {
            return Err(ApiError::AlreadyRedeemed {
                redeemed_at: voucher.redeemed_at,
            });
        }
        if voucher.is_expired(now) {
            return Err(ApiError::Expired {
                expiry_date: voucher.expiry_date,
            });
        }

        Ok(voucher)
    }

    /// Re-reads a voucher after a failed conditional redemption to name
    /// the reason.
    async fn diagnose(&self, code: &str) -> Result<ApiError, ApiError> {
        Ok(match self.state.db.vouchers().find_by_code(code).await? {
            None => ApiError::NotFound("Voucher not found".to_string()),
            Some(v) if v.status == VoucherStatus::Used => ApiError::AlreadyRedeemed {
                redeemed_at: v.redeemed_at,
            },
            Some(v) if v.is_expired(Utc::now()) => ApiError::Expired {
                expiry_date: v.expiry_date,
            },
            Some(_) => ApiError::Conflict("Voucher state changed, please retry".to_string()),
        })
    }

    /// Re-reads a voucher after a failed conditional transfer.
    async fn diagnose_share(&self, code: &str, from_user_id: &str) -> Result<ApiError, ApiError> {
        Ok(match self.state.db.vouchers().find_by_code(code).await? {
            None => ApiError::NotFound("Voucher not found".to_string()),
            Some(v) if v.status == VoucherStatus::Used => ApiError::AlreadyRedeemed {
                redeemed_at: v.redeemed_at,
            },
            Some(v) if v.current_owner_id != from_user_id => ApiError::Conflict(
                "Voucher ownership changed, please retry".to_string(),
            ),
            Some(v) if v.is_expired(Utc::now()) => ApiError::Expired {
                expiry_date: v.expiry_date,
            },
            Some(_) => ApiError::Conflict("Voucher state changed, please retry".to_string()),
        })
    }

    /// Validates and dedups a product scope: every id must exist.
    async fn checked_product_scope(&self, ids: Vec<String>) -> Result<Vec<String>, ApiError> {
        let unique: BTreeSet<String> = ids.into_iter().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = unique.into_iter().collect();
        let found = self.state.db.products().find_by_ids(&ids).await?;
        if found.len() != ids.len() {
            let known: BTreeSet<&str> = found.iter().map(|p| p.id.as_str()).collect();
            let missing: Vec<&str> = ids
                .iter()
                .map(String::as_str)
                .filter(|id| !known.contains(id))
                .collect();
            return Err(ApiError::InvalidArgument(format!(
                "Unknown product id(s): {}",
                missing.join(", ")
            )));
        }

        Ok(ids)
    }

    async fn username_of(
        &self,
        cache: &mut HashMap<String, String>,
        user_id: &str,
    ) -> Result<String, ApiError> {
        if let Some(name) = cache.get(user_id) {
            return Ok(name.clone());
        }
        let name = self
            .state
            .db
            .users()
            .find_by_id(user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| user_id.to_string());
        cache.insert(user_id.to_string(), name.clone());
        Ok(name)
    }

    async fn view(&self, voucher: &Voucher) -> Result<VoucherView, ApiError> {
        let mut names = HashMap::new();
        self.view_cached(voucher, &mut names).await
    }

    async fn view_cached(
        &self,
        voucher: &Voucher,
        names: &mut HashMap<String, String>,
    ) -> Result<VoucherView, ApiError> {
        let owner = self.username_of(names, &voucher.current_owner_id).await?;
        let original_owner = self.username_of(names, &voucher.original_owner_id).await?;
        let redeemed_by = match &voucher.redeemed_by {
            Some(id) => Some(self.username_of(names, id).await?),
            None => None,
        };

        Ok(VoucherView {
            code: voucher.code.clone(),
            value: voucher.rate().percentage(),
            status: voucher.status,
            owner,
            original_owner,
            description: voucher.description.clone(),
            is_shared: voucher.is_shared,
            can_be_shared: voucher.can_be_shared,
            times_shared: None,
            applicable_products: voucher.applicable_products.clone(),
            min_purchase_cents: voucher.min_purchase_cents,
            max_discount_cents: voucher.max_discount_cents,
            expiry_date: format_ist(voucher.expiry_date),
            redeemed_at: voucher.redeemed_at.map(format_ist),
            redeemed_by,
            created_at: format_ist(voucher.created_at),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
