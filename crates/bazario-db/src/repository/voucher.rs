//! # Voucher Repository
//!
//! Database operations for the voucher lifecycle. This is the
//! correctness-critical repository: redemption and transfer are single
//! conditional UPDATE statements, so the database itself, not application
//! code, decides the winner when callers race.
//!
//! ## The Atomic Redemption Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE vouchers                                                        │
//! │  SET status = 'used', redeemed_at = ?, redeemed_by = ?                  │
//! │  WHERE code = ? AND status = 'unused' AND expiry_date > ?               │
//! │                                                                         │
//! │  rows_affected == 1  →  this caller won; fields were set atomically     │
//! │  rows_affected == 0  →  someone else won, or expired, or no such code   │
//! │                         (caller re-reads the row to diagnose which)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A read-check-write sequence would leave a window between the check and
//! the write; the conditional UPDATE closes it.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use bazario_core::{ShareEntry, Voucher, VoucherStatus};

use crate::error::DbResult;

/// Repository for voucher database operations.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

const VOUCHER_COLUMNS: &str = "id, code, current_owner_id, original_owner_id, value_bps, \
     status, expiry_date, redeemed_at, redeemed_by, description, \
     is_shared, can_be_shared, min_purchase_cents, max_discount_cents, \
     created_at, updated_at";

impl VoucherRepository {
    /// Creates a new VoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VoucherRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Inserts a voucher together with its product scope, in one transaction.
    ///
    /// A duplicate code surfaces as a unique violation; the caller retries
    /// with a fresh code.
    pub async fn insert(&self, voucher: &Voucher) -> DbResult<()> {
        debug!(code = %voucher.code, owner = %voucher.current_owner_id, "Inserting voucher");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vouchers (
                id, code, current_owner_id, original_owner_id, value_bps,
                status, expiry_date, redeemed_at, redeemed_by, description,
                is_shared, can_be_shared, min_purchase_cents, max_discount_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&voucher.id)
        .bind(&voucher.code)
        .bind(&voucher.current_owner_id)
        .bind(&voucher.original_owner_id)
        .bind(voucher.value_bps)
        .bind(voucher.status)
        .bind(voucher.expiry_date)
        .bind(voucher.redeemed_at)
        .bind(&voucher.redeemed_by)
        .bind(&voucher.description)
        .bind(voucher.is_shared)
        .bind(voucher.can_be_shared)
        .bind(voucher.min_purchase_cents)
        .bind(voucher.max_discount_cents)
        .bind(voucher.created_at)
        .bind(voucher.updated_at)
        .execute(&mut *tx)
        .await?;

        for product_id in &voucher.applicable_products {
            sqlx::query("INSERT INTO voucher_products (voucher_id, product_id) VALUES (?1, ?2)")
                .bind(&voucher.id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a voucher by its business code, product scope included.
    /// The caller is expected to have normalized the code already.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Voucher>> {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match voucher {
            Some(v) => Ok(Some(self.with_scope(v).await?)),
            None => Ok(None),
        }
    }

    /// Gets a voucher by ID, product scope included.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Voucher>> {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match voucher {
            Some(v) => Ok(Some(self.with_scope(v).await?)),
            None => Ok(None),
        }
    }

    /// Lists vouchers currently owned by a user, newest first, with an
    /// optional status filter.
    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        status: Option<VoucherStatus>,
    ) -> DbResult<Vec<Voucher>> {
        let vouchers = sqlx::query_as::<_, Voucher>(&format!(
            r#"
            SELECT {VOUCHER_COLUMNS} FROM vouchers
            WHERE current_owner_id = ?1
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        self.with_scopes(vouchers).await
    }

    /// Lists all vouchers in the system (admin view), newest first, with
    /// optional status and owner filters.
    pub async fn list_all(
        &self,
        status: Option<VoucherStatus>,
        owner_id: Option<&str>,
    ) -> DbResult<Vec<Voucher>> {
        let vouchers = sqlx::query_as::<_, Voucher>(&format!(
            r#"
            SELECT {VOUCHER_COLUMNS} FROM vouchers
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR current_owner_id = ?2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(status)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_scopes(vouchers).await
    }

    // =========================================================================
    // Atomic State Transitions
    // =========================================================================

    /// Attempts to redeem a voucher: flips `unused → used` and stamps the
    /// redemption fields, all in one conditional UPDATE.
    ///
    /// Returns the redeemed voucher when this caller won, `None` when the
    /// predicate didn't match (already used, expired, or unknown code;
    /// re-read the row to tell which).
    pub async fn redeem_atomic(
        &self,
        code: &str,
        merchant_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Voucher>> {
        let result = sqlx::query(
            r#"
            UPDATE vouchers
            SET status = 'used', redeemed_at = ?3, redeemed_by = ?2, updated_at = ?3
            WHERE code = ?1 AND status = 'unused' AND expiry_date > ?3
            "#,
        )
        .bind(code)
        .bind(merchant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(code, "Redemption predicate did not match");
            return Ok(None);
        }

        info!(code, merchant_id, "Voucher redeemed");
        self.find_by_code(code).await
    }

    /// Attempts to transfer a voucher from `from_user_id` to `to_user_id`.
    ///
    /// The ownership change is conditioned on the giver still being the
    /// current owner, so concurrent shares of the same voucher cannot both
    /// succeed. The history entry is appended in the same transaction.
    ///
    /// Returns `true` when the transfer happened, `false` when the
    /// predicate didn't match.
    pub async fn transfer_atomic(
        &self,
        code: &str,
        from_user_id: &str,
        to_user_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let voucher_id: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE vouchers
            SET current_owner_id = ?3, is_shared = 1, updated_at = ?4
            WHERE code = ?1
              AND current_owner_id = ?2
              AND status = 'unused'
              AND expiry_date > ?4
            RETURNING id
            "#,
        )
        .bind(code)
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(voucher_id) = voucher_id else {
            tx.rollback().await?;
            debug!(code, "Transfer predicate did not match");
            return Ok(false);
        };

        sqlx::query(
            r#"
            INSERT INTO voucher_shares (id, voucher_id, from_user_id, to_user_id, shared_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&voucher_id)
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(code, from_user_id, to_user_id, "Voucher transferred");
        Ok(true)
    }

    // =========================================================================
    // Sharing History
    // =========================================================================

    /// Returns a voucher's transfer log, oldest first.
    pub async fn shares_for(&self, voucher_id: &str) -> DbResult<Vec<ShareEntry>> {
        let shares = sqlx::query_as::<_, ShareEntry>(
            r#"
            SELECT id, voucher_id, from_user_id, to_user_id, shared_at
            FROM voucher_shares
            WHERE voucher_id = ?1
            ORDER BY shared_at ASC, id ASC
            "#,
        )
        .bind(voucher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shares)
    }

    /// Counts the entries in a voucher's transfer log.
    pub async fn count_shares(&self, voucher_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM voucher_shares WHERE voucher_id = ?1")
                .bind(voucher_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// True when the transfer log already records a `from → to` hop for
    /// this voucher. An owner cannot share the same voucher to the same
    /// recipient twice, even after receiving it back.
    pub async fn has_prior_share(
        &self,
        voucher_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM voucher_shares
            WHERE voucher_id = ?1 AND from_user_id = ?2 AND to_user_id = ?3
            "#,
        )
        .bind(voucher_id)
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// True when the user appears anywhere in the voucher's transfer log,
    /// as giver or recipient. Used by the history access rule.
    pub async fn is_share_participant(&self, voucher_id: &str, user_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM voucher_shares
            WHERE voucher_id = ?1 AND (from_user_id = ?2 OR to_user_id = ?2)
            "#,
        )
        .bind(voucher_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Fills in a decoded voucher's product scope from `voucher_products`.
    async fn with_scope(&self, mut voucher: Voucher) -> DbResult<Voucher> {
        voucher.applicable_products = sqlx::query_scalar(
            "SELECT product_id FROM voucher_products WHERE voucher_id = ?1 ORDER BY product_id",
        )
        .bind(&voucher.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(voucher)
    }

    async fn with_scopes(&self, vouchers: Vec<Voucher>) -> DbResult<Vec<Voucher>> {
        let mut out = Vec::with_capacity(vouchers.len());
        for voucher in vouchers {
            out.push(self.with_scope(voucher).await?);
        }
        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use bazario_core::{Product, Role, User};
    use chrono::Duration;

    async fn seed_user(db: &Database, username: &str, role: Role) -> String {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role,
            store_name: None,
            store_location: None,
            is_active: true,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&user).await.unwrap();
        user.id
    }

    async fn seed_product(db: &Database, name: &str) -> String {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            price_cents: 10_000,
            category: "General".to_string(),
            stock: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product.id
    }

    fn sample_voucher(code: &str, owner_id: &str, expiry: DateTime<Utc>) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            current_owner_id: owner_id.to_string(),
            original_owner_id: owner_id.to_string(),
            value_bps: 2000,
            status: VoucherStatus::Unused,
            expiry_date: expiry,
            redeemed_at: None,
            redeemed_by: None,
            description: "Test voucher".to_string(),
            is_shared: false,
            can_be_shared: true,
            applicable_products: vec![],
            min_purchase_cents: 0,
            max_discount_cents: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_with_scope() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_user(&db, "owner", Role::Customer).await;
        let p1 = seed_product(&db, "Tea").await;
        let p2 = seed_product(&db, "Coffee").await;

        let mut voucher = sample_voucher("AAA-BBB-CCC", &owner, Utc::now() + Duration::days(7));
        voucher.applicable_products = vec![p1.clone(), p2.clone()];
        db.vouchers().insert(&voucher).await.unwrap();

        let found = db.vouchers().find_by_code("AAA-BBB-CCC").await.unwrap().unwrap();
        assert_eq!(found.id, voucher.id);
        assert_eq!(found.value_bps, 2000);
        assert_eq!(found.applicable_products.len(), 2);
        assert!(found.applicable_products.contains(&p1));
        assert!(found.applicable_products.contains(&p2));

        assert!(db.vouchers().find_by_code("ZZZ-ZZZ-ZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_user(&db, "owner", Role::Customer).await;

        let expiry = Utc::now() + Duration::days(7);
        db.vouchers()
            .insert(&sample_voucher("DUP-DUP-DUP", &owner, expiry))
            .await
            .unwrap();
        let err = db
            .vouchers()
            .insert(&sample_voucher("DUP-DUP-DUP", &owner, expiry))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_redeem_atomic_happy_path() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_user(&db, "owner", Role::Customer).await;
        let merchant = seed_user(&db, "shop", Role::Merchant).await;

        let voucher = sample_voucher("RDM-AAA-BBB", &owner, Utc::now() + Duration::days(7));
        db.vouchers().insert(&voucher).await.unwrap();

        let now = Utc::now();
        let redeemed = db
            .vouchers()
            .redeem_atomic("RDM-AAA-BBB", &merchant, now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(redeemed.status, VoucherStatus::Used);
        assert_eq!(redeemed.redeemed_by.as_deref(), Some(merchant.as_str()));
        assert!(redeemed.redeemed_at.is_some());
        assert!(redeemed.redemption_state_consistent());

        // Second attempt finds nothing to update
        let again = db
            .vouchers()
            .redeem_atomic("RDM-AAA-BBB", &merchant, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_redeem_atomic_rejects_expired() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_user(&db, "owner", Role::Customer).await;
        let merchant = seed_user(&db, "shop", Role::Merchant).await;

        let voucher = sample_voucher("EXP-AAA-BBB", &owner, Utc::now() - Duration::days(1));
        db.vouchers().insert(&voucher).await.unwrap();

        let result = db
            .vouchers()
            .redeem_atomic("EXP-AAA-BBB", &merchant, Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());

        // Row is untouched
        let found = db.vouchers().find_by_code("EXP-AAA-BBB").await.unwrap().unwrap();
        assert_eq!(found.status, VoucherStatus::Unused);
        assert!(found.redeemed_at.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_redeem_exactly_one_winner() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_user(&db, "owner", Role::Customer).await;
        let merchant = seed_user(&db, "shop", Role::Merchant).await;

        let voucher = sample_voucher("RCE-AAA-BBB", &owner, Utc::now() + Duration::days(7));
        db.vouchers().insert(&voucher).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = db.vouchers();
            let merchant = merchant.clone();
            handles.push(tokio::spawn(async move {
                repo.redeem_atomic("RCE-AAA-BBB", &merchant, Utc::now()).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1, "exactly one concurrent redeemer must win");
    }

    #[tokio::test]
    async fn test_transfer_atomic_and_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let alice = seed_user(&db, "alice", Role::Customer).await;
        let bob = seed_user(&db, "bob", Role::Customer).await;
        let carol = seed_user(&db, "carol", Role::Customer).await;

        let voucher = sample_voucher("SHR-AAA-BBB", &alice, Utc::now() + Duration::days(7));
        db.vouchers().insert(&voucher).await.unwrap();

        // Alice → Bob succeeds
        let ok = db
            .vouchers()
            .transfer_atomic("SHR-AAA-BBB", &alice, &bob, Utc::now())
            .await
            .unwrap();
        assert!(ok);

        let found = db.vouchers().find_by_code("SHR-AAA-BBB").await.unwrap().unwrap();
        assert_eq!(found.current_owner_id, bob);
        assert_eq!(found.original_owner_id, alice);
        assert!(found.is_shared);

        // Alice is no longer the owner; a second give-away from her fails
        // and leaves no history entry behind
        let stale = db
            .vouchers()
            .transfer_atomic("SHR-AAA-BBB", &alice, &carol, Utc::now())
            .await
            .unwrap();
        assert!(!stale);
        assert_eq!(db.vouchers().count_shares(&voucher.id).await.unwrap(), 1);

        // Bob → Carol chains; history keeps both hops in order
        let ok = db
            .vouchers()
            .transfer_atomic("SHR-AAA-BBB", &bob, &carol, Utc::now())
            .await
            .unwrap();
        assert!(ok);

        let shares = db.vouchers().shares_for(&voucher.id).await.unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].from_user_id, alice);
        assert_eq!(shares[0].to_user_id, bob);
        assert_eq!(shares[1].from_user_id, bob);
        assert_eq!(shares[1].to_user_id, carol);

        assert!(db.vouchers().is_share_participant(&voucher.id, &alice).await.unwrap());
        assert!(db.vouchers().is_share_participant(&voucher.id, &bob).await.unwrap());
        let stranger = seed_user(&db, "dave", Role::Customer).await;
        assert!(!db.vouchers().is_share_participant(&voucher.id, &stranger).await.unwrap());
    }

    #[tokio::test]
    async fn test_transfer_rejects_used_voucher() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let alice = seed_user(&db, "alice", Role::Customer).await;
        let bob = seed_user(&db, "bob", Role::Customer).await;
        let merchant = seed_user(&db, "shop", Role::Merchant).await;

        let voucher = sample_voucher("USD-AAA-BBB", &alice, Utc::now() + Duration::days(7));
        db.vouchers().insert(&voucher).await.unwrap();

        db.vouchers()
            .redeem_atomic("USD-AAA-BBB", &merchant, Utc::now())
            .await
            .unwrap()
            .unwrap();

        let ok = db
            .vouchers()
            .transfer_atomic("USD-AAA-BBB", &alice, &bob, Utc::now())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_list_for_owner_and_list_all() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let alice = seed_user(&db, "alice", Role::Customer).await;
        let bob = seed_user(&db, "bob", Role::Customer).await;
        let merchant = seed_user(&db, "shop", Role::Merchant).await;

        let expiry = Utc::now() + Duration::days(7);
        db.vouchers().insert(&sample_voucher("LST-AAA-AAA", &alice, expiry)).await.unwrap();
        db.vouchers().insert(&sample_voucher("LST-AAA-BBB", &alice, expiry)).await.unwrap();
        db.vouchers().insert(&sample_voucher("LST-BBB-AAA", &bob, expiry)).await.unwrap();

        db.vouchers()
            .redeem_atomic("LST-AAA-BBB", &merchant, Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(db.vouchers().list_for_owner(&alice, None).await.unwrap().len(), 2);
        assert_eq!(
            db.vouchers()
                .list_for_owner(&alice, Some(VoucherStatus::Unused))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(db.vouchers().list_all(None, None).await.unwrap().len(), 3);
        assert_eq!(
            db.vouchers()
                .list_all(Some(VoucherStatus::Used), None)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(db.vouchers().list_all(None, Some(&bob)).await.unwrap().len(), 1);
    }
}
