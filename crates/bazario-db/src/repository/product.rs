//! # Product Repository
//!
//! Database operations for the product catalog. Vouchers reference products
//! through the `voucher_products` scope table; the catalog itself is plain
//! CRUD with soft-delete-aware listing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use bazario_core::Product;

use crate::error::{DbError, DbResult};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, category, stock, is_active, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, category, stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets the products matching a set of ids. Missing ids are simply
    /// absent from the result; the caller decides whether that is an error.
    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite has no array binds; build the placeholder list by hand.
        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Lists products, newest first, with optional category and
    /// active-state filters.
    pub async fn list(
        &self,
        category: Option<&str>,
        is_active: Option<bool>,
    ) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR is_active = ?2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(category)
        .bind(is_active)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product in place. `NotFound` when the id doesn't exist.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                category = ?5,
                stock = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product. `NotFound` when the id doesn't exist.
    ///
    /// Products referenced by a voucher scope are protected by the
    /// foreign key and surface as a `ForeignKeyViolation`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(name: &str, category: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            price_cents,
            category: category.to_string(),
            stock: 10,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("Masala Chai", "Beverages", 4500);
        repo.insert(&product).await.unwrap();

        let found = repo.find_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Masala Chai");
        assert_eq!(found.price_cents, 4500);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("A", "Beverages", 100)).await.unwrap();
        repo.insert(&sample_product("B", "Snacks", 200)).await.unwrap();
        let mut inactive = sample_product("C", "Snacks", 300);
        inactive.is_active = false;
        repo.insert(&inactive).await.unwrap();

        assert_eq!(repo.list(None, None).await.unwrap().len(), 3);
        assert_eq!(repo.list(Some("Snacks"), None).await.unwrap().len(), 2);
        assert_eq!(repo.list(Some("Snacks"), Some(true)).await.unwrap().len(), 1);
        assert_eq!(repo.list(None, Some(false)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let a = sample_product("A", "X", 100);
        let b = sample_product("B", "X", 200);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let found = repo
            .find_by_ids(&[a.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut product = sample_product("A", "X", 100);
        repo.insert(&product).await.unwrap();

        product.price_cents = 150;
        product.stock = 3;
        repo.update(&product).await.unwrap();

        let found = repo.find_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(found.price_cents, 150);
        assert_eq!(found.stock, 3);

        repo.delete(&product.id).await.unwrap();
        assert!(repo.find_by_id(&product.id).await.unwrap().is_none());

        let err = repo.delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
