//! Product catalog service.
//!
//! Plain CRUD over the catalog. Mutations are admin-only (enforced in the
//! handlers); listing and lookup are public so storefronts, merchant
//! terminals and customer apps can render product names without a session.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use bazario_core::validation::{validate_price, validate_product_name};
use bazario_core::{Product, DEFAULT_PRODUCT_CATEGORY};
use bazario_db::DbError;

use crate::error::ApiError;
use crate::AppState;

/// Product catalog service.
pub struct ProductService {
    state: AppState,
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Partial update: absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// =============================================================================
// Implementation
// =============================================================================

impl ProductService {
    pub fn new(state: &AppState) -> Self {
        ProductService {
            state: state.clone(),
        }
    }

    pub async fn create(&self, req: CreateProductRequest) -> Result<Product, ApiError> {
        validate_product_name(&req.name)?;
        validate_price(req.price_cents)?;

        let stock = req.stock.unwrap_or(0);
        if stock < 0 {
            return Err(ApiError::InvalidArgument(
                "stock must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            description: req.description.unwrap_or_default(),
            price_cents: req.price_cents,
            category: req
                .category
                .unwrap_or_else(|| DEFAULT_PRODUCT_CATEGORY.to_string()),
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.state.db.products().insert(&product).await?;
        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> Result<Product, ApiError> {
        self.state
            .db
            .products()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))
    }

    pub async fn list(
        &self,
        category: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Vec<Product>, ApiError> {
        Ok(self.state.db.products().list(category, is_active).await?)
    }

    pub async fn update(&self, id: &str, req: UpdateProductRequest) -> Result<Product, ApiError> {
        let mut product = self.get(id).await?;

        if let Some(name) = req.name {
            validate_product_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            product.description = description;
        }
        if let Some(price_cents) = req.price_cents {
            validate_price(price_cents)?;
            product.price_cents = price_cents;
        }
        if let Some(category) = req.category {
            product.category = category;
        }
        if let Some(stock) = req.stock {
            if stock < 0 {
                return Err(ApiError::InvalidArgument(
                    "stock must not be negative".to_string(),
                ));
            }
            product.stock = stock;
        }
        if let Some(is_active) = req.is_active {
            product.is_active = is_active;
        }

        self.state.db.products().update(&product).await?;
        info!(id = %product.id, "Product updated");
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        match self.state.db.products().delete(id).await {
            Ok(()) => {
                info!(id, "Product deleted");
                Ok(())
            }
            // A voucher scope still references it
            Err(DbError::ForeignKeyViolation { .. }) => Err(ApiError::Conflict(
                "Product is referenced by a voucher and cannot be deleted".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
