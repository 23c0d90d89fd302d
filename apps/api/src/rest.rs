//! REST surface: routing and axum handlers.
//!
//! Handlers are deliberately thin. Each one extracts the caller identity,
//! enforces the endpoint's role, delegates to a service and wraps the
//! result in the `{"message": ...}` envelope clients expect.
//!
//! ## Route Map
//! ```text
//! /api/health                              GET   liveness probe
//! /api/auth/register                       POST  open
//! /api/auth/login                          POST  open
//! /api/auth/refresh                        POST  open (refresh token in body)
//! /api/auth/logout                         POST  any authenticated user
//! /api/products                            GET public | POST admin
//! /api/products/:id                        GET public | PUT/DELETE admin
//! /api/vouchers/admin/generate             POST  admin
//! /api/vouchers/admin/all?status&userId    GET   admin
//! /api/vouchers/my-vouchers?status         GET   customer
//! /api/vouchers/share-voucher              POST  customer
//! /api/vouchers/sharing-history/:code      GET   participants + admin
//! /api/vouchers/merchant/validate          POST  merchant
//! /api/vouchers/merchant/validate-with-cart POST merchant
//! /api/vouchers/merchant/redeem            POST  merchant
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use bazario_core::VoucherStatus;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::services::auth_service::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::services::product_service::{CreateProductRequest, UpdateProductRequest};
use crate::services::voucher_service::{
    CreateVoucherRequest, RedeemRequest, ShareVoucherRequest, ValidateRequest,
    ValidateWithCartRequest,
};
use crate::services::{AuthService, ProductService, VoucherService};
use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout));

    let product_routes = Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        );

    let voucher_routes = Router::new()
        .route("/admin/generate", post(generate_voucher))
        .route("/admin/all", get(list_all_vouchers))
        .route("/my-vouchers", get(my_vouchers))
        .route("/share-voucher", post(share_voucher))
        .route("/sharing-history/:code", get(sharing_history))
        .route("/merchant/validate", post(validate_voucher))
        .route("/merchant/validate-with-cart", post(validate_with_cart))
        .route("/merchant/redeem", post(redeem_voucher));

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/products", product_routes)
        .nest("/api/vouchers", voucher_routes)
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({"message": "ok"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"message": "database unavailable"})),
        )
    }
}

// =============================================================================
// Auth Handlers
// =============================================================================

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = AuthService::new(&state).register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Account created", "user": user})),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = AuthService::new(&state).login(req).await?;
    Ok(Json(json!({"message": "Login successful", "auth": tokens})))
}

async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = AuthService::new(&state).refresh(req).await?;
    Ok(Json(json!({"message": "Token refreshed", "auth": tokens})))
}

async fn logout(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ApiError> {
    AuthService::new(&state).logout(&ctx.user_id).await?;
    Ok(Json(json!({"message": "Logged out"})))
}

// =============================================================================
// Product Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct ProductListQuery {
    category: Option<String>,
    is_active: Option<bool>,
}

// Catalog reads are public so storefronts can browse without a session.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = ProductService::new(&state)
        .list(query.category.as_deref(), query.is_active)
        .await?;
    Ok(Json(
        json!({"message": "ok", "count": products.len(), "products": products}),
    ))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = ProductService::new(&state).get(&id).await?;
    Ok(Json(json!({"message": "ok", "product": product})))
}

async fn create_product(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;
    let product = ProductService::new(&state).create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Product created", "product": product})),
    ))
}

async fn update_product(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;
    let product = ProductService::new(&state).update(&id, req).await?;
    Ok(Json(json!({"message": "Product updated", "product": product})))
}

async fn delete_product(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;
    ProductService::new(&state).delete(&id).await?;
    Ok(Json(json!({"message": "Product deleted"})))
}

// =============================================================================
// Voucher Handlers
// =============================================================================

async fn generate_voucher(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<CreateVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;
    let voucher = VoucherService::new(&state).create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Voucher generated", "voucher": voucher})),
    ))
}

#[derive(Debug, Deserialize)]
struct VoucherListQuery {
    status: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<VoucherStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some("unused") => Ok(Some(VoucherStatus::Unused)),
        Some("used") => Ok(Some(VoucherStatus::Used)),
        Some(other) => Err(ApiError::InvalidArgument(format!(
            "Unknown status filter: {other}"
        ))),
    }
}

async fn list_all_vouchers(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<VoucherListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_admin()?;

    let status = parse_status_filter(query.status.as_deref())?;
    let vouchers = VoucherService::new(&state)
        .list_all(status, query.user_id.as_deref())
        .await?;
    Ok(Json(
        json!({"message": "ok", "count": vouchers.len(), "vouchers": vouchers}),
    ))
}

#[derive(Debug, Deserialize)]
struct MyVouchersQuery {
    status: Option<String>,
}

async fn my_vouchers(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<MyVouchersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_customer()?;
    let status = parse_status_filter(query.status.as_deref())?;
    let vouchers = VoucherService::new(&state)
        .my_vouchers(&ctx.user_id, status)
        .await?;
    Ok(Json(json!({"message": "ok", "vouchers": vouchers})))
}

async fn share_voucher(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<ShareVoucherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_customer()?;
    let voucher = VoucherService::new(&state).share(&ctx.user_id, req).await?;
    Ok(Json(json!({"message": "Voucher shared", "voucher": voucher})))
}

async fn sharing_history(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let history = VoucherService::new(&state).sharing_history(&ctx, &code).await?;
    Ok(Json(json!({"message": "ok", "sharing": history})))
}

async fn validate_voucher(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<ValidateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_merchant()?;
    let voucher = VoucherService::new(&state).validate(&req.code).await?;
    Ok(Json(json!({"message": "Voucher is valid", "voucher": voucher})))
}

async fn validate_with_cart(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<ValidateWithCartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_merchant()?;
    let (voucher, breakdown) = VoucherService::new(&state)
        .validate_with_cart(&req.code, &req.cart_items)
        .await?;
    Ok(Json(json!({
        "message": "Voucher is valid for this cart",
        "voucher": voucher,
        "discount": breakdown,
    })))
}

async fn redeem_voucher(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<RedeemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.require_merchant()?;
    let (voucher, breakdown) = VoucherService::new(&state)
        .redeem(&ctx.user_id, &req.code, req.cart_items.as_deref())
        .await?;
    Ok(Json(json!({
        "message": "Voucher redeemed",
        "voucher": voucher,
        "discount": breakdown,
    })))
}
