//! Development seed binary.
//!
//! Creates one account per role plus a few catalog products so a fresh
//! database is immediately usable. Existing usernames are left untouched,
//! so the binary is safe to run repeatedly.
//!
//! ```text
//! DATABASE_PATH=./data/bazario.db cargo run --bin seed
//! ```

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use bazario_api::auth::hash_password;
use bazario_api::config::AppConfig;
use bazario_core::{Product, Role, User, DEFAULT_PRODUCT_CATEGORY};
use bazario_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    seed_user(&db, "admin", "admin123", Role::Admin, None, None).await?;
    seed_user(
        &db,
        "merchant",
        "merchant123",
        Role::Merchant,
        Some("Bazario Demo Store"),
        Some("MG Road, Bengaluru"),
    )
    .await?;
    seed_user(&db, "customer", "customer123", Role::Customer, None, None).await?;

    seed_product(&db, "Masala Chai", "Beverages", 4_500).await?;
    seed_product(&db, "Filter Coffee", "Beverages", 6_000).await?;
    seed_product(&db, "Samosa", "Snacks", 2_500).await?;
    seed_product(&db, "Notebook", DEFAULT_PRODUCT_CATEGORY, 9_900).await?;

    info!("Seeding complete");
    Ok(())
}

async fn seed_user(
    db: &Database,
    username: &str,
    password: &str,
    role: Role,
    store_name: Option<&str>,
    store_location: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if db.users().find_by_username(username).await?.is_some() {
        info!(username, "User already exists, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_hash: hash_password(password)?,
        role,
        store_name: store_name.map(str::to_string),
        store_location: store_location.map(str::to_string),
        is_active: true,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };
    db.users().insert(&user).await?;

    info!(username, role = role.as_str(), "User created");
    Ok(())
}

async fn seed_product(
    db: &Database,
    name: &str,
    category: &str,
    price_cents: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let existing = db.products().list(Some(category), None).await?;
    if existing.iter().any(|p| p.name == name) {
        info!(name, "Product already exists, skipping");
        return Ok(());
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: String::new(),
        price_cents,
        category: category.to_string(),
        stock: 25,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await?;

    info!(name, "Product created");
    Ok(())
}
